pub mod config;
pub mod health;
pub mod keychain;
pub mod models;
pub mod session;
