pub mod client;
pub mod settings;

pub use client::{strip_markdown_json, LlmClient, LlmRequest};
pub use settings::{default_model, keychain_service, LlmSettings, DEFAULT_PROVIDER, PROVIDERS};
