//! Content analysis data, model prompts, and share links.

pub mod prompts;
pub mod share;
pub mod types;
pub mod validation;

pub use share::{build_share_link, parse_share_link};
pub use types::*;
pub use validation::map_response_to_analysis;
