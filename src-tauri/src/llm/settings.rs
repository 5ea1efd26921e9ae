//! Provider identifiers, default models, and keychain service names.

use serde::Serialize;

use crate::error::DetectorError;

/// Keychain account shared by all provider keys.
pub const KEYCHAIN_ACCOUNT: &str = "ai-detector";

/// Providers the detector can talk to, in settings-page order.
pub const PROVIDERS: [&str; 5] = ["gemini", "claude", "openai", "openrouter", "kimi"];

pub const DEFAULT_PROVIDER: &str = "gemini";

/// Resolved settings for one model call.
#[derive(Clone, Serialize)]
pub struct LlmSettings {
    pub provider: String,
    pub model: String,
    #[serde(skip)]
    pub api_key: String,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Default model used when the user has not picked one.
pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "gemini" => "gemini-2.5-flash",
        "claude" => "claude-sonnet-4-20250514",
        "openai" => "gpt-4o",
        "kimi" => "moonshot-v1-128k",
        "openrouter" => "google/gemini-2.5-flash",
        _ => "gemini-2.5-flash",
    }
}

/// Keychain service id holding the API key for a provider.
pub fn keychain_service(provider: &str) -> Result<String, DetectorError> {
    if PROVIDERS.contains(&provider) {
        Ok(format!("ai-detector-{}-api", provider))
    } else {
        Err(DetectorError::Config(format!(
            "Unknown AI provider: '{}'. Supported: {}",
            provider,
            PROVIDERS.join(", ")
        )))
    }
}
