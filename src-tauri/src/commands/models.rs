use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::keychain::read_api_key;
use crate::llm::client::truncate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

/// `{"data": [...]}` listing used by Claude, OpenAI, Kimi and OpenRouter.
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

/// `{"models": [...]}` listing returned by Gemini.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModelsResponse {
    #[serde(default)]
    models: Vec<GeminiModelEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModelEntry {
    /// `models/gemini-2.5-flash`
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

fn get_key_for_provider(provider: &str) -> Result<String, String> {
    read_api_key(provider)?
        .ok_or_else(|| format!("No API key configured for {}. Set it above first.", provider))
}

#[tauri::command]
pub async fn list_models(provider: String) -> Result<Vec<ModelInfo>, String> {
    info!("Fetching models for provider: {}", provider);
    let api_key = get_key_for_provider(&provider)?;
    let client = reqwest::Client::new();

    let request = match provider.as_str() {
        "claude" => client
            .get("https://api.anthropic.com/v1/models")
            .header("x-api-key", &api_key)
            .header("anthropic-version", "2023-06-01"),
        "openai" => client
            .get("https://api.openai.com/v1/models")
            .header("Authorization", format!("Bearer {}", api_key)),
        "kimi" => client
            .get("https://api.moonshot.cn/v1/models")
            .header("Authorization", format!("Bearer {}", api_key)),
        "openrouter" => client
            .get("https://openrouter.ai/api/v1/models")
            .header("Authorization", format!("Bearer {}", api_key)),
        "gemini" => client
            .get("https://generativelanguage.googleapis.com/v1beta/models")
            .header("x-goog-api-key", &api_key),
        _ => return Err(format!("Unknown provider: {}", provider)),
    };

    let resp = request
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        warn!(
            "Models API error for {} ({}): {}",
            provider,
            status,
            truncate(&body, 1024)
        );
        return Err(format!("API error ({})", status));
    }

    let body = resp
        .text()
        .await
        .map_err(|e| format!("Failed to read response: {}", e))?;

    let mut result = if provider == "gemini" {
        parse_gemini_models(&body)?
    } else {
        parse_models(&body)?
    };

    result.sort_by(|a, b| a.id.cmp(&b.id));
    info!("Found {} models for {}", result.len(), provider);
    Ok(result)
}

fn parse_models(body: &str) -> Result<Vec<ModelInfo>, String> {
    let models: ModelsResponse =
        serde_json::from_str(body).map_err(|e| format!("Failed to parse response: {}", e))?;

    Ok(models
        .data
        .into_iter()
        .map(|m| {
            let name = m.display_name.or(m.name).unwrap_or_else(|| m.id.clone());
            ModelInfo { id: m.id, name }
        })
        .collect())
}

/// Keep only models that can generate content; strip the `models/` prefix.
fn parse_gemini_models(body: &str) -> Result<Vec<ModelInfo>, String> {
    let models: GeminiModelsResponse =
        serde_json::from_str(body).map_err(|e| format!("Failed to parse response: {}", e))?;

    Ok(models
        .models
        .into_iter()
        .filter(|m| {
            m.supported_generation_methods
                .iter()
                .any(|method| method == "generateContent")
        })
        .map(|m| {
            let id = m.name.trim_start_matches("models/").to_string();
            let name = m.display_name.unwrap_or_else(|| id.clone());
            ModelInfo { id, name }
        })
        .collect())
}
