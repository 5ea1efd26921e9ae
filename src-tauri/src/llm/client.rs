//! HTTP calls to the supported chat-completion providers.
//!
//! Every provider takes the same `LlmRequest`. When the request carries a
//! JSON schema the provider is asked for JSON output in whatever way it
//! supports; without one the reply is plain text.

use std::time::Duration;

use serde_json::Value;
use tracing::{error, info};

use super::settings::LlmSettings;

/// Timeout applied to every model call.
pub const API_TIMEOUT_SECS: u64 = 60;

const MAX_TOKENS: u32 = 4096;
const ERROR_BODY_LIMIT: usize = 1024;

/// One prompt to send to a provider.
#[derive(Debug, Clone)]
pub struct LlmRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    /// Request structured JSON output matching this schema.
    pub schema: Option<&'a Value>,
    /// Name reported with the schema (OpenAI requires one).
    pub schema_name: &'a str,
}

/// Provider-agnostic model client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl LlmClient {
    pub fn new(settings: LlmSettings) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    /// Send the request to the configured provider and return the reply text.
    pub async fn complete(&self, request: &LlmRequest<'_>) -> Result<String, String> {
        let provider = self.settings.provider.as_str();
        info!(
            "Calling provider '{}' model '{}' (json: {})",
            provider,
            self.settings.model,
            request.schema.is_some()
        );

        match provider {
            "claude" => self.call_claude(request).await,
            "openai" => {
                self.call_openai_compatible("https://api.openai.com/v1/chat/completions", "openai", request)
                    .await
            }
            "kimi" => {
                self.call_openai_compatible("https://api.moonshot.cn/v1/chat/completions", "kimi", request)
                    .await
            }
            "openrouter" => {
                self.call_openai_compatible(
                    "https://openrouter.ai/api/v1/chat/completions",
                    "openrouter",
                    request,
                )
                .await
            }
            "gemini" => self.call_gemini(request).await,
            _ => {
                let msg = format!(
                    "Unsupported AI provider: '{}'. Supported: gemini, claude, openai, openrouter, kimi",
                    provider
                );
                error!("{}", msg);
                Err(msg)
            }
        }
    }

    /// Anthropic Messages API. JSON output is requested through the prompt.
    async fn call_claude(&self, request: &LlmRequest<'_>) -> Result<String, String> {
        let body = claude_body(&self.settings.model, request);

        let response = self
            .http
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(e, "claude"))?;

        let body_text = handle_api_response(response, "claude").await?;
        let resp_json = parse_wrapper(&body_text, "Claude")?;
        extract_claude_text(&resp_json).ok_or_else(|| {
            let msg = "No text content in Claude API response".to_string();
            error!("{}", msg);
            msg
        })
    }

    /// OpenAI chat completions and the providers that mirror its format.
    async fn call_openai_compatible(
        &self,
        endpoint: &str,
        provider: &str,
        request: &LlmRequest<'_>,
    ) -> Result<String, String> {
        let body = openai_body(&self.settings.model, provider, request);

        let response = self
            .http
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", self.settings.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(e, provider))?;

        let body_text = handle_api_response(response, provider).await?;
        let resp_json = parse_wrapper(&body_text, provider)?;
        extract_openai_text(&resp_json).ok_or_else(|| {
            let msg = format!("No content in {} API response", provider);
            error!("{}", msg);
            msg
        })
    }

    /// Google Generative Language API.
    async fn call_gemini(&self, request: &LlmRequest<'_>) -> Result<String, String> {
        let body = gemini_body(request);
        let endpoint = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.settings.model
        );

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", &self.settings.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(e, "gemini"))?;

        let body_text = handle_api_response(response, "gemini").await?;
        let resp_json = parse_wrapper(&body_text, "Gemini")?;
        extract_gemini_text(&resp_json).ok_or_else(|| {
            let msg = "No text content in Gemini API response".to_string();
            error!("{}", msg);
            msg
        })
    }
}

fn claude_body(model: &str, request: &LlmRequest<'_>) -> Value {
    serde_json::json!({
        "model": model,
        "max_tokens": MAX_TOKENS,
        "system": request.system,
        "messages": [
            {"role": "user", "content": request.prompt}
        ]
    })
}

fn openai_body(model: &str, provider: &str, request: &LlmRequest<'_>) -> Value {
    let mut body = serde_json::json!({
        "model": model,
        "max_tokens": MAX_TOKENS,
        "messages": [
            {"role": "system", "content": request.system},
            {"role": "user", "content": request.prompt}
        ]
    });

    if let Some(schema) = request.schema {
        // Only OpenAI honours strict schemas; the others get plain JSON mode.
        body["response_format"] = if provider == "openai" {
            serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "strict": true,
                    "schema": schema
                }
            })
        } else {
            serde_json::json!({ "type": "json_object" })
        };
    }
    body
}

fn gemini_body(request: &LlmRequest<'_>) -> Value {
    let mut body = serde_json::json!({
        "systemInstruction": {
            "parts": [{"text": request.system}]
        },
        "contents": [
            {"role": "user", "parts": [{"text": request.prompt}]}
        ]
    });

    if request.schema.is_some() {
        body["generationConfig"] = serde_json::json!({
            "responseMimeType": "application/json"
        });
    }
    body
}

/// `{ "content": [{"type": "text", "text": "..."}] }`
fn extract_claude_text(json: &Value) -> Option<String> {
    json["content"][0]["text"].as_str().map(|s| s.to_string())
}

/// `{ "choices": [{"message": {"content": "..."}}] }`
fn extract_openai_text(json: &Value) -> Option<String> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
}

/// `{ "candidates": [{"content": {"parts": [{"text": "..."}, ...]}}] }`
fn extract_gemini_text(json: &Value) -> Option<String> {
    let parts = json["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn request_error(e: reqwest::Error, provider: &str) -> String {
    let msg = if e.is_timeout() {
        format!("LLM API timeout after {}s for provider '{}'", API_TIMEOUT_SECS, provider)
    } else {
        format!("LLM API request failed for {}: {}", provider, e)
    };
    error!("{}", msg);
    msg
}

fn parse_wrapper(body_text: &str, provider: &str) -> Result<Value, String> {
    serde_json::from_str(body_text).map_err(|e| {
        let msg = format!("Failed to parse {} API response wrapper: {}", provider, e);
        error!("{}", msg);
        msg
    })
}

/// Handle API response: check status and extract body text.
async fn handle_api_response(response: reqwest::Response, provider: &str) -> Result<String, String> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());
        let msg = format!(
            "LLM API error: {} from {} - {}",
            status,
            provider,
            truncate(&body, ERROR_BODY_LIMIT)
        );
        error!("{}", msg);
        return Err(msg);
    }
    response
        .text()
        .await
        .map_err(|e| format!("Failed to read API response body from {}: {}", provider, e))
}

/// Truncate on a char boundary, marking the cut with `...`.
pub(crate) fn truncate(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Strip a markdown code fence (with optional language tag) around a reply.
pub fn strip_markdown_json(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        let after_open = match trimmed.find('\n') {
            Some(pos) => &trimmed[pos + 1..],
            None => trimmed.trim_start_matches('`'),
        };
        let cleaned = after_open.trim_end();
        match cleaned.strip_suffix("```") {
            Some(inner) => inner.trim().to_string(),
            None => cleaned.to_string(),
        }
    } else {
        trimmed.to_string()
    }
}
