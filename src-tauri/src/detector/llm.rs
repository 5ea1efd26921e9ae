//! Model-backed Scorer and Rewriter.

use async_trait::async_trait;
use tracing::{error, info};

use super::{Rewriter, Scorer};
use crate::analysis::prompts::{
    analysis_json_schema, build_analysis_prompt, build_rewrite_prompt, ANALYSIS_SYSTEM_PROMPT,
    REWRITE_SYSTEM_PROMPT,
};
use crate::analysis::{map_response_to_analysis, AnalysisResult};
use crate::error::DetectorError;
use crate::llm::{strip_markdown_json, LlmClient, LlmRequest};

/// Scores text by asking the configured model for structured JSON.
#[derive(Debug, Clone)]
pub struct LlmScorer {
    client: LlmClient,
    schema: serde_json::Value,
}

impl LlmScorer {
    pub fn new(client: LlmClient) -> Self {
        Self {
            client,
            schema: analysis_json_schema(),
        }
    }
}

#[async_trait]
impl Scorer for LlmScorer {
    async fn score(&self, text: &str) -> Result<AnalysisResult, DetectorError> {
        let prompt = build_analysis_prompt(text);
        let request = LlmRequest {
            system: ANALYSIS_SYSTEM_PROMPT,
            prompt: &prompt,
            schema: Some(&self.schema),
            schema_name: "content_analysis",
        };

        let reply = self
            .client
            .complete(&request)
            .await
            .map_err(DetectorError::Scoring)?;

        let result = parse_analysis_reply(&reply)?;
        info!(
            "Scored {} chars with {}: {}%",
            text.len(),
            self.client.settings().provider,
            result.ai_score()
        );
        Ok(result)
    }
}

/// Parse a model reply (possibly fenced) into an AnalysisResult.
pub fn parse_analysis_reply(reply: &str) -> Result<AnalysisResult, DetectorError> {
    let json_text = strip_markdown_json(reply);
    let json: serde_json::Value = serde_json::from_str(&json_text).map_err(|e| {
        error!("Analysis reply is not JSON: {}", e);
        DetectorError::Scoring(format!("Model returned invalid JSON: {}", e))
    })?;
    map_response_to_analysis(&json).map_err(|e| {
        error!("Analysis reply has the wrong shape: {}", e);
        DetectorError::Scoring(e)
    })
}

/// Rewrites text with the configured model.
#[derive(Debug, Clone)]
pub struct LlmRewriter {
    client: LlmClient,
}

impl LlmRewriter {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Rewriter for LlmRewriter {
    async fn rewrite(&self, text: &str, instruction: Option<&str>) -> Result<String, DetectorError> {
        let prompt = build_rewrite_prompt(text, instruction);
        let request = LlmRequest {
            system: REWRITE_SYSTEM_PROMPT,
            prompt: &prompt,
            schema: None,
            schema_name: "",
        };

        let reply = self
            .client
            .complete(&request)
            .await
            .map_err(DetectorError::Rewrite)?;

        let rewritten = clean_rewrite(&reply);
        if rewritten.is_empty() {
            error!("Rewrite came back empty");
            return Err(DetectorError::Rewrite("Model returned an empty rewrite".to_string()));
        }
        info!("Rewrote {} chars into {} chars", text.len(), rewritten.len());
        Ok(rewritten)
    }
}

/// Trim the reply and drop a code fence or one pair of wrapping quotes.
pub fn clean_rewrite(reply: &str) -> String {
    let unfenced = strip_markdown_json(reply);
    let unquoted = unfenced
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .filter(|inner| !inner.contains('"'))
        .unwrap_or(&unfenced);
    unquoted.trim().to_string()
}
