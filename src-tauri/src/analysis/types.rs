//! Type definitions for content analysis results.
//!
//! Field names serialize in camelCase so the same JSON layout is used for
//! model output, frontend payloads, and share links.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One inspected dimension of the text (tone, burstiness, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisMetric {
    /// Name of the dimension
    pub metric: String,
    /// Explanation of what was observed
    pub finding: String,
    /// 0-100, higher means more AI-like
    pub score: u8,
}

/// Third-party detectors whose verdict is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "ZeroGPT")]
    ZeroGpt,
    #[serde(rename = "QuillBot")]
    QuillBot,
    #[serde(rename = "Copyleaks")]
    Copyleaks,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::ZeroGpt, Platform::QuillBot, Platform::Copyleaks];

    pub fn name(&self) -> &'static str {
        match self {
            Platform::ZeroGpt => "ZeroGPT",
            Platform::QuillBot => "QuillBot",
            Platform::Copyleaks => "Copyleaks",
        }
    }

    /// Case-insensitive lookup, tolerating the spacing models tend to add.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.name().to_lowercase() == normalized)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Estimate of how a named third-party detector would score the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalPlatformAnalysis {
    pub platform_name: Platform,
    pub predicted_score: u8,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    /// Overall likelihood (0-100) that the text is AI-generated
    pub ai_score: u8,
    pub summary: String,
    pub analysis: Vec<AnalysisMetric>,
    #[serde(default)]
    pub external_analysis: Vec<ExternalPlatformAnalysis>,
}

/// Scoring outcome for a single text snapshot. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub data: AnalysisData,
}

impl AnalysisResult {
    pub fn ai_score(&self) -> u8 {
        self.data.ai_score
    }
}
