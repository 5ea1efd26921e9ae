//! Scoring and rewriting collaborators.
//!
//! The rephrase loop and the session controller only see these two traits.
//! `llm` holds the model-backed implementations, `mock` holds scripted ones.

pub mod llm;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

use async_trait::async_trait;

use crate::analysis::AnalysisResult;
use crate::error::DetectorError;

pub use llm::{LlmRewriter, LlmScorer};

/// Produces an AnalysisResult for a piece of text.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Fails with `DetectorError::Scoring`.
    async fn score(&self, text: &str) -> Result<AnalysisResult, DetectorError>;
}

/// Produces a rewritten version of a piece of text.
#[async_trait]
pub trait Rewriter: Send + Sync {
    /// `None` asks for a general rewrite that reduces AI patterns.
    /// Fails with `DetectorError::Rewrite`.
    async fn rewrite(&self, text: &str, instruction: Option<&str>) -> Result<String, DetectorError>;
}
