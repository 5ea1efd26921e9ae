//! Scripted collaborators for tests and offline runs.
//! Responses are consumed in FIFO order and every call is recorded.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{Rewriter, Scorer};
use crate::analysis::{AnalysisData, AnalysisResult};
use crate::error::DetectorError;

/// Lock, ignoring poisoning.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Minimal result carrying only a score and a summary.
pub fn result_with_score(score: u8) -> AnalysisResult {
    AnalysisResult {
        data: AnalysisData {
            ai_score: score,
            summary: format!("Scored {}%", score),
            analysis: Vec::new(),
            external_analysis: Vec::new(),
        },
    }
}

/// Scorer returning queued scores (or failures).
#[derive(Default)]
pub struct ScriptedScorer {
    responses: Mutex<Vec<Result<u8, String>>>,
    /// Texts passed to `score`, in call order.
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scores(scores: impl IntoIterator<Item = u8>) -> Self {
        let scorer = Self::new();
        for score in scores {
            scorer.enqueue_score(score);
        }
        scorer
    }

    pub fn enqueue_score(&self, score: u8) {
        lock(&self.responses).push(Ok(score));
    }

    pub fn enqueue_failure(&self, message: &str) {
        lock(&self.responses).push(Err(message.to_string()));
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl Scorer for ScriptedScorer {
    async fn score(&self, text: &str) -> Result<AnalysisResult, DetectorError> {
        lock(&self.calls).push(text.to_string());
        let mut responses = lock(&self.responses);
        if responses.is_empty() {
            return Err(DetectorError::Scoring("mock: no score configured".to_string()));
        }
        responses
            .remove(0)
            .map(result_with_score)
            .map_err(DetectorError::Scoring)
    }
}

/// Rewriter returning queued texts (or failures).
/// With an empty queue it appends the call number to the input.
#[derive(Default)]
pub struct ScriptedRewriter {
    responses: Mutex<Vec<Result<String, String>>>,
    /// `(text, instruction)` pairs passed to `rewrite`, in call order.
    pub calls: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rewriter = Self::new();
        for text in texts {
            rewriter.enqueue_text(text);
        }
        rewriter
    }

    pub fn enqueue_text(&self, text: impl Into<String>) {
        lock(&self.responses).push(Ok(text.into()));
    }

    pub fn enqueue_failure(&self, message: &str) {
        lock(&self.responses).push(Err(message.to_string()));
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl Rewriter for ScriptedRewriter {
    async fn rewrite(&self, text: &str, instruction: Option<&str>) -> Result<String, DetectorError> {
        let call_number = {
            let mut calls = lock(&self.calls);
            calls.push((text.to_string(), instruction.map(String::from)));
            calls.len()
        };
        let mut responses = lock(&self.responses);
        if responses.is_empty() {
            return Ok(format!("{} (rewrite {})", text, call_number));
        }
        responses.remove(0).map_err(DetectorError::Rewrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_poisoned_lock_still_records_calls() {
        let scorer = Arc::new(ScriptedScorer::with_scores([12]));
        let poisoner = Arc::clone(&scorer);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.calls.lock().unwrap();
            panic!("poison the call log");
        })
        .join();

        assert!(scorer.calls.is_poisoned());
        assert_eq!(scorer.score("text").await.unwrap().ai_score(), 12);
        assert_eq!(scorer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_queues() {
        assert!(matches!(
            ScriptedScorer::new().score("x").await,
            Err(DetectorError::Scoring(_))
        ));
        let rewriter = ScriptedRewriter::new();
        assert_eq!(rewriter.rewrite("x", None).await.unwrap(), "x (rewrite 1)");
    }
}
