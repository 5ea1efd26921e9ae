//! Owns the detector's working state and wires user actions to the
//! collaborators, the rephrase loop, and the history store.
//!
//! Collaborators are passed per call so the same controller runs against
//! model-backed or scripted implementations.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info};

use crate::analysis::{build_share_link, AnalysisResult};
use crate::config::RephraseSettings;
use crate::detector::{Rewriter, Scorer};
use crate::error::DetectorError;
use crate::history::AnalysisHistory;
use crate::rephrase::{
    rephrase_with_instruction, RephraseGuard, RephraseOptimizer, RephraseOutcome, RephraseStatus,
    RephraseToken,
};

/// A rewritten candidate waiting for the user to accept or discard it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRephrase {
    pub original: String,
    pub rephrased: String,
    /// Score of `original`, when known.
    pub original_score: Option<u8>,
    /// Score of `rephrased`; only the auto-rephrase loop measures it.
    pub rephrased_score: Option<u8>,
}

/// Everything the front end needs to render the detector page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub content: String,
    pub word_count: usize,
    pub result: Option<AnalysisResult>,
    pub pending_rephrase: Option<PendingRephrase>,
    pub last_error: Option<String>,
    pub rephrasing: bool,
}

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub struct SessionController {
    content: String,
    /// Always describes `content` when present.
    result: Option<AnalysisResult>,
    pending: Option<PendingRephrase>,
    last_error: Option<String>,
    history: AnalysisHistory,
    guard: RephraseGuard,
    optimizer: RephraseOptimizer,
}

impl SessionController {
    pub fn new(history: AnalysisHistory, settings: RephraseSettings, guard: RephraseGuard) -> Self {
        Self {
            content: String::new(),
            result: None,
            pending: None,
            last_error: None,
            history,
            guard,
            optimizer: RephraseOptimizer::new(settings),
        }
    }

    /// Flag shared with callers that must reject a second run without
    /// waiting for this controller.
    pub fn guard(&self) -> &RephraseGuard {
        &self.guard
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn pending_rephrase(&self) -> Option<&PendingRephrase> {
        self.pending.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn history(&self) -> &[String] {
        self.history.entries()
    }

    /// Score `text` directly. On success the result replaces the previous
    /// one and the text is recorded in history.
    pub async fn analyze<S>(&mut self, scorer: &S, text: &str) -> Result<&AnalysisResult, DetectorError>
    where
        S: Scorer + ?Sized,
    {
        self.last_error = None;
        if text.trim().is_empty() {
            return Err(self.fail(DetectorError::Validation(
                "Please enter some text to analyze.".to_string(),
            )));
        }

        self.set_content(text);
        match scorer.score(text).await {
            Ok(result) => {
                info!("Analysis complete: {}% AI ({} words)", result.ai_score(), word_count(text));
                self.history.record(text);
                Ok(self.result.insert(result))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Run the auto-rephrase loop over `text`. An improved version becomes
    /// the pending rephrase; the current text is left untouched.
    ///
    /// The token proves the caller holds this controller's guard.
    pub async fn auto_rephrase<S, R>(
        &mut self,
        _token: RephraseToken,
        scorer: &S,
        rewriter: &R,
        text: &str,
        status: &UnboundedSender<RephraseStatus>,
    ) -> Result<RephraseOutcome, DetectorError>
    where
        S: Scorer + ?Sized,
        R: Rewriter + ?Sized,
    {
        self.last_error = None;
        self.pending = None;

        self.set_content(text);
        // Unanalyzed text is scored here; the result is kept even if the loop fails
        let known = match self.result.clone() {
            Some(result) => result,
            None => match self.optimizer.initial_analysis(scorer, text, status).await {
                Ok(result) => self.result.insert(result).clone(),
                Err(e) => return Err(self.fail(e)),
            },
        };

        let outcome = match self
            .optimizer
            .run(scorer, rewriter, text, Some(&known), status)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(e)),
        };

        if outcome.improved {
            self.pending = Some(PendingRephrase {
                original: text.to_string(),
                rephrased: outcome.final_text.clone(),
                original_score: Some(outcome.initial_score),
                rephrased_score: Some(outcome.best_score),
            });
        }
        Ok(outcome)
    }

    /// Produce one rewrite following the user's instruction and hold it as
    /// the pending rephrase.
    pub async fn rephrase_with_instruction<R>(
        &mut self,
        _token: RephraseToken,
        rewriter: &R,
        text: &str,
        instruction: &str,
        status: &UnboundedSender<RephraseStatus>,
    ) -> Result<&PendingRephrase, DetectorError>
    where
        R: Rewriter + ?Sized,
    {
        self.last_error = None;
        self.pending = None;

        let original_score = if self.content == text {
            self.result.as_ref().map(AnalysisResult::ai_score)
        } else {
            None
        };
        self.set_content(text);

        match rephrase_with_instruction(rewriter, text, instruction, status).await {
            Ok(rephrased) => Ok(self.pending.insert(PendingRephrase {
                original: text.to_string(),
                rephrased,
                original_score,
                rephrased_score: None,
            })),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Replace the current text with the pending rephrase and score it.
    pub async fn accept_rephrase<S>(&mut self, scorer: &S) -> Result<&AnalysisResult, DetectorError>
    where
        S: Scorer + ?Sized,
    {
        let Some(pending) = self.pending.take() else {
            return Err(self.fail(DetectorError::Validation(
                "There is no rephrased version to accept.".to_string(),
            )));
        };
        info!("Accepted rephrased version ({} words)", word_count(&pending.rephrased));
        self.analyze(scorer, &pending.rephrased).await
    }

    pub fn discard_rephrase(&mut self) {
        if self.pending.take().is_some() {
            info!("Discarded rephrased version");
        }
    }

    /// Load a history entry into the editor without scoring it.
    pub fn select_history_item(&mut self, text: &str) {
        self.set_content(text);
        self.pending = None;
        self.last_error = None;
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Surface an error raised outside the controller (e.g. settings lookup).
    pub fn record_error(&mut self, err: &DetectorError) {
        self.last_error = Some(err.to_string());
    }

    /// Share link for the current result.
    pub fn create_share_link(&self, base_url: &str) -> Result<String, DetectorError> {
        let result = self.result.as_ref().ok_or_else(|| {
            DetectorError::Validation("Analyze some text before sharing.".to_string())
        })?;
        build_share_link(base_url, result)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            content: self.content.clone(),
            word_count: word_count(&self.content),
            result: self.result.clone(),
            pending_rephrase: self.pending.clone(),
            last_error: self.last_error.clone(),
            rephrasing: self.guard.is_active(),
        }
    }

    fn set_content(&mut self, text: &str) {
        if self.content != text {
            self.content = text.to_string();
            self.result = None;
        }
    }

    fn fail(&mut self, err: DetectorError) -> DetectorError {
        error!("{}", err);
        self.last_error = Some(err.to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HistorySettings;
    use crate::detector::mock::{ScriptedRewriter, ScriptedScorer};
    use crate::history::MemorySlot;
    use tokio::sync::mpsc;

    fn controller() -> SessionController {
        controller_with_attempts(5)
    }

    fn controller_with_attempts(max_attempts: u32) -> SessionController {
        let settings = HistorySettings {
            limit: 10,
            key: "analysisHistory".to_string(),
        };
        let history = AnalysisHistory::open(Box::new(MemorySlot::new()), &settings);
        SessionController::new(
            history,
            RephraseSettings::without_pacing(max_attempts),
            RephraseGuard::new(),
        )
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  Hello   brave\nnew world  "), 4);
        assert_eq!(word_count("   "), 0);
    }

    #[tokio::test]
    async fn test_analyze_records_history() {
        let mut session = controller();
        let scorer = ScriptedScorer::with_scores([65]);

        let result = session.analyze(&scorer, "Some text.").await.unwrap();
        assert_eq!(result.ai_score(), 65);
        assert_eq!(session.history(), ["Some text."]);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.content, "Some text.");
        assert_eq!(snapshot.word_count, 2);
        assert!(!snapshot.rephrasing);
    }

    #[tokio::test]
    async fn test_empty_input_sets_error_without_calls() {
        let mut session = controller();
        let scorer = ScriptedScorer::new();

        let err = session.analyze(&scorer, "  ").await.unwrap_err();
        assert!(matches!(err, DetectorError::Validation(_)));
        assert_eq!(scorer.call_count(), 0);
        assert_eq!(session.last_error(), Some("Please enter some text to analyze."));

        session.clear_error();
        assert_eq!(session.last_error(), None);
    }

    #[tokio::test]
    async fn test_failed_analysis_is_not_recorded() {
        let mut session = controller();
        let scorer = ScriptedScorer::new();
        scorer.enqueue_failure("network down");

        assert!(session.analyze(&scorer, "Some text.").await.is_err());
        assert!(session.history().is_empty());
        assert!(session.result().is_none());
        assert_eq!(session.last_error(), Some("Scoring failed: network down"));
    }

    #[tokio::test]
    async fn test_auto_rephrase_reuses_current_result() {
        let mut session = controller_with_attempts(1);
        let scorer = ScriptedScorer::with_scores([65, 30]);
        let rewriter = ScriptedRewriter::with_texts(["better"]);
        session.analyze(&scorer, "original").await.unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let token = session.guard().try_acquire().unwrap();
        let outcome = session
            .auto_rephrase(token, &scorer, &rewriter, "original", &tx)
            .await
            .unwrap();

        assert!(outcome.improved);
        // one call for the analysis, one for the rewrite; no re-scoring of the input
        assert_eq!(scorer.call_count(), 2);
        assert!(!session.guard().is_active());
        assert_eq!(session.content(), "original");

        let pending = session.pending_rephrase().unwrap();
        assert_eq!(pending.rephrased, "better");
        assert_eq!(pending.original_score, Some(65));
        assert_eq!(pending.rephrased_score, Some(30));
    }

    #[tokio::test]
    async fn test_accept_rephrase_swaps_and_rescores() {
        let mut session = controller_with_attempts(1);
        let scorer = ScriptedScorer::with_scores([65, 30, 28]);
        let rewriter = ScriptedRewriter::with_texts(["better"]);
        session.analyze(&scorer, "original").await.unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let token = session.guard().try_acquire().unwrap();
        session
            .auto_rephrase(token, &scorer, &rewriter, "original", &tx)
            .await
            .unwrap();

        let result = session.accept_rephrase(&scorer).await.unwrap();
        assert_eq!(result.ai_score(), 28);
        assert_eq!(session.content(), "better");
        assert!(session.pending_rephrase().is_none());
        assert_eq!(session.history(), ["better", "original"]);
    }

    #[tokio::test]
    async fn test_accept_without_pending_fails() {
        let mut session = controller();
        let scorer = ScriptedScorer::new();
        assert!(session.accept_rephrase(&scorer).await.is_err());
        assert_eq!(scorer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_custom_rephrase_then_discard() {
        let mut session = controller();
        let rewriter = ScriptedRewriter::with_texts(["casual take"]);
        let (tx, _rx) = mpsc::unbounded_channel();

        let token = session.guard().try_acquire().unwrap();
        let pending = session
            .rephrase_with_instruction(token, &rewriter, "Formal text.", "casual", &tx)
            .await
            .unwrap();
        assert_eq!(pending.rephrased, "casual take");
        assert_eq!(pending.original_score, None);

        session.discard_rephrase();
        assert!(session.pending_rephrase().is_none());
        assert_eq!(session.content(), "Formal text.");
    }

    #[tokio::test]
    async fn test_rephrase_failure_leaves_no_candidate() {
        let mut session = controller();
        let scorer = ScriptedScorer::with_scores([60]);
        let rewriter = ScriptedRewriter::new();
        rewriter.enqueue_failure("quota");
        let (tx, _rx) = mpsc::unbounded_channel();

        let token = session.guard().try_acquire().unwrap();
        let err = session
            .auto_rephrase(token, &scorer, &rewriter, "text", &tx)
            .await
            .unwrap_err();

        assert!(matches!(err, DetectorError::Rewrite(_)));
        assert!(session.pending_rephrase().is_none());
        assert_eq!(session.last_error(), Some("Rephrasing failed: quota"));
        assert!(!session.guard().is_active());
    }

    #[tokio::test]
    async fn test_auto_rephrase_keeps_initial_analysis() {
        let mut session = controller_with_attempts(1);
        let scorer = ScriptedScorer::with_scores([72, 40]);
        let rewriter = ScriptedRewriter::with_texts(["calmer"]);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let token = session.guard().try_acquire().unwrap();
        session
            .auto_rephrase(token, &scorer, &rewriter, "never analyzed", &tx)
            .await
            .unwrap();

        assert_eq!(session.result().map(AnalysisResult::ai_score), Some(72));
        assert_eq!(session.snapshot().result.map(|r| r.ai_score()), Some(72));
        assert_eq!(scorer.call_count(), 2);
        assert_eq!(rx.try_recv().unwrap(), RephraseStatus::InitialAnalysis);
        assert_eq!(session.pending_rephrase().unwrap().original_score, Some(72));
    }

    #[tokio::test]
    async fn test_initial_analysis_survives_failed_loop() {
        let mut session = controller();
        let scorer = ScriptedScorer::with_scores([55]);
        let rewriter = ScriptedRewriter::new();
        rewriter.enqueue_failure("quota");
        let (tx, _rx) = mpsc::unbounded_channel();

        let token = session.guard().try_acquire().unwrap();
        assert!(session
            .auto_rephrase(token, &scorer, &rewriter, "fresh text", &tx)
            .await
            .is_err());

        assert_eq!(session.result().map(AnalysisResult::ai_score), Some(55));
        assert!(session.pending_rephrase().is_none());
    }

    #[tokio::test]
    async fn test_select_history_item_clears_stale_result() {
        let mut session = controller();
        let scorer = ScriptedScorer::with_scores([50]);
        session.analyze(&scorer, "first").await.unwrap();

        session.select_history_item("older text");
        assert_eq!(session.content(), "older text");
        assert!(session.result().is_none());
        assert!(session.create_share_link("https://detector.local/").is_err());
    }

    #[tokio::test]
    async fn test_share_link_for_current_result() {
        let mut session = controller();
        let scorer = ScriptedScorer::with_scores([42]);
        session.analyze(&scorer, "text").await.unwrap();

        let link = session.create_share_link("https://detector.local/").unwrap();
        let decoded = crate::analysis::parse_share_link(&link).unwrap();
        assert_eq!(decoded.ai_score(), 42);
    }
}
