//! Iterative rewrite-and-rescore loop.
//!
//! Starting from the user's text, the loop asks the Rewriter for a new version,
//! scores it, and keeps the best-scoring text. It stops after the configured
//! number of attempts or as soon as a version scores 0%. Only strictly lower
//! scores are banked.

use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::status::RephraseStatus;
use crate::analysis::AnalysisResult;
use crate::config::RephraseSettings;
use crate::detector::{Rewriter, Scorer};
use crate::error::DetectorError;

/// Result of one completed loop run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RephraseOutcome {
    /// Best-scoring text; equals the input when nothing improved.
    pub final_text: String,
    pub improved: bool,
    pub initial_score: u8,
    pub best_score: u8,
    /// Rewrite + score round trips performed.
    pub attempts: u32,
}

/// Working state of a run. Lives only as long as `run`.
struct LoopState {
    best_text: String,
    best_score: u8,
    attempts: u32,
}

pub struct RephraseOptimizer {
    settings: RephraseSettings,
}

impl RephraseOptimizer {
    pub fn new(settings: RephraseSettings) -> Self {
        Self { settings }
    }

    pub fn max_attempts(&self) -> u32 {
        self.settings.max_attempts
    }

    /// Run the loop over `initial_text`.
    ///
    /// `initial_result` skips the first scoring call when the caller already
    /// has a score for this exact text. Progress goes to `status`; a closed
    /// receiver is ignored.
    ///
    /// # Errors
    /// `Validation` for blank input. Any collaborator failure aborts the run
    /// and is returned unchanged; an improvement banked before the failure is
    /// dropped.
    pub async fn run<S, R>(
        &self,
        scorer: &S,
        rewriter: &R,
        initial_text: &str,
        initial_result: Option<&AnalysisResult>,
        status: &UnboundedSender<RephraseStatus>,
    ) -> Result<RephraseOutcome, DetectorError>
    where
        S: Scorer + ?Sized,
        R: Rewriter + ?Sized,
    {
        let initial_score = match initial_result {
            Some(result) => {
                require_text(initial_text)?;
                result.ai_score()
            }
            None => self.initial_analysis(scorer, initial_text, status).await?.ai_score(),
        };
        info!("Starting rephrase loop at {}%", initial_score);

        let mut state = LoopState {
            best_text: initial_text.to_string(),
            best_score: initial_score,
            attempts: 0,
        };

        if state.best_score == 0 {
            report(status, RephraseStatus::TargetReached);
            return Ok(RephraseOutcome {
                final_text: state.best_text,
                improved: false,
                initial_score,
                best_score: 0,
                attempts: 0,
            });
        }

        let max_attempts = self.settings.max_attempts;
        for attempt in 1..=max_attempts {
            report(
                status,
                RephraseStatus::Rephrasing {
                    attempt,
                    max_attempts,
                    best_score: state.best_score,
                },
            );

            // best_text is still the input until something is banked
            let rephrased = rewriter
                .rewrite(&state.best_text, None)
                .await
                .inspect_err(|e| discard_banked(&state, initial_text, e))?;

            report(status, RephraseStatus::Analyzing { attempt, max_attempts });
            let new_score = scorer
                .score(&rephrased)
                .await
                .inspect_err(|e| discard_banked(&state, initial_text, e))?
                .ai_score();
            state.attempts = attempt;

            if new_score < state.best_score {
                info!(
                    "Attempt {}/{}: improved {}% -> {}%",
                    attempt, max_attempts, state.best_score, new_score
                );
                state.best_text = rephrased;
                state.best_score = new_score;
                report(status, RephraseStatus::Improvement { score: new_score });

                if state.best_score == 0 {
                    report(status, RephraseStatus::TargetReached);
                    self.pause().await;
                    break;
                }
            } else {
                debug!(
                    "Attempt {}/{}: {}% is not below {}%",
                    attempt, max_attempts, new_score, state.best_score
                );
                report(status, RephraseStatus::NoImprovement { attempt, max_attempts });
            }

            if attempt < max_attempts {
                self.pause().await;
            }
        }

        let improved = state.best_text != initial_text;
        if !improved {
            report(status, RephraseStatus::CouldNotImprove);
        }
        info!(
            "Rephrase loop finished after {} attempt(s): {}% -> {}% (improved: {})",
            state.attempts, initial_score, state.best_score, improved
        );

        Ok(RephraseOutcome {
            final_text: state.best_text,
            improved,
            initial_score,
            best_score: state.best_score,
            attempts: state.attempts,
        })
    }

    /// Score the input before the first attempt, reporting `InitialAnalysis`.
    ///
    /// Callers that keep the result pass it back to `run` so the text is not
    /// scored twice.
    pub async fn initial_analysis<S>(
        &self,
        scorer: &S,
        initial_text: &str,
        status: &UnboundedSender<RephraseStatus>,
    ) -> Result<AnalysisResult, DetectorError>
    where
        S: Scorer + ?Sized,
    {
        require_text(initial_text)?;
        report(status, RephraseStatus::InitialAnalysis);
        scorer.score(initial_text).await
    }

    async fn pause(&self) {
        let (min, max) = self.settings.pacing();
        if max.is_zero() {
            return;
        }
        let millis = rand::rng().random_range(min.as_millis()..=max.as_millis());
        tokio::time::sleep(Duration::from_millis(millis as u64)).await;
    }
}

fn require_text(text: &str) -> Result<(), DetectorError> {
    if text.trim().is_empty() {
        return Err(DetectorError::Validation(
            "Please enter some text to rephrase.".to_string(),
        ));
    }
    Ok(())
}

fn report(status: &UnboundedSender<RephraseStatus>, update: RephraseStatus) {
    debug!("{}", update);
    let _ = status.send(update);
}

fn discard_banked(state: &LoopState, initial_text: &str, err: &DetectorError) {
    if state.best_text != initial_text {
        warn!(
            "Rephrase aborted ({}); discarding banked version at {}%",
            err, state.best_score
        );
    } else {
        warn!("Rephrase aborted: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::mock::{result_with_score, ScriptedRewriter, ScriptedScorer};
    use tokio::sync::mpsc;

    fn optimizer() -> RephraseOptimizer {
        RephraseOptimizer::new(RephraseSettings::without_pacing(5))
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<RephraseStatus>) -> Vec<RephraseStatus> {
        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        updates
    }

    #[tokio::test]
    async fn test_keeps_best_of_five_attempts() {
        let scorer = ScriptedScorer::with_scores([70, 40, 40, 50, 50]);
        let rewriter = ScriptedRewriter::with_texts(["v1", "v2", "v3", "v4", "v5"]);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = optimizer()
            .run(&scorer, &rewriter, "original", Some(&result_with_score(65)), &tx)
            .await
            .unwrap();

        assert!(outcome.improved);
        assert_eq!(outcome.final_text, "v2");
        assert_eq!(outcome.best_score, 40);
        assert_eq!(outcome.initial_score, 65);
        assert_eq!(outcome.attempts, 5);

        // attempt 1 and 2 rewrite the original, later ones the banked text
        let calls = rewriter.calls.lock().unwrap();
        assert_eq!(calls[0].0, "original");
        assert_eq!(calls[1].0, "original");
        assert_eq!(calls[2].0, "v2");
        assert!(calls.iter().all(|(_, instruction)| instruction.is_none()));
        drop(calls);

        let updates = drain(&mut rx);
        assert!(updates.contains(&RephraseStatus::Improvement { score: 40 }));
        assert!(!updates.contains(&RephraseStatus::CouldNotImprove));
        assert!(!updates.contains(&RephraseStatus::InitialAnalysis));
    }

    #[tokio::test]
    async fn test_zero_score_needs_no_calls() {
        let scorer = ScriptedScorer::new();
        let rewriter = ScriptedRewriter::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = optimizer()
            .run(&scorer, &rewriter, "already human", Some(&result_with_score(0)), &tx)
            .await
            .unwrap();

        assert!(!outcome.improved);
        assert_eq!(outcome.final_text, "already human");
        assert_eq!(outcome.attempts, 0);
        assert_eq!(scorer.call_count(), 0);
        assert_eq!(rewriter.call_count(), 0);
        assert_eq!(drain(&mut rx), vec![RephraseStatus::TargetReached]);
    }

    #[tokio::test]
    async fn test_rewrite_failure_aborts_and_drops_banked_text() {
        let scorer = ScriptedScorer::with_scores([30]);
        let rewriter = ScriptedRewriter::with_texts(["better"]);
        rewriter.enqueue_failure("quota exceeded");
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = optimizer()
            .run(&scorer, &rewriter, "original", Some(&result_with_score(60)), &tx)
            .await
            .unwrap_err();

        assert!(matches!(err, DetectorError::Rewrite(ref m) if m == "quota exceeded"));
        assert_eq!(rewriter.call_count(), 2);
        assert_eq!(scorer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_scoring_failure_aborts() {
        let scorer = ScriptedScorer::new();
        scorer.enqueue_failure("timeout");
        let rewriter = ScriptedRewriter::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = optimizer()
            .run(&scorer, &rewriter, "original", Some(&result_with_score(60)), &tx)
            .await
            .unwrap_err();
        assert!(matches!(err, DetectorError::Scoring(_)));
    }

    #[tokio::test]
    async fn test_stops_early_when_zero_reached() {
        let scorer = ScriptedScorer::with_scores([50, 0]);
        let rewriter = ScriptedRewriter::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = optimizer()
            .run(&scorer, &rewriter, "original", Some(&result_with_score(80)), &tx)
            .await
            .unwrap();

        assert!(outcome.improved);
        assert_eq!(outcome.best_score, 0);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(rewriter.call_count(), 2);
        assert_eq!(drain(&mut rx).last(), Some(&RephraseStatus::TargetReached));
    }

    #[tokio::test]
    async fn test_never_improving_reports_failure() {
        let scorer = ScriptedScorer::with_scores([55, 60, 55, 70, 90]);
        let rewriter = ScriptedRewriter::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = optimizer()
            .run(&scorer, &rewriter, "original", Some(&result_with_score(55)), &tx)
            .await
            .unwrap();

        assert!(!outcome.improved);
        assert_eq!(outcome.final_text, "original");
        assert_eq!(outcome.best_score, 55);
        assert_eq!(rewriter.call_count(), 5);
        assert_eq!(drain(&mut rx).last(), Some(&RephraseStatus::CouldNotImprove));
    }

    #[tokio::test]
    async fn test_scores_input_when_no_result_given() {
        let scorer = ScriptedScorer::with_scores([45, 20]);
        let rewriter = ScriptedRewriter::with_texts(["v1"]);
        let settings = RephraseSettings::without_pacing(1);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = RephraseOptimizer::new(settings)
            .run(&scorer, &rewriter, "original", None, &tx)
            .await
            .unwrap();

        assert_eq!(outcome.initial_score, 45);
        assert_eq!(outcome.best_score, 20);
        assert_eq!(scorer.calls.lock().unwrap()[0], "original");
        assert_eq!(drain(&mut rx)[0], RephraseStatus::InitialAnalysis);
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected_before_any_call() {
        let scorer = ScriptedScorer::new();
        let rewriter = ScriptedRewriter::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = optimizer()
            .run(&scorer, &rewriter, "   ", None, &tx)
            .await
            .unwrap_err();
        assert!(matches!(err, DetectorError::Validation(_)));
        assert_eq!(scorer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_identical_rewrite_is_not_an_improvement() {
        let scorer = ScriptedScorer::with_scores([10]);
        let rewriter = ScriptedRewriter::with_texts(["same text"]);
        let settings = RephraseSettings::without_pacing(1);
        let (tx, _rx) = mpsc::unbounded_channel();

        let outcome = RephraseOptimizer::new(settings)
            .run(&scorer, &rewriter, "same text", Some(&result_with_score(50)), &tx)
            .await
            .unwrap();

        assert_eq!(outcome.best_score, 10);
        assert!(!outcome.improved);
    }
}
