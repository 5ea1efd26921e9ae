//! Single-shot rewrite driven by a user instruction.

use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use super::status::RephraseStatus;
use crate::detector::Rewriter;
use crate::error::DetectorError;

/// Produce exactly one rewrite of `text` following `instruction`.
/// No scoring and no retry; failures propagate unchanged.
pub async fn rephrase_with_instruction<R>(
    rewriter: &R,
    text: &str,
    instruction: &str,
    status: &UnboundedSender<RephraseStatus>,
) -> Result<String, DetectorError>
where
    R: Rewriter + ?Sized,
{
    if text.trim().is_empty() {
        return Err(DetectorError::Validation(
            "Please enter some text to rephrase.".to_string(),
        ));
    }
    let instruction = instruction.trim();
    if instruction.is_empty() {
        return Err(DetectorError::Validation(
            "Please describe how the text should be rewritten.".to_string(),
        ));
    }

    let _ = status.send(RephraseStatus::CustomRewrite);
    info!("Rewriting with custom instruction ({} chars)", instruction.len());
    rewriter.rewrite(text, Some(instruction)).await
}
