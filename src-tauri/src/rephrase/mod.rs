//! Auto-rephrase loop, custom-instruction rewrite, and their progress reporting.

pub mod custom;
pub mod guard;
pub mod optimizer;
pub mod status;

pub use custom::rephrase_with_instruction;
pub use guard::{RephraseGuard, RephraseToken};
pub use optimizer::{RephraseOptimizer, RephraseOutcome};
pub use status::RephraseStatus;
