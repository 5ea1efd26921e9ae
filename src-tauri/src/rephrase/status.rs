use std::fmt;

/// Progress reported while a rephrase is running.
/// `Display` renders the message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RephraseStatus {
    InitialAnalysis,
    TargetReached,
    Rephrasing { attempt: u32, max_attempts: u32, best_score: u8 },
    Analyzing { attempt: u32, max_attempts: u32 },
    Improvement { score: u8 },
    NoImprovement { attempt: u32, max_attempts: u32 },
    CouldNotImprove,
    CustomRewrite,
}

impl fmt::Display for RephraseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitialAnalysis => write!(f, "Running initial analysis..."),
            Self::TargetReached => write!(f, "Target of 0% AI score reached!"),
            Self::Rephrasing {
                attempt,
                max_attempts,
                best_score,
            } => write!(
                f,
                "Attempt {}/{}: Rephrasing content... (Best score: {}%)",
                attempt, max_attempts, best_score
            ),
            Self::Analyzing {
                attempt,
                max_attempts,
            } => write!(f, "Attempt {}/{}: Analyzing new version...", attempt, max_attempts),
            Self::Improvement { score } => write!(f, "Improvement found! New best score: {}%", score),
            Self::NoImprovement {
                attempt,
                max_attempts,
            } => write!(
                f,
                "Attempt {}/{}: No improvement found. Trying again...",
                attempt, max_attempts
            ),
            Self::CouldNotImprove => write!(f, "Could not improve the score further."),
            Self::CustomRewrite => write!(f, "Generating new version with your instructions..."),
        }
    }
}
