use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Scoring failed: {0}")]
    Scoring(String),

    #[error("Rephrasing failed: {0}")]
    Rewrite(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Validation(String),

    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("A rephrase is already in progress")]
    Busy,
}

impl From<DetectorError> for String {
    fn from(err: DetectorError) -> Self {
        err.to_string()
    }
}
