//! TOML configuration for the rephrase loop and analysis history.
//!
//! Provides two loading methods:
//! - `default_config()` - Loads the config embedded in the binary
//! - `load_config(path)` - Loads a custom config from a file path

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Default config embedded in the binary at compile time.
/// Loaded from `src-tauri/config/detector.toml`.
const DEFAULT_CONFIG: &str = include_str!("../config/detector.toml");

/// Upper bound on rewrite attempts per auto-rephrase run.
pub const MAX_REPHRASE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub rephrase: RephraseSettings,
    pub history: HistorySettings,
}

/// Attempt budget and pacing for the auto-rephrase loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RephraseSettings {
    pub max_attempts: u32,
    #[serde(default)]
    pub pacing_min_ms: u64,
    #[serde(default)]
    pub pacing_max_ms: u64,
}

impl RephraseSettings {
    /// Lower and upper bound of the pause between attempts.
    pub fn pacing(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.pacing_min_ms),
            Duration::from_millis(self.pacing_max_ms),
        )
    }

    /// Settings for non-interactive runs: same budget, no pauses.
    pub fn without_pacing(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            pacing_min_ms: 0,
            pacing_max_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySettings {
    pub limit: usize,
    pub key: String,
}

/// Load a config from a TOML file at the given path.
///
/// # Errors
/// Fails if the file cannot be read, the TOML is invalid, or the values
/// are out of range (attempts outside 1..=5, zero history limit, inverted pacing).
pub fn load_config(path: &Path) -> Result<DetectorConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate a config from TOML text.
pub fn parse_config(content: &str) -> Result<DetectorConfig> {
    let config: DetectorConfig = toml::from_str(content)?;

    if config.rephrase.max_attempts == 0 {
        bail!("rephrase.max_attempts must be at least 1");
    }
    if config.rephrase.max_attempts > MAX_REPHRASE_ATTEMPTS {
        bail!(
            "rephrase.max_attempts ({}) exceeds the limit of {}",
            config.rephrase.max_attempts,
            MAX_REPHRASE_ATTEMPTS
        );
    }
    if config.rephrase.pacing_min_ms > config.rephrase.pacing_max_ms {
        bail!(
            "rephrase.pacing_min_ms ({}) exceeds pacing_max_ms ({})",
            config.rephrase.pacing_min_ms,
            config.rephrase.pacing_max_ms
        );
    }
    if config.history.limit == 0 {
        bail!("history.limit must be at least 1");
    }
    if config.history.key.trim().is_empty() {
        bail!("history.key must not be empty");
    }

    Ok(config)
}

/// Get the default config embedded in the binary.
///
/// # Panics
/// Panics if the embedded TOML is invalid (this would be a compile-time bug).
pub fn default_config() -> DetectorConfig {
    parse_config(DEFAULT_CONFIG).expect("embedded detector.toml must be valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_values() {
        let config = default_config();
        assert_eq!(config.rephrase.max_attempts, 5);
        assert_eq!(config.rephrase.pacing_min_ms, 1500);
        assert_eq!(config.rephrase.pacing_max_ms, 2000);
        assert_eq!(config.history.limit, 10);
        assert_eq!(config.history.key, "analysisHistory");
    }

    #[test]
    fn test_pacing_range() {
        let config = default_config();
        let (min, max) = config.rephrase.pacing();
        assert_eq!(min, Duration::from_millis(1500));
        assert_eq!(max, Duration::from_millis(2000));
    }

    #[test]
    fn test_without_pacing() {
        let settings = RephraseSettings::without_pacing(3);
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.pacing(), (Duration::ZERO, Duration::ZERO));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[rephrase]\nmax_attempts = 3\n\n[history]\nlimit = 4\nkey = \"custom\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.rephrase.max_attempts, 3);
        assert_eq!(config.rephrase.pacing_min_ms, 0);
        assert_eq!(config.history.limit, 4);
        assert_eq!(config.history.key, "custom");
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let err = parse_config("[rephrase]\nmax_attempts = 0\n[history]\nlimit = 10\nkey = \"k\"")
            .unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn test_rejects_attempts_above_limit() {
        let err = parse_config("[rephrase]\nmax_attempts = 6\n[history]\nlimit = 10\nkey = \"k\"")
            .unwrap_err();
        assert!(err.to_string().contains("exceeds the limit of 5"));

        let config =
            parse_config("[rephrase]\nmax_attempts = 5\n[history]\nlimit = 10\nkey = \"k\"").unwrap();
        assert_eq!(config.rephrase.max_attempts, MAX_REPHRASE_ATTEMPTS);
    }

    #[test]
    fn test_rejects_inverted_pacing() {
        let err = parse_config(
            "[rephrase]\nmax_attempts = 5\npacing_min_ms = 900\npacing_max_ms = 100\n[history]\nlimit = 10\nkey = \"k\"",
        )
        .unwrap_err();
        assert!(err.to_string().contains("pacing_min_ms"));
    }

    #[test]
    fn test_rejects_invalid_toml() {
        assert!(parse_config("not = [valid").is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config(Path::new("/nonexistent/detector.toml")).is_err());
    }
}
