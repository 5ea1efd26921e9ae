use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::error::DetectorError;

/// Shared "a rephrase is running" flag.
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct RephraseGuard {
    active: Arc<AtomicBool>,
}

impl RephraseGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Mark a run as started. Rejects with `Busy` while another run holds the flag.
    /// The flag is released when the returned token is dropped.
    pub fn try_acquire(&self) -> Result<RephraseToken, DetectorError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Rejected rephrase request: one is already running");
            return Err(DetectorError::Busy);
        }
        Ok(RephraseToken {
            active: Arc::clone(&self.active),
        })
    }
}

/// Held for the duration of one run.
#[derive(Debug)]
pub struct RephraseToken {
    active: Arc<AtomicBool>,
}

impl Drop for RephraseToken {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}
