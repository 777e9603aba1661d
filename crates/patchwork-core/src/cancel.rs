//! Cooperative cancellation
//!
//! Long traversals call [`CancellationToken::check`] at their checkpoints and
//! bail out with [`PatchworkError::Cancelled`]. Because trees are immutable,
//! aborting midway never leaves a partially edited tree behind.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::Result;
use crate::error::PatchworkError;

/// Shared cancellation flag, cheap to clone across threads
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation for every clone of this token
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Checkpoint: returns `Err(Cancelled)` once cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PatchworkError::Cancelled)
        } else {
            Ok(())
        }
    }
}
