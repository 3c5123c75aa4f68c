//! Cooperative cancellation for long-running load/save passes.
//!
//! Key derivation cannot be interrupted, so the store only looks at the
//! token between entries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{NspmError, Result};

/// Shared flag a caller can flip from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation at the next entry boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once `cancel` has been called.
    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(NspmError::Cancelled);
        }
        Ok(())
    }
}
