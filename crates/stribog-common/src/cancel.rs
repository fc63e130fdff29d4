//! Cooperative cancellation.
//!
//! Archive sizes are vendor-controlled and effectively unbounded, so the
//! long-running paths (central-directory indexing, large-entry
//! decompression) take a token and poll it at loop granularity.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::{Error, Result};

/// A cloneable cancellation flag shared between a driver and a worker.
///
/// # Example
///
/// ```
/// use stribog_common::CancelToken;
///
/// let token = CancelToken::new();
/// assert!(token.checkpoint().is_ok());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// assert!(token.checkpoint().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Check the flag without failing.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Fail with [`Error::Cancelled`] if cancellation was requested.
    #[inline]
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = CancelToken::new();
        let b = a.clone();

        a.cancel();
        assert!(b.is_cancelled());
        assert!(matches!(b.checkpoint(), Err(Error::Cancelled)));
    }
}
