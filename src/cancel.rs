//! Cooperative cancellation
//!
//! The heavy stages (pairwise distance matrix, Voronoi construction) can
//! exceed a frame budget on large patterns, so hosts run the engine on a
//! background thread. A [`CancelToken`] lets the host abandon a stale
//! in-flight computation when a newer edit supersedes it: the engine checks
//! the token between stages and inside its O(n²) loops and returns
//! `EngineError::Cancelled` once it observes the flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{EngineError, Result};

/// Cloneable cancellation flag shared between the host and a computation
///
/// # Example
///
/// ```
/// use blast_geometry::CancelToken;
///
/// let token = CancelToken::new();
/// let worker_copy = token.clone();
/// assert!(!worker_copy.is_cancelled());
/// token.cancel();
/// assert!(worker_copy.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation; all clones observe the flag
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Bail out of a computation if cancellation has been requested
    #[inline]
    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}
