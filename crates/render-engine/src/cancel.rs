//! Cooperative job cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use beatcut_common::{BeatcutError, BeatcutResult};

/// Shared flag checked by the renderer between stages.
///
/// Cancelling never interrupts a running subprocess; the job stops at the
/// next stage boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> BeatcutResult<()> {
        if self.is_cancelled() {
            Err(BeatcutError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let worker_side = token.clone();
        assert!(worker_side.check().is_ok());
        token.cancel();
        assert!(worker_side.is_cancelled());
        assert!(matches!(worker_side.check(), Err(BeatcutError::Cancelled)));
    }
}
