//! Single-slot permit that keeps collection cycles from overlapping.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Non-reentrant, non-blocking cycle permit.
///
/// Clones share the same slot. [`CycleGuard::try_acquire`] never waits: if a
/// cycle already holds the permit, the caller gets `None` and should drop its
/// trigger.
#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    slot: Arc<Mutex<()>>,
}

/// Proof that the holder owns the cycle slot. Released on drop, including
/// when the holding task panics or is cancelled.
#[derive(Debug)]
pub struct CyclePermit {
    _slot: OwnedMutexGuard<()>,
}

impl CycleGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn try_acquire(&self) -> Option<CyclePermit> {
        Arc::clone(&self.slot)
            .try_lock_owned()
            .ok()
            .map(|slot| CyclePermit { _slot: slot })
    }

    /// True while some cycle holds the permit.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.slot.try_lock().is_err()
    }
}
