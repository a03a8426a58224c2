//! Single-shot Active → Disposed state machine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::DispatchError;

/// Tracks whether a component is still usable.
///
/// Clones share state: disposing any clone disposes them all, which lets a
/// component hand gate clones to work it queues elsewhere so that work can
/// re-validate before touching protected state.
///
/// The transition Active → Disposed happens exactly once regardless of how
/// many threads race [`dispose`](Self::dispose); it never reverts.
#[derive(Debug, Clone, Default)]
pub struct DisposalGate {
    disposed: Arc<AtomicBool>,
}

impl DisposalGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with [`DispatchError::Disposed`] once the gate has flipped.
    ///
    /// First statement of every operation that touches protected state.
    pub fn ensure_active(&self) -> Result<(), DispatchError> {
        if self.is_disposed() {
            Err(DispatchError::Disposed)
        } else {
            Ok(())
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Flip Active → Disposed. Returns `true` for exactly one caller across
    /// all clones and threads; that caller runs the owner's teardown body.
    /// Every other call is a no-op returning `false`.
    pub fn dispose(&self) -> bool {
        self.disposed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Run `teardown` if and only if this call won the Active → Disposed
    /// exchange. The store in [`dispose`] happens-before any observer that
    /// sees the gate as disposed, so teardown's effects are visible to
    /// every later [`ensure_active`](Self::ensure_active) failure.
    pub fn dispose_with(&self, teardown: impl FnOnce()) -> bool {
        let won = self.dispose();
        if won {
            teardown();
        }
        won
    }
}
