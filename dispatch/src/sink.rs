//! Fault notification registry.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Shared handler signature for faults surfaced off the caller's stack.
pub type FaultHandler = Arc<dyn Fn(&anyhow::Error) + Send + Sync>;

/// Registration token returned by [`ErrorSink::subscribe`]; pass it back to
/// [`ErrorSink::unsubscribe`] to drop the handler.
#[derive(Debug)]
pub struct ErrorSubscription {
    id: u64,
}

/// The error-occurred registration point fed by redirected dispatch faults.
///
/// Subscribers are invoked in registration order, outside the registry
/// lock, so a handler may itself subscribe or unsubscribe without
/// deadlocking.
#[derive(Clone, Default)]
pub struct ErrorSink {
    inner: Arc<SinkInner>,
}

#[derive(Default)]
struct SinkInner {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(u64, FaultHandler)>>,
}

impl ErrorSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for redirected faults.
    pub fn subscribe(
        &self,
        handler: impl Fn(&anyhow::Error) + Send + Sync + 'static,
    ) -> ErrorSubscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().push((id, Arc::new(handler)));
        ErrorSubscription { id }
    }

    /// Drop the handler behind `subscription`. A token from a registry that
    /// was since cleared is a no-op.
    pub fn unsubscribe(&self, subscription: ErrorSubscription) {
        self.inner
            .subscribers
            .lock()
            .retain(|(id, _)| *id != subscription.id);
    }

    /// Deliver `fault` to every subscriber. Returns `true` when at least
    /// one subscriber received it, so callers can fall back to a default
    /// handler for faults nobody is watching.
    pub(crate) fn emit(&self, fault: &anyhow::Error) -> bool {
        let handlers: Vec<FaultHandler> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in &handlers {
            handler(fault);
        }
        !handlers.is_empty()
    }

    /// Drop every registration. Part of the owner's teardown.
    pub(crate) fn clear(&self) {
        self.inner.subscribers.lock().clear();
    }
}

impl fmt::Debug for ErrorSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorSink")
            .field("subscribers", &self.inner.subscribers.lock().len())
            .finish()
    }
}
