//! Disposal-checked scoped lock invocation.

use parking_lot::RwLock;

use crate::disposal::DisposalGate;
use crate::error::DispatchError;

/// Runs closures under a caller-owned reader/writer lock, after a disposal
/// check.
///
/// The lock belongs to the caller (typically the collection or state being
/// protected); this component only acquires and releases it — never
/// constructs, destroys, or upgrades it. Acquisition is scoped: the guard
/// drops on every exit path of the closure, normal return or unwind.
///
/// Whatever the closure returns — including its own error values — rides
/// through unchanged inside `Ok`; this layer never converts, swallows, or
/// redirects it (contrast with the dispatcher, which redirects posted
/// faults to its error sink).
///
/// Re-entrant acquisition on the same lock from inside the closure is the
/// caller's responsibility; `parking_lot` locks are not reentrant.
#[derive(Debug, Clone, Default)]
pub struct GuardedInvoker {
    gate: DisposalGate,
}

impl GuardedInvoker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Share a disposal gate with the component embedding this invoker, so
    /// one teardown covers both.
    #[must_use]
    pub fn with_gate(gate: DisposalGate) -> Self {
        Self { gate }
    }

    /// Run `op` holding the lock in shared mode. Any number of concurrent
    /// shared holders may overlap.
    pub fn read_lock<T, R>(
        &self,
        lock: &RwLock<T>,
        op: impl FnOnce(&T) -> R,
    ) -> Result<R, DispatchError> {
        self.gate.ensure_active()?;
        let guard = lock.read();
        Ok(op(&guard))
    }

    /// Run `op` holding the lock in exclusive mode. No other holder,
    /// shared or exclusive, overlaps with it.
    pub fn write_lock<T, R>(
        &self,
        lock: &RwLock<T>,
        op: impl FnOnce(&mut T) -> R,
    ) -> Result<R, DispatchError> {
        self.gate.ensure_active()?;
        let mut guard = lock.write();
        Ok(op(&mut guard))
    }

    /// Run `op` after the disposal check only, without locking — for
    /// operations that do not touch lock-protected state.
    pub fn check_disposed<R>(&self, op: impl FnOnce() -> R) -> Result<R, DispatchError> {
        self.gate.ensure_active()?;
        Ok(op())
    }

    /// Flip this invoker to disposed; later calls fail with
    /// [`DispatchError::Disposed`].
    pub fn dispose(&self) -> bool {
        self.gate.dispose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn closure_results_ride_through_unchanged() {
        let invoker = GuardedInvoker::new();
        let lock = RwLock::new(5_u32);

        let doubled = invoker.read_lock(&lock, |value| *value * 2).unwrap();
        assert_eq!(doubled, 10);

        // The closure's own error value is untouched by this layer.
        let inner: Result<(), &str> = invoker.read_lock(&lock, |_| Err("domain error")).unwrap();
        assert_eq!(inner, Err("domain error"));
    }

    #[test]
    fn write_lock_mutates_under_exclusion() {
        let invoker = GuardedInvoker::new();
        let lock = RwLock::new(Vec::new());

        invoker.write_lock(&lock, |items| items.push(1)).unwrap();
        invoker.write_lock(&lock, |items| items.push(2)).unwrap();
        assert_eq!(*lock.read(), vec![1, 2]);
    }

    #[test]
    fn writers_never_overlap_with_any_other_holder() {
        const WRITERS: usize = 8;
        let invoker = GuardedInvoker::new();
        let lock = RwLock::new(());
        let inside = AtomicU32::new(0);

        thread::scope(|s| {
            for _ in 0..WRITERS {
                s.spawn(|| {
                    invoker
                        .write_lock(&lock, |_| {
                            let occupants = inside.fetch_add(1, Ordering::SeqCst);
                            assert_eq!(occupants, 0, "write section must be exclusive");
                            thread::sleep(Duration::from_millis(2));
                            inside.fetch_sub(1, Ordering::SeqCst);
                        })
                        .unwrap();
                });
            }
        });
    }

    #[test]
    fn readers_overlap_with_each_other() {
        let invoker = GuardedInvoker::new();
        let lock = RwLock::new(());
        // Both readers must be inside their critical sections at once to
        // get past the barrier; exclusive acquisition would deadlock here.
        let rendezvous = Barrier::new(2);

        thread::scope(|s| {
            for _ in 0..2 {
                s.spawn(|| {
                    invoker
                        .read_lock(&lock, |_| {
                            rendezvous.wait();
                        })
                        .unwrap();
                });
            }
        });
    }

    #[test]
    fn disposed_invoker_rejects_every_operation() {
        let invoker = GuardedInvoker::new();
        let lock = RwLock::new(0_u32);
        let ran = AtomicU32::new(0);

        assert!(invoker.dispose());
        assert!(!invoker.dispose());

        assert!(matches!(
            invoker.read_lock(&lock, |_| ran.fetch_add(1, Ordering::SeqCst)),
            Err(DispatchError::Disposed)
        ));
        assert!(matches!(
            invoker.write_lock(&lock, |_| ran.fetch_add(1, Ordering::SeqCst)),
            Err(DispatchError::Disposed)
        ));
        assert!(matches!(
            invoker.check_disposed(|| ran.fetch_add(1, Ordering::SeqCst)),
            Err(DispatchError::Disposed)
        ));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn a_shared_gate_covers_the_invoker() {
        let gate = DisposalGate::new();
        let invoker = GuardedInvoker::with_gate(gate.clone());

        assert!(invoker.check_disposed(|| ()).is_ok());
        gate.dispose();
        assert!(matches!(
            invoker.check_disposed(|| ()),
            Err(DispatchError::Disposed)
        ));
    }
}
