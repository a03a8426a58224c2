//! Fire-and-forget execution on background workers.

use std::future::Future;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::disposal::DisposalGate;
use crate::error::DispatchError;
use crate::sink::FaultHandler;

/// Schedules work on a runtime's background workers and forgets it.
///
/// The runtime handle is injected at construction; nothing is captured from
/// ambient thread state.
///
/// # Dropped faults
///
/// A fault from scheduled work reaches the per-call handler, or failing
/// that the executor's default handler. With neither configured the fault
/// is dropped at this boundary — logged at `error` level and otherwise
/// unobservable. This is the one place in the crate where an error is
/// intentionally discarded; callers needing guaranteed visibility must
/// supply a handler. No retries happen at this layer.
#[derive(Clone)]
pub struct BackgroundExecutor {
    gate: DisposalGate,
    runtime: Handle,
    default_handler: Option<FaultHandler>,
}

impl BackgroundExecutor {
    #[must_use]
    pub fn new(runtime: Handle, default_handler: Option<FaultHandler>) -> Self {
        Self {
            gate: DisposalGate::new(),
            runtime,
            default_handler,
        }
    }

    /// Schedule `op` on the blocking worker pool and return immediately.
    ///
    /// If `cancel` is already signalled when a worker picks the job up, the
    /// closure never runs and no handler fires. Once started, the closure
    /// runs to completion; cancellation is never preemptive. On a fault the
    /// effective handler is invoked exactly once, synchronously, on the
    /// worker thread. The call itself never reports the closure's fault.
    pub fn fire_and_forget<F>(
        &self,
        op: F,
        handler: Option<FaultHandler>,
        cancel: Option<CancellationToken>,
    ) -> Result<(), DispatchError>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.gate.ensure_active()?;
        let handler = handler.or_else(|| self.default_handler.clone());
        self.runtime.spawn_blocking(move || {
            if cancel.as_ref().is_some_and(|token| token.is_cancelled()) {
                return;
            }
            if let Err(fault) = op() {
                Self::deliver(handler.as_ref(), &fault);
            }
        });
        Ok(())
    }

    /// Future-shaped twin of [`fire_and_forget`](Self::fire_and_forget),
    /// scheduled on the async pool. Same cancellation gating and fault
    /// routing.
    pub fn fire_and_forget_async<Fut>(
        &self,
        fut: Fut,
        handler: Option<FaultHandler>,
        cancel: Option<CancellationToken>,
    ) -> Result<(), DispatchError>
    where
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.gate.ensure_active()?;
        let handler = handler.or_else(|| self.default_handler.clone());
        self.runtime.spawn(async move {
            if cancel.as_ref().is_some_and(|token| token.is_cancelled()) {
                return;
            }
            if let Err(fault) = fut.await {
                Self::deliver(handler.as_ref(), &fault);
            }
        });
        Ok(())
    }

    /// Flip this executor to disposed; later calls fail with
    /// [`DispatchError::Disposed`]. Work already scheduled still runs.
    pub fn dispose(&self) -> bool {
        self.gate.dispose()
    }

    fn deliver(handler: Option<&FaultHandler>, fault: &anyhow::Error) {
        match handler {
            Some(handler) => handler(fault),
            None => {
                tracing::error!(fault = %fault, "fire-and-forget task failed with no handler attached");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::time::Duration;

    fn executor_with_handler() -> (BackgroundExecutor, mpsc::Receiver<String>) {
        let (faults_tx, faults_rx) = mpsc::channel();
        let handler: FaultHandler = Arc::new(move |fault| {
            faults_tx.send(fault.to_string()).unwrap();
        });
        (
            BackgroundExecutor::new(Handle::current(), Some(handler)),
            faults_rx,
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fault_reaches_the_handler_exactly_once() {
        let (executor, faults) = executor_with_handler();

        executor
            .fire_and_forget(|| Err(anyhow::anyhow!("boom")), None, None)
            .unwrap();

        let fault = faults.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(fault, "boom");
        assert!(faults.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn success_is_unobservable() {
        let (executor, faults) = executor_with_handler();
        let (done_tx, done_rx) = mpsc::channel();

        executor
            .fire_and_forget(
                move || {
                    done_tx.send(()).unwrap();
                    Ok(())
                },
                None,
                None,
            )
            .unwrap();

        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(faults.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn per_call_handler_overrides_the_default() {
        let (executor, default_faults) = executor_with_handler();
        let (override_tx, override_rx) = mpsc::channel();
        let handler: FaultHandler = Arc::new(move |fault| {
            override_tx.send(fault.to_string()).unwrap();
        });

        executor
            .fire_and_forget(|| Err(anyhow::anyhow!("routed")), Some(handler), None)
            .unwrap();

        assert_eq!(
            override_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            "routed"
        );
        assert!(
            default_faults
                .recv_timeout(Duration::from_millis(200))
                .is_err()
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pre_cancelled_token_prevents_any_execution() {
        let (executor, faults) = executor_with_handler();
        let (ran_tx, ran_rx) = mpsc::channel();
        let cancel = CancellationToken::new();
        cancel.cancel();

        executor
            .fire_and_forget(
                move || {
                    ran_tx.send(()).unwrap();
                    Err(anyhow::anyhow!("never reached"))
                },
                None,
                Some(cancel),
            )
            .unwrap();

        assert!(ran_rx.recv_timeout(Duration::from_millis(300)).is_err());
        assert!(faults.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn async_faults_route_like_blocking_ones() {
        let (executor, faults) = executor_with_handler();

        executor
            .fire_and_forget_async(async { Err(anyhow::anyhow!("async boom")) }, None, None)
            .unwrap();

        assert_eq!(
            faults.recv_timeout(Duration::from_secs(5)).unwrap(),
            "async boom"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn disposed_executor_rejects_work_before_it_starts() {
        let (executor, faults) = executor_with_handler();
        let (ran_tx, ran_rx) = mpsc::channel();
        assert!(executor.dispose());
        assert!(!executor.dispose());

        let result = executor.fire_and_forget(
            move || {
                ran_tx.send(()).unwrap();
                Ok(())
            },
            None,
            None,
        );
        assert!(matches!(result, Err(DispatchError::Disposed)));
        assert!(ran_rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert!(faults.recv_timeout(Duration::from_millis(100)).is_err());
    }
}
