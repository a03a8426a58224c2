//! The synchronization dispatcher.
//!
//! A [`Dispatcher`] resolves an effective execution context and marshals
//! closures onto it, falling back to inline or fire-and-forget execution
//! when no context resolves. It is the component a property-change
//! notifier or any other cross-thread consumer talks to.
//!
//! # Context resolution
//!
//! In order: the dispatcher's own captured context; the configuration's
//! ambient context unless `suppress_ambient` is set; the configuration's
//! backup context; none. Every rung is explicit injected state — nothing
//! is read from thread-locals at call time.
//!
//! # Fault routing
//!
//! Work that completes on the caller's own stack — inline execution and
//! blocking sends — returns its fault to the caller as
//! [`InvokeError::Fault`]. Work the caller does not wait for —
//! non-blocking posts and fire-and-forget fallthrough — reports faults to
//! the [`ErrorSink`], falling back to the configured default handler when
//! nobody subscribed.
//!
//! # Ordering
//!
//! Two blocking sends into the same context execute in submission order
//! relative to each other; the context's single servicing thread
//! serializes them. Posts carry no ordering guarantee beyond the context's
//! own queue.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::config::{DispatchConfig, MarshalMode, UnanchoredMode};
use crate::context::ContextHandle;
use crate::disposal::DisposalGate;
use crate::error::{DispatchError, InvokeError};
use crate::fire_forget::BackgroundExecutor;
use crate::sink::{ErrorSink, ErrorSubscription, FaultHandler};

/// Marshals closures onto a captured execution context.
pub struct Dispatcher {
    gate: DisposalGate,
    /// Read-only after construction, except for the single clear performed
    /// by the disposal winner. The mutex orders that clear before any
    /// subsequent read observing the context as absent.
    captured: Mutex<Option<ContextHandle>>,
    config: Arc<DispatchConfig>,
    sink: ErrorSink,
    executor: BackgroundExecutor,
}

impl Dispatcher {
    /// Build a dispatcher around an optionally captured context.
    ///
    /// `runtime` backs the fire-and-forget fallthrough; the configuration's
    /// default fault handler becomes the executor's default.
    #[must_use]
    pub fn new(
        captured: Option<ContextHandle>,
        config: Arc<DispatchConfig>,
        runtime: Handle,
    ) -> Self {
        let executor = BackgroundExecutor::new(runtime, config.default_fault_handler.clone());
        Self {
            gate: DisposalGate::new(),
            captured: Mutex::new(captured),
            config,
            sink: ErrorSink::new(),
            executor,
        }
    }

    /// Dispatch `op` per the configured marshal and fallthrough modes.
    ///
    /// Bind whatever state the closure needs by capture; the dispatcher
    /// itself takes no argument lists.
    pub fn invoke<F>(&self, op: F) -> Result<(), InvokeError>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.gate.ensure_active()?;
        match self.resolve_context() {
            Some(ctx) => match self.config.marshal {
                MarshalMode::Send => self.marshal_send(&ctx, op),
                MarshalMode::Post => self.marshal_post(&ctx, op),
            },
            None => match self.config.unanchored {
                UnanchoredMode::Inline => op().map_err(InvokeError::Fault),
                UnanchoredMode::FireAndForget => {
                    let handler = self.sink_handler();
                    self.executor.fire_and_forget(op, Some(handler), None)?;
                    Ok(())
                }
            },
        }
    }

    /// Force a blocking send, bypassing the configured marshal mode.
    ///
    /// With no resolvable context the closure runs inline — the forced
    /// synchronous call must observe completion either way. Faults come
    /// back to the caller.
    pub fn invoke_send<F>(&self, op: F) -> Result<(), InvokeError>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.gate.ensure_active()?;
        match self.resolve_context() {
            Some(ctx) => self.marshal_send(&ctx, op),
            None => op().map_err(InvokeError::Fault),
        }
    }

    /// Force a non-blocking post, bypassing the configured marshal mode.
    ///
    /// With no resolvable context the closure goes to the fire-and-forget
    /// executor — the forced asynchronous call must never block the
    /// caller. Faults go to the error sink.
    pub fn invoke_post<F>(&self, op: F) -> Result<(), InvokeError>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.gate.ensure_active()?;
        match self.resolve_context() {
            Some(ctx) => self.marshal_post(&ctx, op),
            None => {
                let handler = self.sink_handler();
                self.executor.fire_and_forget(op, Some(handler), None)?;
                Ok(())
            }
        }
    }

    /// Schedule `op` on the background executor without waiting.
    ///
    /// Unlike the invoke family this never consults contexts; see
    /// [`BackgroundExecutor::fire_and_forget`] for the fault-routing and
    /// cancellation contract.
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
        self.executor.fire_and_forget(op, handler, cancel)
    }

    /// Register a handler for faults redirected off callers' stacks.
    pub fn on_error(
        &self,
        handler: impl Fn(&anyhow::Error) + Send + Sync + 'static,
    ) -> Result<ErrorSubscription, DispatchError> {
        self.gate.ensure_active()?;
        Ok(self.sink.subscribe(handler))
    }

    /// Drop an error registration. Safe to call during teardown paths;
    /// a token from a registry already cleared is a no-op.
    pub fn unsubscribe(&self, subscription: ErrorSubscription) {
        self.sink.unsubscribe(subscription);
    }

    /// The captured context, if still held. `None` after disposal.
    #[must_use]
    pub fn captured_context(&self) -> Option<ContextHandle> {
        self.captured.lock().clone()
    }

    /// A clone of this dispatcher's disposal gate, for sibling components
    /// (e.g. a [`GuardedInvoker`](crate::GuardedInvoker) built with
    /// `with_gate`) that must observe the same teardown. Dispose through
    /// the dispatcher, not the clone, so the teardown body runs.
    #[must_use]
    pub fn disposal_gate(&self) -> DisposalGate {
        self.gate.clone()
    }

    /// Tear down: exactly one winner clears the captured context, then
    /// drops the error registrations, then disposes the executor. All
    /// other calls are no-ops. Work already marshaled re-validates the
    /// gate on its servicing thread and skips its body.
    pub fn dispose(&self) -> bool {
        self.gate.dispose_with(|| {
            self.captured.lock().take();
            self.sink.clear();
            self.executor.dispose();
        })
    }

    fn resolve_context(&self) -> Option<ContextHandle> {
        let captured = self.captured.lock().clone();
        if captured.is_some() {
            return captured;
        }
        if !self.config.suppress_ambient && self.config.ambient.is_some() {
            return self.config.ambient.clone();
        }
        self.config.backup.clone()
    }

    fn marshal_send<F>(&self, ctx: &ContextHandle, op: F) -> Result<(), InvokeError>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        let gate = self.gate.clone();
        ctx.send(move || -> Result<(), InvokeError> {
            if gate.is_disposed() {
                return Err(InvokeError::Disposed);
            }
            op().map_err(InvokeError::Fault)
        })?
    }

    fn marshal_post<F>(&self, ctx: &ContextHandle, op: F) -> Result<(), InvokeError>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        let gate = self.gate.clone();
        let notify = self.sink_handler();
        ctx.post(move || {
            if gate.is_disposed() {
                return;
            }
            if let Err(fault) = op() {
                notify(&fault);
            }
        })?;
        Ok(())
    }

    /// A handler that prefers sink subscribers, then the configured
    /// default, and as a last resort leaves a log line.
    fn sink_handler(&self) -> FaultHandler {
        let sink = self.sink.clone();
        let fallback = self.config.default_fault_handler.clone();
        Arc::new(move |fault| {
            if sink.emit(fault) {
                return;
            }
            match &fallback {
                Some(handler) => handler(fault),
                None => {
                    tracing::error!(fault = %fault, "dispatched closure failed with no error subscriber");
                }
            }
        })
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}
