//! Injected dispatch configuration.
//!
//! The classic form of this subsystem steers behavior through process-wide
//! mutable switches. Here they are one explicit value, constructed once and
//! shared by `Arc` into each dispatcher and executor, so behavior is
//! deterministic and tests never mutate global state.

use std::fmt;

use tether_types::RetryDefaults;

use crate::context::ContextHandle;
use crate::sink::FaultHandler;

/// How `invoke` marshals onto a resolved context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarshalMode {
    /// Blocking send: the caller waits for the closure to finish on the
    /// servicing thread, and the closure's fault comes back to the caller.
    Send,
    /// Non-blocking post: the caller returns immediately; faults go to the
    /// error sink.
    #[default]
    Post,
}

/// What `invoke` does when no context resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnanchoredMode {
    /// Run the closure inline on the calling thread; its fault propagates
    /// to the caller.
    Inline,
    /// Hand the closure to the fire-and-forget executor; faults go to the
    /// error sink.
    #[default]
    FireAndForget,
}

/// One injectable configuration value for dispatchers and executors.
#[derive(Clone, Default)]
pub struct DispatchConfig {
    /// Stand-in for "the context current on the calling thread": an
    /// explicitly registered ambient context, consulted when a dispatcher
    /// has no captured context of its own.
    pub ambient: Option<ContextHandle>,
    /// Skip the ambient context during resolution.
    pub suppress_ambient: bool,
    /// Last-resort context consulted after the ambient one.
    pub backup: Option<ContextHandle>,
    /// Marshal mode for `invoke` when a context resolved.
    pub marshal: MarshalMode,
    /// Behavior for `invoke` when no context resolved.
    pub unanchored: UnanchoredMode,
    /// Fallback handler for faults nobody subscribed to; also the default
    /// handler of executors built from this configuration.
    pub default_fault_handler: Option<FaultHandler>,
    /// Baseline retry tuning for policies seeded from this configuration.
    pub retry: RetryDefaults,
}

impl fmt::Debug for DispatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchConfig")
            .field("ambient", &self.ambient.is_some())
            .field("suppress_ambient", &self.suppress_ambient)
            .field("backup", &self.backup.is_some())
            .field("marshal", &self.marshal)
            .field("unanchored", &self.unanchored)
            .field(
                "default_fault_handler",
                &self.default_fault_handler.is_some(),
            )
            .field("retry", &self.retry)
            .finish()
    }
}
