//! Thread-synchronization dispatch for Tether.
//!
//! # Architecture
//!
//! The crate is organized leaves-first around five components:
//!
//! | Component | Role |
//! |-----------|------|
//! | [`DisposalGate`] | Single-shot Active → Disposed state machine guarding every entry point |
//! | [`SyncContext`] / [`ContextHandle`] | A captured execution context: one servicing thread draining a FIFO queue |
//! | [`BackgroundExecutor`] | Fire-and-forget scheduling onto a runtime's worker pools |
//! | [`Dispatcher`] | Context resolution and marshaling, with fallthrough to inline or fire-and-forget execution |
//! | [`GuardedInvoker`] | Disposal-checked, RAII-scoped invocation under a caller-owned reader/writer lock |
//!
//! A consumer (a property-change notifier, a view-model, any cross-thread
//! caller) talks to the [`Dispatcher`] and [`GuardedInvoker`]; resilience
//! is layered separately by wrapping operations with `tether-retry` before
//! dispatching them.
//!
//! # Fault routing
//!
//! Execution the caller waits for (inline, blocking send) returns faults to
//! the caller. Execution the caller does not wait for (post,
//! fire-and-forget) reports faults to the [`ErrorSink`] / configured
//! handler — and a fire-and-forget fault with no handler anywhere is
//! dropped at that boundary by design, leaving only an `error`-level log
//! line. See [`BackgroundExecutor`] for the precise contract.
//!
//! # Configuration
//!
//! All behavior switches live in one injectable [`DispatchConfig`] value;
//! nothing reads process-global mutable state.

mod config;
mod context;
mod disposal;
mod dispatcher;
mod error;
mod fire_forget;
mod lock;
mod sink;

pub use config::{DispatchConfig, MarshalMode, UnanchoredMode};
pub use context::{ContextHandle, SyncContext};
pub use disposal::DisposalGate;
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, InvokeError};
pub use fire_forget::BackgroundExecutor;
pub use lock::GuardedInvoker;
pub use sink::{ErrorSink, ErrorSubscription, FaultHandler};
