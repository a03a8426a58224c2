//! Dispatch failure taxonomy.

use thiserror::Error;

/// Failures raised by dispatch primitives before any user code runs.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The instance was torn down; always fatal to the call, never retried
    /// at this layer.
    #[error("instance has been disposed")]
    Disposed,
    /// The execution context's servicing thread is no longer running.
    #[error("execution context is no longer running")]
    ContextClosed,
}

/// Failures surfaced by `Dispatcher::invoke` and its forcing variants.
///
/// Inline and blocking-send execution hand the closure's own fault back to
/// the caller as [`Fault`](Self::Fault); the non-blocking paths never do —
/// their faults go to the error sink instead.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The dispatcher was torn down before the call started, or between
    /// queueing and execution.
    #[error("instance has been disposed")]
    Disposed,
    /// The resolved execution context's servicing thread is gone.
    #[error("execution context is no longer running")]
    ContextClosed,
    /// The dispatched closure itself failed.
    #[error(transparent)]
    Fault(#[from] anyhow::Error),
}

impl From<DispatchError> for InvokeError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Disposed => Self::Disposed,
            DispatchError::ContextClosed => Self::ContextClosed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_errors_convert_losslessly() {
        assert!(matches!(
            InvokeError::from(DispatchError::Disposed),
            InvokeError::Disposed
        ));
        assert!(matches!(
            InvokeError::from(DispatchError::ContextClosed),
            InvokeError::ContextClosed
        ));
    }

    #[test]
    fn fault_preserves_the_underlying_error() {
        let fault = InvokeError::from(anyhow::anyhow!("boom"));
        assert_eq!(fault.to_string(), "boom");
    }
}
