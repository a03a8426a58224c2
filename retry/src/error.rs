//! Retry failure taxonomy.

use thiserror::Error;

/// Why a retried call ultimately failed.
///
/// This is a sum type that structurally distinguishes the three terminal
/// outcomes, ensuring callers cannot confuse "gave up after retrying" with
/// "was asked to stop".
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The policy could never run the operation; raised before any work.
    #[error("retry policy must allow at least one attempt")]
    InvalidPolicy,
    /// The attempt budget is spent, or the last error was classified as
    /// not retriable. Carries the error from the final attempt.
    #[error("gave up after {attempts} attempt(s)")]
    Exhausted {
        /// How many times the operation ran.
        attempts: u32,
        /// The error from the last attempt.
        source: E,
    },
    /// The cancellation signal was observed between attempts.
    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// How many times the operation ran before cancellation.
        attempts: u32,
    },
}

impl<E> RetryError<E> {
    /// How many times the operation actually ran.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::InvalidPolicy => 0,
            Self::Exhausted { attempts, .. } | Self::Cancelled { attempts } => *attempts,
        }
    }

    /// The last attempt's error, if one was captured.
    #[must_use]
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::Exhausted { source, .. } => Some(source),
            Self::InvalidPolicy | Self::Cancelled { .. } => None,
        }
    }
}
