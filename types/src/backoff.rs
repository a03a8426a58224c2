//! Inter-attempt delay schedules.

use std::time::Duration;

/// How long to wait between one failed attempt and the next.
///
/// Delays are computed from a 1-based attempt index: `delay(1)` is the wait
/// after the first failure. Growing schedules are capped at their `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// No waiting between attempts.
    None,
    /// The same delay before every retry.
    Constant(Duration),
    /// `initial * attempt`, capped at `max`.
    Linear {
        /// Delay before the first retry.
        initial: Duration,
        /// Delay ceiling.
        max: Duration,
    },
    /// `initial * 2^(attempt - 1)`, capped at `max`.
    Exponential {
        /// Delay before the first retry.
        initial: Duration,
        /// Delay ceiling.
        max: Duration,
    },
}

impl Backoff {
    /// The raw (unjittered) delay before retry number `attempt`.
    ///
    /// `attempt` is 1-based; an index of 0 is treated as 1 so a schedule
    /// never produces a shorter delay than its own first step.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match *self {
            Self::None => Duration::ZERO,
            Self::Constant(delay) => delay,
            Self::Linear { initial, max } => initial.saturating_mul(attempt).min(max),
            Self::Exponential { initial, max } => {
                // Computed in float space so a large attempt index saturates
                // at the cap instead of overflowing.
                let exponent = (attempt - 1).min(63) as i32;
                let raw = initial.as_secs_f64() * 2.0_f64.powi(exponent);
                Duration::from_secs_f64(raw.min(max.as_secs_f64()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_always_zero() {
        assert_eq!(Backoff::None.delay(1), Duration::ZERO);
        assert_eq!(Backoff::None.delay(100), Duration::ZERO);
    }

    #[test]
    fn constant_ignores_attempt_index() {
        let backoff = Backoff::Constant(Duration::from_millis(250));
        assert_eq!(backoff.delay(1), Duration::from_millis(250));
        assert_eq!(backoff.delay(7), Duration::from_millis(250));
    }

    #[test]
    fn linear_grows_and_caps() {
        let backoff = Backoff::Linear {
            initial: Duration::from_millis(100),
            max: Duration::from_millis(350),
        };
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(300));
        assert_eq!(backoff.delay(4), Duration::from_millis(350));
    }

    #[test]
    fn exponential_doubles_and_caps() {
        let backoff = Backoff::Exponential {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(8),
        };
        assert_eq!(backoff.delay(1), Duration::from_millis(500));
        assert_eq!(backoff.delay(2), Duration::from_millis(1000));
        assert_eq!(backoff.delay(3), Duration::from_millis(2000));
        assert_eq!(backoff.delay(5), Duration::from_secs(8));
        // Far past the cap: stays at the cap, no overflow.
        assert_eq!(backoff.delay(200), Duration::from_secs(8));
    }

    #[test]
    fn attempt_zero_is_treated_as_one() {
        let backoff = Backoff::Exponential {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(8),
        };
        assert_eq!(backoff.delay(0), backoff.delay(1));
    }
}
