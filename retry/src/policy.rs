//! Retry policy: attempt budget, delay schedule, and error classification.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tether_types::{Backoff, RetryDefaults};

/// Classifies whether an error is worth another attempt.
pub type RetriablePredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// The rules governing one retried call.
///
/// A policy is immutable once a call begins: entry points clone it into the
/// call, so mutating the original afterwards never affects a loop already
/// running. Construction happens through [`Default`], [`builder`],
/// [`configured`] (build a default, let a callback mutate it, freeze), or
/// [`from_defaults`].
///
/// [`builder`]: RetryPolicy::builder
/// [`configured`]: RetryPolicy::configured
/// [`from_defaults`]: RetryPolicy::from_defaults
pub struct RetryPolicy<E> {
    /// Total attempt budget, counting the first try. Must be at least 1;
    /// a zero budget fails the call with `RetryError::InvalidPolicy`.
    pub max_attempts: u32,
    /// Delay schedule between attempts.
    pub backoff: Backoff,
    /// Down-jitter factor in `[0.0, 1.0]`; values outside are clamped.
    pub jitter_factor: f64,
    /// Which errors qualify for retry. `None` retries every error.
    pub retry_if: Option<RetriablePredicate<E>>,
}

impl<E> RetryPolicy<E> {
    /// A policy seeded from an injected defaults bundle.
    #[must_use]
    pub fn from_defaults(defaults: &RetryDefaults) -> Self {
        Self {
            max_attempts: defaults.max_attempts,
            backoff: Backoff::Exponential {
                initial: defaults.initial_delay,
                max: defaults.max_delay,
            },
            jitter_factor: defaults.jitter_factor,
            retry_if: None,
        }
    }

    #[must_use]
    pub fn builder() -> RetryPolicyBuilder<E> {
        RetryPolicyBuilder {
            policy: Self::default(),
        }
    }

    /// Build a default policy, hand it to `configure` for mutation, and
    /// freeze the result. Mutation is only possible here, before the policy
    /// is attached to a call.
    #[must_use]
    pub fn configured(configure: impl FnOnce(&mut Self)) -> Self {
        let mut policy = Self::default();
        configure(&mut policy);
        policy
    }

    /// Whether `error` qualifies for another attempt under this policy.
    #[must_use]
    pub fn is_retriable(&self, error: &E) -> bool {
        self.retry_if.as_ref().map_or(true, |pred| pred(error))
    }

    /// The jittered delay before retry number `attempt` (1-based).
    ///
    /// Down-jitter multiplies the schedule's raw delay by a random factor
    /// in `[1 - jitter_factor, 1.0]`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let raw = self.backoff.delay(attempt);
        let jitter = self.jitter_factor.clamp(0.0, 1.0);
        if raw.is_zero() || jitter <= 0.0 {
            return raw;
        }
        let factor = 1.0 - rand::random::<f64>() * jitter;
        raw.mul_f64(factor)
    }
}

impl<E> Default for RetryPolicy<E> {
    fn default() -> Self {
        Self::from_defaults(&RetryDefaults::default())
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            jitter_factor: self.jitter_factor,
            retry_if: self.retry_if.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("jitter_factor", &self.jitter_factor)
            .field("retry_if", &self.retry_if.is_some())
            .finish()
    }
}

/// Fluent construction for [`RetryPolicy`].
pub struct RetryPolicyBuilder<E> {
    policy: RetryPolicy<E>,
}

impl<E> RetryPolicyBuilder<E> {
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.policy.backoff = backoff;
        self
    }

    #[must_use]
    pub fn jitter_factor(mut self, jitter_factor: f64) -> Self {
        self.policy.jitter_factor = jitter_factor;
        self
    }

    #[must_use]
    pub fn retry_if(mut self, pred: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.policy.retry_if = Some(Arc::new(pred));
        self
    }

    #[must_use]
    pub fn build(self) -> RetryPolicy<E> {
        self.policy
    }
}

impl<E> Default for RetryPolicyBuilder<E> {
    fn default() -> Self {
        RetryPolicy::builder()
    }
}
