//! The shared retry loop behind every entry point.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::RetryError;
use crate::policy::RetryPolicy;

impl<E> RetryPolicy<E> {
    /// Run `op` under this policy, blocking the calling thread through
    /// attempts and inter-attempt delays.
    ///
    /// Returns the value of the first successful attempt, or
    /// [`RetryError::Exhausted`] carrying the last error once the attempt
    /// budget is spent or the error is classified as not retriable. The
    /// blocking path has no cancellation signal to poll; delays are plain
    /// sleeps.
    pub fn now<T, F>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.validate()?;
        let mut attempt: u32 = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(source) => {
                    attempt += 1;
                    if attempt >= self.max_attempts || !self.is_retriable(&source) {
                        return Err(RetryError::Exhausted {
                            attempts: attempt,
                            source,
                        });
                    }
                    let delay = self.delay_for(attempt);
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after failed attempt"
                    );
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
            }
        }
    }

    /// Package `op` and a frozen copy of this policy into a closure that
    /// performs the same loop as [`now`](Self::now) when later invoked.
    ///
    /// Pure deferral: no attempt runs, and no delay elapses, until the
    /// returned closure is called.
    #[must_use]
    pub fn later<T, F>(&self, op: F) -> impl FnOnce() -> Result<T, RetryError<E>> + use<E, T, F>
    where
        F: FnMut() -> Result<T, E>,
    {
        let policy = self.clone();
        move || policy.now(op)
    }

    /// Run `op` under this policy, suspending the caller through attempts
    /// and delays, and polling `cancel` cooperatively.
    ///
    /// The token is checked before each attempt starts and interrupts the
    /// inter-attempt delay; it never preempts an attempt already running.
    /// Cancellation surfaces as [`RetryError::Cancelled`] with the number
    /// of attempts that ran.
    pub async fn now_async<T, F, Fut>(
        &self,
        mut op: F,
        cancel: &CancellationToken,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.validate()?;
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled { attempts: attempt });
            }
            match op().await {
                Ok(value) => return Ok(value),
                Err(source) => {
                    attempt += 1;
                    if attempt >= self.max_attempts || !self.is_retriable(&source) {
                        return Err(RetryError::Exhausted {
                            attempts: attempt,
                            source,
                        });
                    }
                    let delay = self.delay_for(attempt);
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after failed attempt"
                    );
                    tokio::select! {
                        () = cancel.cancelled() => {
                            return Err(RetryError::Cancelled { attempts: attempt });
                        }
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    fn validate(&self) -> Result<(), RetryError<E>> {
        if self.max_attempts == 0 {
            return Err(RetryError::InvalidPolicy);
        }
        Ok(())
    }
}
