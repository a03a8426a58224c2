//! Attempt-bounded retry with backoff, jitter, and cooperative cancellation.
//!
//! # Architecture
//!
//! A [`RetryPolicy`] bundles everything that governs a retried call: the
//! attempt budget, a [`Backoff`](tether_types::Backoff) schedule, a jitter
//! factor, and an optional predicate classifying which errors are worth
//! retrying. The policy is the entry object; every entry point shares one
//! strictly sequential loop:
//!
//! | Entry point | Shape |
//! |-------------|-------|
//! | [`RetryPolicy::now`] | Blocking; returns the operation's value or a [`RetryError`] |
//! | [`RetryPolicy::later`] | Returns a closure that runs the same loop when invoked; no work before that |
//! | [`RetryPolicy::now_async`] | Suspends the caller; checks a `CancellationToken` between attempts and during delays |
//!
//! # Cancellation
//!
//! Cancellation is cooperative only: the token gates *starting* the next
//! attempt and interrupts the inter-attempt delay, but a running attempt is
//! never preempted. It surfaces as [`RetryError::Cancelled`], distinct from
//! [`RetryError::Exhausted`], so callers can tell "was asked to stop" from
//! "gave up after retrying".
//!
//! # Independence
//!
//! Calls are fully independent of each other: a policy attached to one call
//! is cloned into it and never mutated afterwards, and attempts within a
//! call never run concurrently.

mod engine;
mod error;
mod policy;

pub use error::RetryError;
pub use policy::{RetriablePredicate, RetryPolicy, RetryPolicyBuilder};
