//! Pure domain types for Tether.
//!
//! This crate contains types shared by the retry and dispatch crates, with
//! no IO, no async, and no dependencies. Everything here can be used from
//! any layer of a consuming application.

mod backoff;
mod defaults;

pub use backoff::Backoff;
pub use defaults::RetryDefaults;
