//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Lookup classified UNRESOLVED:
//!     → retries.rs should_retry (retry budget left for this domain?)
//!     → retries.rs delay (jittered exponential wait before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every lookup has a deadline (see probe)
//! - Jittered backoff keeps retries from arriving at the resolver in bursts

pub mod retries;

pub use retries::RetryPolicy;
