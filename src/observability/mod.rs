//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, one span per shard round)
//!     → metrics.rs (probe and lifecycle counters)
//!
//! Consumers:
//!     → stderr (pretty for humans, JSON for CI log collectors)
//!     → Prometheus textfile, written once after the round
//! ```
//!
//! # Design Decisions
//! - Logs go to stderr so stdout carries only the round summary
//! - The job is short-lived, so metrics are rendered to a file rather than
//!   served over HTTP

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
