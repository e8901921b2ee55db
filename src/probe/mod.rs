//! Probe subsystem.
//!
//! # Data Flow
//! ```text
//! candidate rules
//!     → scheduler.rs (domain extraction, dedupe, bounded pool, retries)
//!     → prober.rs Prober::lookup (one A query per domain)
//!     → dns.rs DnsProber (hickory-resolver, system or custom servers)
//!     → FailurePolicy::classify → RESOLVED / UNRESOLVED
//! ```
//!
//! # Design Decisions
//! - The prober sits behind a trait so rounds run against scripted fakes in tests
//! - Lookup failures are data, never errors; nothing here aborts a round

pub mod dns;
pub mod prober;
pub mod scheduler;

pub use dns::{DnsProber, ResolverError};
pub use prober::{LookupError, ProbeOutcome, Prober};
pub use scheduler::{ProbeReport, ProbeScheduler};
