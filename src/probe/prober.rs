//! Prober abstraction and outcome classification.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::config::FailurePolicy;

/// Result of probing one rule for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeOutcome {
    Resolved,
    Unresolved,
}

impl ProbeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeOutcome::Resolved => "resolved",
            ProbeOutcome::Unresolved => "unresolved",
        }
    }
}

/// Why a lookup did not produce an address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The name does not exist (NXDOMAIN).
    #[error("domain does not exist")]
    NxDomain,

    /// The name exists but has no A records.
    #[error("no A records")]
    NoAnswer,

    /// No answer within the lookup timeout.
    #[error("lookup timed out")]
    Timeout,

    /// SERVFAIL, REFUSED, connection errors and anything else.
    #[error("lookup failed: {0}")]
    Failed(String),
}

/// A single forward (A record) lookup.
///
/// Implementations perform exactly one query per call, bounded by their own
/// timeout, and never retry internally.
#[async_trait]
pub trait Prober: Send + Sync + Debug {
    async fn lookup(&self, domain: &str) -> Result<(), LookupError>;
}

impl FailurePolicy {
    /// Map a raw lookup result onto a probe outcome.
    pub fn classify(&self, result: &Result<(), LookupError>) -> ProbeOutcome {
        match (self, result) {
            (_, Ok(())) => ProbeOutcome::Resolved,
            (_, Err(LookupError::NxDomain)) => ProbeOutcome::Unresolved,
            (FailurePolicy::NxdomainOnly, Err(_)) => ProbeOutcome::Resolved,
            (FailurePolicy::Strict, Err(_)) => ProbeOutcome::Unresolved,
        }
    }
}
