//! Per-rule lifecycle record.
//!
//! # States
//! - Active: rule is probed every round
//! - Skipped: rule is excluded from probing, skip rounds accumulate
//! - Evicted: no record exists (tombstone by absence)
//!
//! # State Transitions
//! ```text
//! Active  → Active:  resolved (failures reset) or failed below delete threshold
//! Active  → Evicted: failed and failures reached delete threshold
//! Active  → Skipped: failures climbed above skip threshold
//! Skipped → Active:  skip rounds reached limit (failures = recovery baseline,
//!                    force_probe set for the next round)
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::LifecycleConfig;
use crate::rules::Rule;

/// Records keyed by rule.
pub type Records = BTreeMap<Rule, LifecycleRecord>;

/// Derived lifecycle state of a rule that still has a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    Active,
    Skipped,
}

/// Persisted counters governing retain/skip/evict decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleRecord {
    /// Consecutive probe failures since the last success.
    pub failures: u32,

    /// Consecutive rounds the rule has been excluded from probing.
    pub skip_rounds: u32,

    /// Probe next round regardless of `failures`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force_probe: bool,

    /// Unix seconds of the last round that evaluated this rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<u64>,
}

impl LifecycleRecord {
    /// Record of a rule that just resolved.
    pub fn healthy(now: u64) -> Self {
        Self {
            last_seen: Some(now),
            ..Self::default()
        }
    }

    pub fn state(&self, policy: &LifecycleConfig) -> RuleState {
        if self.failures > policy.skip_threshold && !self.force_probe {
            RuleState::Skipped
        } else {
            RuleState::Active
        }
    }

    pub fn is_skipped(&self, policy: &LifecycleConfig) -> bool {
        self.state(policy) == RuleState::Skipped
    }
}

/// Accepted on-disk shapes of a record.
///
/// Older counter files stored a bare failure count per rule.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum StoredRecord {
    Counter(u32),
    Record(LifecycleRecord),
}

impl From<StoredRecord> for LifecycleRecord {
    fn from(stored: StoredRecord) -> Self {
        match stored {
            StoredRecord::Counter(failures) => LifecycleRecord {
                failures,
                ..LifecycleRecord::default()
            },
            StoredRecord::Record(record) => record,
        }
    }
}
