//! Retry policy for DNS lookups.
//!
//! # Responsibilities
//! - Decide whether an unresolved domain gets another attempt
//! - Space attempts with exponential backoff and equal jitter
//!
//! # Design Decisions
//! - Only UNRESOLVED outcomes are retried; a resolved domain is final
//! - The prober itself never retries; the scheduler owns this policy
//! - Default is no retries, matching a single query per rule per round
//! - Half of each delay is random: retries for a batch of dead domains are
//!   spread across the whole window instead of hitting the resolver together

use std::time::Duration;

use rand::Rng;

use crate::config::ProbeConfig;
use crate::probe::ProbeOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first lookup.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            max_retries: config.retry_attempts,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }

    /// `retries_done` counts retries already made for this domain.
    pub fn should_retry(&self, retries_done: u32, outcome: ProbeOutcome) -> bool {
        outcome == ProbeOutcome::Unresolved && retries_done < self.max_retries
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`
    /// capped at `max`, of which the upper half is drawn at random.
    pub fn delay(&self, retry: u32) -> Duration {
        let ceiling = self.ceiling_ms(retry);
        if ceiling == 0 {
            return Duration::ZERO;
        }
        let floor = ceiling / 2;
        Duration::from_millis(rand::thread_rng().gen_range(floor..=ceiling))
    }

    fn ceiling_ms(&self, retry: u32) -> u64 {
        if retry == 0 {
            return 0;
        }
        let factor = 1u64.checked_shl(retry - 1).unwrap_or(u64::MAX);
        self.base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
