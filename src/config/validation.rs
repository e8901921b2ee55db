//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, bounded durations, ratios within [0, 1])
//! - Check resolver servers are present for the custom strategy
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CuratorConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::config::schema::{CuratorConfig, ResolverStrategy};

const MAX_BATCH_DEADLINE_SECS: u64 = 7 * 24 * 60 * 60;
const MAX_RETENTION_DAYS: u64 = 36_500;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &CuratorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.probe.timeout_ms == 0 {
        errors.push(ValidationError::new("probe.timeout_ms", "must be greater than 0"));
    }
    if config.probe.concurrency == 0 {
        errors.push(ValidationError::new("probe.concurrency", "must be greater than 0"));
    }
    if config.probe.progress_interval == 0 {
        errors.push(ValidationError::new(
            "probe.progress_interval",
            "must be greater than 0",
        ));
    }
    if config.probe.batch_deadline_secs > MAX_BATCH_DEADLINE_SECS {
        errors.push(ValidationError::new(
            "probe.batch_deadline_secs",
            format!("must not exceed {MAX_BATCH_DEADLINE_SECS} (one week)"),
        ));
    }
    if config.probe.retry_base_delay_ms > config.probe.retry_max_delay_ms {
        errors.push(ValidationError::new(
            "probe.retry_base_delay_ms",
            "must not exceed probe.retry_max_delay_ms",
        ));
    }

    if config.resolver.strategy == ResolverStrategy::Custom && config.resolver.servers.is_empty() {
        errors.push(ValidationError::new(
            "resolver.servers",
            "custom strategy requires at least one server",
        ));
    }

    let lifecycle = &config.lifecycle;
    if lifecycle.delete_threshold == 0 {
        errors.push(ValidationError::new(
            "lifecycle.delete_threshold",
            "must be greater than 0",
        ));
    }
    if lifecycle.skip_rounds_limit == 0 {
        errors.push(ValidationError::new(
            "lifecycle.skip_rounds_limit",
            "must be greater than 0",
        ));
    }

    if config.store.path.trim().is_empty() {
        errors.push(ValidationError::new("store.path", "must not be empty"));
    }

    if config.store.retention_days > MAX_RETENTION_DAYS {
        errors.push(ValidationError::new(
            "store.retention_days",
            format!("must not exceed {MAX_RETENTION_DAYS}"),
        ));
    }

    let ratio = config.outage.min_success_ratio;
    if !(0.0..=1.0).contains(&ratio) {
        errors.push(ValidationError::new(
            "outage.min_success_ratio",
            "must be within [0, 1]",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
