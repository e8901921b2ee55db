//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the curator.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for a curation run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CuratorConfig {
    /// Shard input/output locations.
    pub shards: ShardConfig,

    /// Probe scheduling settings.
    pub probe: ProbeConfig,

    /// Upstream resolver settings.
    pub resolver: ResolverConfig,

    /// Lifecycle thresholds.
    pub lifecycle: LifecycleConfig,

    /// Lifecycle store persistence.
    pub store: StoreConfig,

    /// Resolver outage guard.
    pub outage: OutageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Where shard files are read from and written to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShardConfig {
    /// Directory holding `part_NN.txt` shard files.
    pub input_dir: String,

    /// Directory holding `validated_part_NN.txt` retained files.
    pub output_dir: String,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            input_dir: "tmp".to_string(),
            output_dir: "dist".to_string(),
        }
    }
}

/// How a failed lookup is classified.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Only NXDOMAIN counts as unresolved. Timeouts, SERVFAIL, REFUSED and
    /// empty answers count as resolved.
    #[default]
    NxdomainOnly,
    /// Every lookup error counts as unresolved.
    Strict,
}

/// Probe scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Per-lookup timeout in milliseconds.
    pub timeout_ms: u64,

    /// Maximum lookups in flight.
    pub concurrency: usize,

    /// Log progress every N completed lookups.
    pub progress_interval: usize,

    /// Abort outstanding lookups after this many seconds (0 = no deadline).
    pub batch_deadline_secs: u64,

    /// Classification of lookup errors.
    pub failure_policy: FailurePolicy,

    /// Extra attempts for a domain that came back unresolved.
    pub retry_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub retry_max_delay_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            concurrency: 50,
            progress_interval: 500,
            batch_deadline_secs: 0,
            failure_policy: FailurePolicy::default(),
            retry_attempts: 0,
            retry_base_delay_ms: 200,
            retry_max_delay_ms: 2000,
        }
    }
}

/// DNS resolution strategy.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResolverStrategy {
    /// Use the system resolver configuration (`/etc/resolv.conf`).
    #[default]
    System,
    /// Use the nameservers listed in `servers`.
    Custom,
}

/// Upstream resolver configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResolverConfig {
    pub strategy: ResolverStrategy,

    /// Nameserver URLs for the custom strategy, e.g. `udp://8.8.8.8` or
    /// `tcp://1.1.1.1:53`.
    pub servers: Vec<String>,
}

/// Rule lifecycle thresholds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Failures at which a probed rule is evicted.
    pub delete_threshold: u32,

    /// Rules with more failures than this are excluded from probing.
    pub skip_threshold: u32,

    /// Skipped rounds after which a rule is forced back into probing.
    pub skip_rounds_limit: u32,

    /// Failure count assigned when a rule leaves the skip state.
    pub recovery_baseline: u32,

    /// Failure count assumed for a rule with no record before its first
    /// failure is added.
    pub initial_failure_seed: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            delete_threshold: 4,
            skip_threshold: 7,
            skip_rounds_limit: 10,
            recovery_baseline: 6,
            initial_failure_seed: 0,
        }
    }
}

/// On-disk store layout.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StoreLayout {
    /// One file per shard, derived from `path`.
    #[default]
    PerShard,
    /// One file shared by every shard, merged with per-key compare-and-set.
    Shared,
}

/// Lifecycle store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store file path. With the per-shard layout the shard number is
    /// appended to the file stem.
    pub path: String,

    pub layout: StoreLayout,

    /// Drop records not evaluated for this many days (0 = never).
    pub retention_days: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "dist/delete_counter.json".to_string(),
            layout: StoreLayout::default(),
            retention_days: 30,
        }
    }
}

/// Resolver outage guard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutageConfig {
    pub enabled: bool,

    /// Minimum completed lookups before the guard can trip.
    pub min_probes: usize,

    /// Rounds whose resolved ratio falls below this are aborted.
    pub min_success_ratio: f64,
}

impl Default for OutageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_probes: 200,
            min_success_ratio: 0.05,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Write Prometheus text-format metrics here at the end of a run.
    pub metrics_textfile: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_textfile: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: CuratorConfig = toml::from_str(
            r#"
            [probe]
            concurrency = 8
            failure_policy = "strict"

            [store]
            layout = "shared"
            "#,
        )
        .unwrap();

        assert_eq!(config.probe.concurrency, 8);
        assert_eq!(config.probe.failure_policy, FailurePolicy::Strict);
        assert_eq!(config.probe.timeout_ms, 2000);
        assert_eq!(config.store.layout, StoreLayout::Shared);
        assert_eq!(config.lifecycle, LifecycleConfig::default());
    }

    #[test]
    fn test_default_thresholds() {
        let lifecycle = LifecycleConfig::default();
        assert_eq!(lifecycle.delete_threshold, 4);
        assert_eq!(lifecycle.skip_threshold, 7);
        assert_eq!(lifecycle.skip_rounds_limit, 10);
        assert_eq!(lifecycle.recovery_baseline, 6);
        assert_eq!(lifecycle.initial_failure_seed, 0);
    }
}
