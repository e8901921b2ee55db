//! Blocklist rule curator library.
//!
//! Re-validates AdGuard/DNS blocking rules shard by shard and retires rules
//! whose domains persistently fail to resolve.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod persist;
pub mod probe;
pub mod resilience;
pub mod round;
pub mod rules;
pub mod shutdown;

pub use config::schema::CuratorConfig;
pub use error::CuratorError;
pub use round::{run_shard, RoundSummary, ShardJob};
pub use shutdown::Shutdown;
