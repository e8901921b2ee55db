//! Top-level error type for a curation round.

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::lifecycle::store::StoreError;
use crate::probe::dns::ResolverError;

/// Errors that abort a shard round.
#[derive(Debug, thiserror::Error)]
pub enum CuratorError {
    /// The shard to process does not exist.
    #[error("shard file not found: {}", .0.display())]
    MissingShard(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Resolver(#[from] ResolverError),

    /// Too few lookups succeeded for the round's results to be trusted.
    #[error(
        "resolver outage suspected: {resolved}/{completed} lookups resolved, below floor {floor:.2}; round aborted without changes"
    )]
    ResolverOutage {
        resolved: usize,
        completed: usize,
        floor: f64,
    },
}
