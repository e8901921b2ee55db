//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CuratorConfig (validated, immutable for the run)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - No config file means defaults; a batch run never reloads

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::CuratorConfig;
pub use schema::{
    FailurePolicy, LifecycleConfig, LogFormat, ObservabilityConfig, OutageConfig, ProbeConfig,
    ResolverConfig, ResolverStrategy, ShardConfig, StoreConfig, StoreLayout,
};
