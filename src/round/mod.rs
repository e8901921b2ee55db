//! Shard round orchestration.
//!
//! # Data Flow
//! ```text
//! job.rs ShardJob            → input / previous / output paths
//! runner.rs run_shard()
//!     → rules::source        (shard ∪ previously retained = candidates)
//!     → lifecycle::store     (snapshot)
//!     → lifecycle::machine   (plan)
//!     → probe::scheduler     (outcome map)
//!     → outage.rs            (abort before any write if the resolver is down)
//!     → lifecycle::machine   (advance)
//!     → lifecycle::store     (merge delta)
//!     → rules::writer        (retained set)
//!     → summary.rs           (report + COMMIT_STATS line)
//! ```

pub mod job;
pub mod outage;
pub mod runner;
pub mod summary;

pub use job::ShardJob;
pub use outage::OutageGuard;
pub use runner::run_shard;
pub use summary::RoundSummary;
