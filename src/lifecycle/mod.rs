//! Rule lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! store.rs load()            → Records snapshot
//! machine.rs plan()          → rules to probe / rules skipped
//!     (probe subsystem runs)
//! machine.rs advance()       → next records, retained set, evictions
//! store.rs merge()           → compare-and-set write back
//! ```
//!
//! # Design Decisions
//! - One explicit record schema; state is derived from the counters
//! - Eviction only happens on a round where the rule was actually probed
//! - The store is the only component that touches persisted records

pub mod machine;
pub mod record;
pub mod store;

pub use machine::{LifecycleMachine, ProbePlan, RoundOutcome, TransitionTally};
pub use record::{LifecycleRecord, Records, RuleState};
pub use store::{LifecycleStore, MergeReport, StoreDelta, StoreError};
