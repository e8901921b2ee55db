//! Rule handling subsystem.
//!
//! # Data Flow
//! ```text
//! part_NN.txt ──┐
//!               ├─ source.rs (parse, drop comments) → candidate rules
//! validated_  ──┘
//! part_NN.txt
//!
//! candidate rule → extractor.rs → domain to probe (or none)
//!
//! retained rules → writer.rs → validated_part_NN.txt
//! ```
//!
//! # Design Decisions
//! - Rules are opaque strings; identity is exact string match
//! - Extraction never fails, it only reports "nothing to probe"

pub mod extractor;
pub mod source;
pub mod writer;

/// A single blocking-list entry, kept verbatim.
pub type Rule = String;

pub use extractor::extract_domain;
