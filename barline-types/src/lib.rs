//! # barline-types
//!
//! Core types shared by every barline crate: the rendered [`Segment`] for a
//! bar slot, the ordered [`Snapshot`] handed to renderers, and the
//! [`RawValue`] readings produced by providers.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: the types are plain data
//! - **Optional serialization**: enable the `serde` feature for JSON output
//! - **Closed set of readings**: every provider kind has one `RawValue`
//!   variant with named fields that rules can reference
//!
//! ## Example
//!
//! ```rust
//! use barline_types::{Segment, Severity, Snapshot};
//!
//! let snapshot = Snapshot::builder()
//!     .sequence(7)
//!     .segment(Segment::new("disk", "D: 80B/100B", Severity::Degraded))
//!     .segment(Segment::suppressed("battery"))
//!     .segment(Segment::new("clock", "2024-01-02 15:04", Severity::Neutral))
//!     .build();
//!
//! // Suppressed segments never make it into a snapshot
//! assert_eq!(snapshot.len(), 2);
//! assert_eq!(snapshot.text(" | "), "D: 80B/100B | 2024-01-02 15:04");
//! ```
//!
//! ## Schema Version
//!
//! The current schema version is **1**. It is embedded in every snapshot so
//! that consumers of the JSON output can detect format changes.

mod format;
mod segment;
mod snapshot;
mod value;
mod version;

pub use format::*;
pub use segment::*;
pub use snapshot::*;
pub use value::*;
pub use version::*;

/// Current schema version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const SCHEMA_VERSION: u32 = 1;
