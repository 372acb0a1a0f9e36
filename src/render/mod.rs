//! Snapshot renderers for stdout.
//!
//! - [`TextSink`]: one colored line per snapshot
//! - [`JsonSink`]: one JSON snapshot per line
//!
//! The interactive preview lives in [`crate::app`] and [`crate::ui`]; it
//! follows the aggregator directly instead of acting as a sink.

mod json;
mod text;

pub use json::JsonSink;
pub use text::{render_line, TextSink};
