//! Snapshot - the ordered set of visible segments at one point in time.

use crate::{SchemaVersion, Segment};

/// An immutable, ordered view of every visible bar segment.
///
/// Snapshots are produced by the aggregator each time any slot changes.
/// `sequence` strictly increases across snapshots emitted by one aggregator,
/// so a consumer can tell which of two snapshots is newer regardless of
/// which slot caused them.
///
/// # Example
///
/// ```rust
/// use barline_types::{Segment, Severity, Snapshot};
///
/// let snapshot = Snapshot::builder()
///     .sequence(1)
///     .segment(Segment::new("load", "C: 0.42", Severity::Good))
///     .build();
///
/// assert_eq!(snapshot.get("load").unwrap().text, "C: 0.42");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Schema version for forward compatibility.
    pub version: SchemaVersion,

    /// Position of this snapshot in the emission order.
    pub sequence: u64,

    /// Unix timestamp in milliseconds when this snapshot was built.
    pub timestamp_ms: u64,

    /// Visible segments in declared slot order.
    pub segments: Vec<Segment>,
}

impl Snapshot {
    /// An empty snapshot with sequence 0, emitted before any slot reports.
    pub fn empty() -> Self {
        Self {
            version: SchemaVersion::current(),
            sequence: 0,
            timestamp_ms: current_timestamp_ms(),
            segments: Vec::new(),
        }
    }

    /// Create a builder for constructing snapshots.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    /// Check if no segment is visible.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of visible segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Get the visible segment for a slot.
    pub fn get(&self, slot: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.slot == slot)
    }

    /// Iterate over visible segments in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Join the visible segment texts with a separator.
    pub fn text(&self, separator: &str) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builder for constructing `Snapshot` instances.
///
/// Suppressed segments passed to [`SnapshotBuilder::segment`] are dropped,
/// which keeps the "suppressed never appears" rule in one place.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    sequence: u64,
    timestamp_ms: Option<u64>,
    segments: Vec<Segment>,
}

impl SnapshotBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sequence number.
    pub fn sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Set a specific timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: u64) -> Self {
        self.timestamp_ms = Some(ts);
        self
    }

    /// Append a segment unless it is suppressed.
    pub fn segment(mut self, segment: Segment) -> Self {
        if !segment.is_suppressed() {
            self.segments.push(segment);
        }
        self
    }

    /// Append every segment from an iterator, skipping suppressed ones.
    pub fn segments<I>(self, segments: I) -> Self
    where
        I: IntoIterator<Item = Segment>,
    {
        segments.into_iter().fold(self, |b, s| b.segment(s))
    }

    /// Build the snapshot.
    pub fn build(self) -> Snapshot {
        Snapshot {
            version: SchemaVersion::current(),
            sequence: self.sequence,
            timestamp_ms: self.timestamp_ms.unwrap_or_else(current_timestamp_ms),
            segments: self.segments,
        }
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
