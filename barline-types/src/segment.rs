//! Segments - the rendered output of one bar slot.

use std::fmt;
use std::str::FromStr;

/// How a segment should be presented.
///
/// Renderers map these onto colors through an injected theme. `Suppressed`
/// is the "show nothing" outcome: the slot stays registered but contributes
/// nothing to a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    /// Everything is fine.
    Good,
    /// Worth a glance.
    Degraded,
    /// Needs attention.
    Bad,
    /// Informational, rendered without a status color.
    #[default]
    Neutral,
    /// Omit the slot from output.
    Suppressed,
}

impl Severity {
    /// All severities, in display order.
    pub const ALL: [Severity; 5] = [
        Severity::Good,
        Severity::Degraded,
        Severity::Bad,
        Severity::Neutral,
        Severity::Suppressed,
    ];

    /// The lowercase name used in configuration files and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Good => "good",
            Severity::Degraded => "degraded",
            Severity::Bad => "bad",
            Severity::Neutral => "neutral",
            Severity::Suppressed => "suppressed",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown severity name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSeverity(pub String);

impl fmt::Display for UnknownSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown severity '{}'", self.0)
    }
}

impl std::error::Error for UnknownSeverity {}

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSeverity(s.to_string()))
    }
}

/// The rendered (text, severity) pair for one slot at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// Identity of the slot that produced this segment.
    pub slot: String,

    /// Display text.
    pub text: String,

    /// Presentation level.
    pub severity: Severity,
}

impl Segment {
    /// Create a visible segment.
    pub fn new(slot: impl Into<String>, text: impl Into<String>, severity: Severity) -> Self {
        Self {
            slot: slot.into(),
            text: text.into(),
            severity,
        }
    }

    /// Create the suppression sentinel for a slot.
    pub fn suppressed(slot: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            text: String::new(),
            severity: Severity::Suppressed,
        }
    }

    /// Whether this segment is omitted from snapshots.
    pub fn is_suppressed(&self) -> bool {
        self.severity == Severity::Suppressed
    }
}
