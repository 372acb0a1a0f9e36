//! Error types for the scheduling core.

use std::time::Duration;

use barline_types::{FieldKind, ProviderKind};
use thiserror::Error;

use crate::template::TemplateError;

/// Why a provider could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The source is gone for good. The slot is suppressed and stops polling.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// A one-off failure. The previous value stays on screen.
    #[error("transient provider failure: {0}")]
    Transient(String),

    /// The poll did not finish within the slot's timeout.
    #[error("poll timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        ProviderError::Unavailable(reason.into())
    }

    pub fn transient(reason: impl Into<String>) -> Self {
        ProviderError::Transient(reason.into())
    }

    /// Whether the slot should keep retrying after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProviderError::Unavailable(_))
    }
}

/// A rule that cannot be evaluated against its provider kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// Template text does not parse.
    #[error("invalid rule: template '{template}': {source}")]
    Template {
        template: String,
        #[source]
        source: TemplateError,
    },

    /// A predicate or template names a field the kind does not expose.
    #[error("invalid rule: {kind} has no field '{field}'")]
    UnknownField { kind: ProviderKind, field: String },

    /// A comparison literal does not match the field type.
    #[error("invalid rule: field '{field}' is {expected:?}, got {found}")]
    TypeMismatch {
        field: String,
        expected: FieldKind,
        found: String,
    },

    /// Ordering operator used on a field that only supports equality.
    #[error("invalid rule: field '{field}' only supports == and !=")]
    NotOrdered { field: String },
}

/// Failure delivering a snapshot. Always fatal.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink receiver closed")]
    Closed,
}

/// Update addressed to a slot the aggregator does not know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown slot '{0}'")]
pub struct UnknownSlot(pub String);

/// Errors surfaced by the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("duplicate slot '{0}'")]
    DuplicateSlot(String),

    #[error("slot '{slot}': {source}")]
    Rule {
        slot: String,
        #[source]
        source: RuleError,
    },

    #[error(transparent)]
    Sink(#[from] SinkError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_stops_retrying() {
        assert!(!ProviderError::unavailable("gone").is_retryable());
        assert!(ProviderError::transient("eagain").is_retryable());
        assert!(ProviderError::Timeout(Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn rule_errors_name_the_field() {
        let err = RuleError::UnknownField {
            kind: ProviderKind::DiskUsage,
            field: "celsius".into(),
        };
        assert_eq!(err.to_string(), "invalid rule: disk-usage has no field 'celsius'");
    }

    #[test]
    fn scheduler_error_wraps_sink_error() {
        let err: SchedulerError = SinkError::Closed.into();
        assert_eq!(err.to_string(), "sink receiver closed");
    }
}
