//! Error types for adapters.

use std::io;
use std::path::PathBuf;

use barline_sdk::ProviderError;
use thiserror::Error;

/// Errors that can occur when reading a value from the system.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Reading a file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to parse a file or command output.
    #[error("failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    /// A command ran but reported failure.
    #[error("{program} failed: {reason}")]
    Command { program: String, reason: String },

    /// The device, mount or program does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An earlier read of the same handle has not finished yet.
    #[error("{0} busy: previous read still running")]
    Busy(&'static str),

    /// A blocking read panicked or was cancelled.
    #[error("background read failed: {0}")]
    Task(String),
}

impl AdapterError {
    /// Wrap an I/O error, mapping "not found" to [`AdapterError::NotFound`].
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            AdapterError::NotFound(path.display().to_string())
        } else {
            AdapterError::Io { path, source }
        }
    }

    pub fn parse(what: impl Into<String>, reason: impl Into<String>) -> Self {
        AdapterError::Parse {
            what: what.into(),
            reason: reason.into(),
        }
    }
}

impl From<tokio::task::JoinError> for AdapterError {
    fn from(err: tokio::task::JoinError) -> Self {
        AdapterError::Task(err.to_string())
    }
}

impl From<AdapterError> for ProviderError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::NotFound(_) => ProviderError::Unavailable(err.to_string()),
            _ => ProviderError::Transient(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_become_unavailable() {
        let err = AdapterError::io(
            "/sys/block/dm-9/stat",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, AdapterError::NotFound(_)));
        assert!(matches!(
            ProviderError::from(err),
            ProviderError::Unavailable(_)
        ));
    }

    #[test]
    fn other_failures_are_transient() {
        let err = AdapterError::io(
            "/sys/class/power_supply/BAT0/uevent",
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(ProviderError::from(err), ProviderError::Transient(_)));

        let err = AdapterError::parse("amixer output", "no percentage");
        assert!(matches!(ProviderError::from(err), ProviderError::Transient(_)));
    }
}
