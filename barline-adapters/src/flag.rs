//! Boolean flags read from a file, e.g. `/proc/sys/kernel/deny_new_usb`.

use std::path::PathBuf;

use async_trait::async_trait;
use barline_sdk::{Provider, ProviderError};
use barline_types::{ProviderKind, RawValue};

use crate::fs::read_trimmed;

/// Reads the first line of a file as a boolean.
///
/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`. A file that
/// cannot be read or parsed reads as `false`, so this provider never fails.
#[derive(Debug, Clone)]
pub struct FileFlagProvider {
    path: PathBuf,
}

impl FileFlagProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> bool {
        match read_trimmed(&self.path).await {
            Ok(text) => {
                let first = text.lines().next().unwrap_or_default();
                parse_bool(first).unwrap_or_else(|| {
                    tracing::debug!(path = %self.path.display(), value = first, "flag is not a bool");
                    false
                })
            }
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "flag unreadable");
                false
            }
        }
    }
}

/// Parse the boolean spellings accepted in flag files.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[async_trait]
impl Provider for FileFlagProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CustomBooleanCheck
    }

    async fn poll(&self) -> Result<RawValue, ProviderError> {
        Ok(RawValue::Flag {
            path: self.path.display().to_string(),
            value: self.read().await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn flag_with(contents: &str) -> bool {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deny_new_usb");
        std::fs::write(&path, contents).unwrap();
        match FileFlagProvider::new(&path).poll().await.unwrap() {
            RawValue::Flag { value, .. } => value,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn reads_proc_style_values() {
        assert!(flag_with("1\n").await);
        assert!(!flag_with("0\n").await);
        assert!(flag_with("true").await);
    }

    #[tokio::test]
    async fn only_first_line_counts() {
        assert!(flag_with("1\n0\n").await);
    }

    #[tokio::test]
    async fn garbage_reads_false() {
        assert!(!flag_with("yes").await);
        assert!(!flag_with("").await);
    }

    #[tokio::test]
    async fn missing_file_reads_false() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileFlagProvider::new(dir.path().join("absent"));
        assert_eq!(
            provider.poll().await.unwrap(),
            RawValue::Flag {
                path: dir.path().join("absent").display().to_string(),
                value: false,
            }
        );
    }

    #[test]
    fn bool_spellings() {
        for s in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(s), Some(true), "{}", s);
        }
        for s in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(s), Some(false), "{}", s);
        }
        assert_eq!(parse_bool("tRuE"), None);
    }
}
