//! Small helpers for reading kernel attribute files.

use std::path::Path;

use crate::AdapterError;

/// Read a file and trim surrounding whitespace.
pub(crate) async fn read_trimmed(path: &Path) -> Result<String, AdapterError> {
    tokio::fs::read_to_string(path)
        .await
        .map(|s| s.trim().to_string())
        .map_err(|e| AdapterError::io(path, e))
}

/// Read a file holding a single unsigned integer.
pub(crate) async fn read_u64(path: &Path) -> Result<u64, AdapterError> {
    let text = read_trimmed(path).await?;
    text.parse()
        .map_err(|_| AdapterError::parse(path.display().to_string(), format!("not a number: '{}'", text)))
}
