//! Local wall-clock time.

use async_trait::async_trait;
use barline_sdk::{Provider, ProviderError};
use barline_types::{ProviderKind, RawValue};
use chrono::format::{Item, StrftimeItems};
use chrono::Local;

use crate::AdapterError;

/// Default format, e.g. `2024-01-02 15:04`.
pub const DEFAULT_CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Formats the local time with a strftime string on every poll.
#[derive(Debug, Clone)]
pub struct ClockProvider {
    format: String,
}

impl ClockProvider {
    /// Create a clock, rejecting format strings chrono cannot render.
    pub fn new(format: impl Into<String>) -> Result<Self, AdapterError> {
        let format = format.into();
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(AdapterError::parse("clock format", format));
        }
        Ok(Self { format })
    }

    pub fn format(&self) -> &str {
        &self.format
    }
}

impl Default for ClockProvider {
    fn default() -> Self {
        Self {
            format: DEFAULT_CLOCK_FORMAT.to_string(),
        }
    }
}

#[async_trait]
impl Provider for ClockProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Clock
    }

    async fn poll(&self) -> Result<RawValue, ProviderError> {
        Ok(RawValue::Clock(Local::now().format(&self.format).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_format_shape() {
        let raw = ClockProvider::default().poll().await.unwrap();
        let RawValue::Clock(text) = raw else {
            panic!("expected a clock reading");
        };
        // 2024-01-02 15:04
        assert_eq!(text.len(), 16);
        assert_eq!(&text[4..5], "-");
        assert_eq!(&text[13..14], ":");
    }

    #[test]
    fn rejects_bad_format() {
        assert!(ClockProvider::new("%H:%").is_err());
        assert_eq!(ClockProvider::new("%H:%M").unwrap().format(), "%H:%M");
    }
}
