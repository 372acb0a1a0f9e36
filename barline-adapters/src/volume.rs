//! Audio volume through `amixer`.

use async_trait::async_trait;
use barline_sdk::{Provider, ProviderError};
use barline_types::{ProviderKind, RawValue, Volume};

use crate::command;
use crate::AdapterError;

/// The mixer control read when none is configured.
pub const DEFAULT_CONTROL: &str = "Master";

/// Reads the volume of one mixer control.
#[derive(Debug, Clone)]
pub struct VolumeProvider {
    control: String,
}

impl VolumeProvider {
    pub fn new(control: impl Into<String>) -> Self {
        Self {
            control: control.into(),
        }
    }
}

impl Default for VolumeProvider {
    fn default() -> Self {
        Self::new(DEFAULT_CONTROL)
    }
}

/// Parse `amixer get` output.
///
/// Takes the first channel that reports a percentage. Controls without a
/// switch are never muted.
pub fn parse_amixer(output: &str) -> Result<Volume, AdapterError> {
    for line in output.lines() {
        let Some(pct) = bracketed(line).find_map(|b| b.strip_suffix('%')?.parse::<u8>().ok()) else {
            continue;
        };
        let muted = bracketed(line).any(|b| b == "off");
        return Ok(Volume {
            pct: pct.min(100),
            muted,
        });
    }
    Err(AdapterError::parse("amixer output", "no volume percentage"))
}

fn bracketed(line: &str) -> impl Iterator<Item = &str> {
    line.split('[')
        .skip(1)
        .filter_map(|part| part.split_once(']').map(|(inner, _)| inner))
}

#[async_trait]
impl Provider for VolumeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::AudioVolume
    }

    async fn poll(&self) -> Result<RawValue, ProviderError> {
        let out = command::output("amixer", &["get", &self.control]).await?;
        Ok(RawValue::Volume(parse_amixer(&out)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "\
Simple mixer control 'Master',0
  Capabilities: pvolume pswitch pswitch-joined
  Playback channels: Front Left - Front Right
  Limits: Playback 0 - 65536
  Mono:
  Front Left: Playback 45875 [70%] [on]
  Front Right: Playback 45875 [70%] [on]
";

    #[test]
    fn parses_playback_level() {
        assert_eq!(parse_amixer(MASTER).unwrap(), Volume { pct: 70, muted: false });
    }

    #[test]
    fn detects_mute() {
        let out = "  Mono: Playback 31 [100%] [0.00dB] [off]\n";
        assert_eq!(parse_amixer(out).unwrap(), Volume { pct: 100, muted: true });
    }

    #[test]
    fn no_percentage_is_an_error() {
        assert!(parse_amixer("Simple mixer control 'Beep',0\n  Mono: [on]\n").is_err());
    }
}
