//! Configuration file loading and validation.
//!
//! The bar is described by a TOML file layered with `BARLINE_*` environment
//! overrides (nested keys use `__`, e.g. `BARLINE_THEME__GOOD`).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use barline_sdk::{Outcome, Predicate, RuleError, Severity, Template};
use barline_types::ProviderKind;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "BARLINE";

/// Separator placed between segments by the text renderer.
pub const DEFAULT_SEPARATOR: &str = " | ";

/// Problems found while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("no configuration file given and no config directory could be determined")]
    NoConfigDir,

    #[error("slot names must not be empty")]
    EmptyName,

    #[error("duplicate slot '{0}'")]
    DuplicateSlot(String),

    #[error("slot '{0}' needs interval_ms")]
    MissingInterval(String),

    #[error("slot '{0}': interval_ms must be greater than zero")]
    ZeroInterval(String),

    #[error("slot '{slot}': {kind} cannot push updates")]
    PushNotSupported { slot: String, kind: ProviderKind },

    #[error("slot '{slot}': {reason}")]
    Invalid { slot: String, reason: String },

    #[error("slot '{slot}': {source}")]
    Rule {
        slot: String,
        #[source]
        source: RuleError,
    },

    #[error("theme color '{0}' is not a #RRGGBB hex value")]
    Color(String),
}

/// The whole bar.
#[derive(Debug, Clone, Deserialize)]
pub struct BarConfig {
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Default poll timeout for every slot that does not set its own.
    pub timeout_ms: Option<u64>,

    /// Consecutive failures after which a slot's errors are logged as warnings.
    pub stale_after: Option<u32>,

    /// Delay before a push provider that ended is started again.
    pub push_restart_delay_ms: Option<u64>,

    #[serde(default)]
    pub theme: ThemeConfig,

    #[serde(default)]
    pub slots: Vec<SlotConfig>,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

/// Severity colors as `#RRGGBB`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub good: String,
    pub degraded: String,
    pub bad: String,
    /// Color of neutral segments; the terminal default when unset.
    pub neutral: Option<String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            good: "#9FCA56".to_string(),
            degraded: "#E6CD69".to_string(),
            bad: "#CD3F45".to_string(),
            neutral: None,
        }
    }
}

/// One bar entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotConfig {
    pub name: String,

    /// Poll interval; required unless `push` is set.
    pub interval_ms: Option<u64>,

    /// Let the provider report changes itself instead of polling it.
    #[serde(default)]
    pub push: bool,

    pub timeout_ms: Option<u64>,

    pub stale_after: Option<u32>,

    pub provider: ProviderConfig,

    /// Ordered conditions; when empty the provider's preset is used.
    #[serde(default)]
    pub rules: Vec<ConditionConfig>,

    /// Outcome when no condition matches. Defaults to suppression.
    pub fallback: Option<OutcomeConfig>,

    pub notify: Option<NotifyConfig>,
}

/// Provider selection and its options, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProviderConfig {
    DiskUsage {
        #[serde(default = "default_mount")]
        path: PathBuf,
    },
    DiskIo {
        device: String,
    },
    CpuTemperature {
        /// Substring of the sensor label; the hottest sensor when unset.
        sensor: Option<String>,
    },
    LinkState {
        name: Option<String>,
        prefix: Option<String>,
        #[serde(default)]
        wireless: bool,
    },
    NetworkThroughput {
        interface: String,
    },
    Battery {
        /// A single battery such as `BAT0`; all batteries combined when unset.
        name: Option<String>,
    },
    AudioVolume {
        control: Option<String>,
    },
    MemoryUsage,
    LoadAverage,
    Clock {
        format: Option<String>,
    },
    CustomBooleanCheck {
        path: PathBuf,
    },
}

fn default_mount() -> PathBuf {
    PathBuf::from("/")
}

impl ProviderConfig {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderConfig::DiskUsage { .. } => ProviderKind::DiskUsage,
            ProviderConfig::DiskIo { .. } => ProviderKind::DiskIo,
            ProviderConfig::CpuTemperature { .. } => ProviderKind::CpuTemperature,
            ProviderConfig::LinkState { .. } => ProviderKind::LinkState,
            ProviderConfig::NetworkThroughput { .. } => ProviderKind::NetworkThroughput,
            ProviderConfig::Battery { .. } => ProviderKind::Battery,
            ProviderConfig::AudioVolume { .. } => ProviderKind::AudioVolume,
            ProviderConfig::MemoryUsage => ProviderKind::MemoryUsage,
            ProviderConfig::LoadAverage => ProviderKind::LoadAverage,
            ProviderConfig::Clock { .. } => ProviderKind::Clock,
            ProviderConfig::CustomBooleanCheck { .. } => ProviderKind::CustomBooleanCheck,
        }
    }

    /// Only link state can report changes on its own.
    pub fn supports_push(&self) -> bool {
        matches!(self, ProviderConfig::LinkState { .. })
    }
}

/// A `when` predicate and what to show when it matches.
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionConfig {
    pub when: Predicate,
    pub text: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub suppress: bool,
}

/// What to show when no condition matches.
#[derive(Debug, Clone, Deserialize)]
pub struct OutcomeConfig {
    pub text: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub suppress: bool,
}

/// Run a command when the slot enters one of the listed severities.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub on: Vec<Severity>,
    /// Program and arguments.
    pub command: Vec<String>,
}

/// Build an outcome from config fields.
pub(crate) fn outcome(
    text: Option<&str>,
    severity: Severity,
    suppress: bool,
) -> Result<Outcome, String> {
    if suppress || severity == Severity::Suppressed {
        return Ok(Outcome::Suppress);
    }
    let text = text.ok_or("a shown outcome needs text")?;
    let template = Template::parse(text).map_err(|e| format!("template '{}': {}", text, e))?;
    Ok(Outcome::show(template, severity))
}

impl ConditionConfig {
    pub fn outcome(&self) -> Result<Outcome, String> {
        outcome(self.text.as_deref(), self.severity, self.suppress)
    }
}

impl OutcomeConfig {
    pub fn outcome(&self) -> Result<Outcome, String> {
        outcome(self.text.as_deref(), self.severity, self.suppress)
    }
}

impl BarConfig {
    /// Load from a TOML file plus environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .add_source(env_source())
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse TOML text, without environment overrides.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// `$XDG_CONFIG_HOME/barline/config.toml` or the platform equivalent.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        directories::ProjectDirs::from("", "", "barline")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn push_restart_delay(&self) -> Option<Duration> {
        self.push_restart_delay_ms.map(Duration::from_millis)
    }

    /// Check everything that can be checked without touching the system.
    ///
    /// Rules are checked against their provider kind when the scheduler is
    /// built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::theme::Palette::from_config(&self.theme)?;

        let mut seen = HashSet::new();
        for slot in &self.slots {
            if slot.name.trim().is_empty() {
                return Err(ConfigError::EmptyName);
            }
            if !seen.insert(slot.name.as_str()) {
                return Err(ConfigError::DuplicateSlot(slot.name.clone()));
            }
            slot.validate()?;
        }
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl SlotConfig {
    fn invalid(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::Invalid {
            slot: self.name.clone(),
            reason: reason.into(),
        }
    }

    /// Poll interval, if this slot is polled.
    pub fn interval(&self) -> Option<Duration> {
        self.interval_ms.map(Duration::from_millis)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.push {
            if !self.provider.supports_push() {
                return Err(ConfigError::PushNotSupported {
                    slot: self.name.clone(),
                    kind: self.provider.kind(),
                });
            }
        } else {
            match self.interval_ms {
                None => return Err(ConfigError::MissingInterval(self.name.clone())),
                Some(0) => return Err(ConfigError::ZeroInterval(self.name.clone())),
                Some(_) => {}
            }
        }

        if self.timeout_ms == Some(0) {
            return Err(self.invalid("timeout_ms must be greater than zero"));
        }

        if let ProviderConfig::LinkState {
            name,
            prefix,
            wireless,
        } = &self.provider
        {
            let chosen = [name.is_some(), prefix.is_some(), *wireless]
                .into_iter()
                .filter(|set| *set)
                .count();
            if chosen != 1 {
                return Err(self.invalid("link-state needs exactly one of name, prefix or wireless"));
            }
        }

        for condition in &self.rules {
            condition.outcome().map_err(|reason| self.invalid(reason))?;
        }
        if let Some(fallback) = &self.fallback {
            fallback.outcome().map_err(|reason| self.invalid(reason))?;
        }

        if let Some(notify) = &self.notify {
            if notify.command.is_empty() {
                return Err(self.invalid("notify.command must name a program"));
            }
        }
        Ok(())
    }
}
