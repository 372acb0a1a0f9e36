//! Turning configuration into scheduler slots.

use std::sync::Arc;
use std::time::Duration;

use barline_adapters::{
    BatteryProvider, BatterySelector, ClockProvider, CpuTempProvider, DiskIoProvider,
    DiskUsageProvider, FileFlagProvider, LinkSelector, LinkStateProvider, LoadAverageProvider,
    MemoryProvider, ThroughputProvider, VolumeProvider, DEFAULT_CLOCK_FORMAT,
};
use barline_sdk::{Outcome, Provider, Rule, Scheduler, SchedulerBuilder, SchedulerError, Slot};

use crate::config::{BarConfig, ConfigError, ProviderConfig, SlotConfig};
use crate::hooks::CommandHook;
use crate::presets;

/// The rule for a slot: its configured conditions, or the preset for its
/// provider when it has none.
pub fn build_rule(slot: &SlotConfig) -> Result<Rule, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        slot: slot.name.clone(),
        reason,
    };

    if slot.rules.is_empty() && slot.fallback.is_none() {
        return presets::default_rule(&slot.name, &slot.provider).map_err(|source| {
            ConfigError::Rule {
                slot: slot.name.clone(),
                source,
            }
        });
    }

    let fallback = match &slot.fallback {
        Some(fallback) => fallback.outcome().map_err(invalid)?,
        None => Outcome::Suppress,
    };
    slot.rules.iter().try_fold(Rule::new(fallback), |rule, condition| -> Result<Rule, ConfigError> {
        Ok(rule.when(condition.when.clone(), condition.outcome().map_err(invalid)?))
    })
}

fn link_provider(slot: &SlotConfig) -> Result<LinkStateProvider, ConfigError> {
    let ProviderConfig::LinkState {
        name,
        prefix,
        wireless,
    } = &slot.provider
    else {
        return Err(ConfigError::Invalid {
            slot: slot.name.clone(),
            reason: "not a link-state provider".to_string(),
        });
    };
    let selector = match (name, prefix) {
        (Some(name), _) => LinkSelector::Name(name.clone()),
        (None, Some(prefix)) => LinkSelector::Prefix(prefix.clone()),
        (None, None) if *wireless => LinkSelector::AnyWireless,
        (None, None) => {
            return Err(ConfigError::Invalid {
                slot: slot.name.clone(),
                reason: "link-state needs exactly one of name, prefix or wireless".to_string(),
            })
        }
    };
    Ok(LinkStateProvider::new(selector))
}

/// Create the polled provider for a slot.
pub fn build_provider(slot: &SlotConfig) -> Result<Arc<dyn Provider>, ConfigError> {
    let provider: Arc<dyn Provider> = match &slot.provider {
        ProviderConfig::DiskUsage { path } => Arc::new(DiskUsageProvider::new(path)),
        ProviderConfig::DiskIo { device } => Arc::new(DiskIoProvider::new(device)),
        ProviderConfig::CpuTemperature { sensor } => Arc::new(CpuTempProvider::new(sensor.clone())),
        ProviderConfig::LinkState { .. } => Arc::new(link_provider(slot)?),
        ProviderConfig::NetworkThroughput { interface } => {
            Arc::new(ThroughputProvider::new(interface))
        }
        ProviderConfig::Battery { name } => Arc::new(BatteryProvider::new(match name {
            Some(name) => BatterySelector::Named(name.clone()),
            None => BatterySelector::All,
        })),
        ProviderConfig::AudioVolume { control } => Arc::new(match control {
            Some(control) => VolumeProvider::new(control),
            None => VolumeProvider::default(),
        }),
        ProviderConfig::MemoryUsage => Arc::new(MemoryProvider::new()),
        ProviderConfig::LoadAverage => Arc::new(LoadAverageProvider),
        ProviderConfig::Clock { format } => Arc::new(
            ClockProvider::new(format.as_deref().unwrap_or(DEFAULT_CLOCK_FORMAT)).map_err(|e| {
                ConfigError::Invalid {
                    slot: slot.name.clone(),
                    reason: e.to_string(),
                }
            })?,
        ),
        ProviderConfig::CustomBooleanCheck { path } => Arc::new(FileFlagProvider::new(path)),
    };
    Ok(provider)
}

/// Create a scheduler slot from its configuration.
pub fn build_slot(bar: &BarConfig, slot: &SlotConfig) -> Result<Slot, ConfigError> {
    let mut built = if slot.push {
        if !slot.provider.supports_push() {
            return Err(ConfigError::PushNotSupported {
                slot: slot.name.clone(),
                kind: slot.provider.kind(),
            });
        }
        Slot::pushed(&slot.name, Arc::new(link_provider(slot)?))
    } else {
        let interval = slot
            .interval()
            .ok_or_else(|| ConfigError::MissingInterval(slot.name.clone()))?;
        let mut polled = Slot::polled(&slot.name, build_provider(slot)?, interval);
        let timeout = slot.timeout_ms.map(Duration::from_millis).or(bar.default_timeout());
        if let Some(timeout) = timeout {
            polled = polled.timeout(timeout);
        }
        polled
    };

    built = built.rule(build_rule(slot)?);
    if let Some(failures) = slot.stale_after.or(bar.stale_after) {
        built = built.stale_after(failures);
    }
    if let Some(hook) = slot.notify.as_ref().and_then(CommandHook::from_config) {
        built = built.hook(Arc::new(hook));
    }
    Ok(built)
}

fn from_scheduler_error(err: SchedulerError) -> ConfigError {
    match err {
        SchedulerError::DuplicateSlot(name) => ConfigError::DuplicateSlot(name),
        SchedulerError::Rule { slot, source } => ConfigError::Rule { slot, source },
        SchedulerError::Sink(e) => ConfigError::Invalid {
            slot: String::new(),
            reason: e.to_string(),
        },
    }
}

/// Validate the configuration and register every slot in order.
pub fn build_scheduler(bar: &BarConfig, builder: SchedulerBuilder) -> Result<Scheduler, ConfigError> {
    bar.validate()?;
    let builder = match bar.push_restart_delay() {
        Some(delay) => builder.push_restart_delay(delay),
        None => builder,
    };
    let mut scheduler = builder.build();
    for slot in &bar.slots {
        scheduler
            .register(build_slot(bar, slot)?)
            .map_err(from_scheduler_error)?;
    }
    Ok(scheduler)
}

/// A plain-text table of the configured slots, one per line, as printed by
/// `barline --check`.
pub fn slot_table(bar: &BarConfig) -> String {
    let mut out = format!("{:<16} {:<22} {:<12} {:<8} {}\n", "SLOT", "KIND", "SCHEDULE", "TIMEOUT", "RULES");
    for slot in &bar.slots {
        let schedule = if slot.push {
            "push".to_string()
        } else {
            slot.interval_ms
                .map(|ms| format!("every {}ms", ms))
                .unwrap_or_else(|| "-".to_string())
        };
        let timeout = match (slot.push, slot.timeout_ms.or(bar.timeout_ms)) {
            (true, _) | (false, None) => "-".to_string(),
            (false, Some(ms)) => format!("{}ms", ms),
        };
        let rules = if slot.rules.is_empty() && slot.fallback.is_none() {
            "preset".to_string()
        } else {
            format!("{} custom", slot.rules.len())
        };
        out.push_str(&format!(
            "{:<16} {:<22} {:<12} {:<8} {}\n",
            slot.name,
            slot.provider.kind().to_string(),
            schedule,
            timeout,
            rules
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use barline_sdk::{RawValue, Severity, Source};

    fn config(text: &str) -> BarConfig {
        BarConfig::from_toml(text).unwrap()
    }

    #[test]
    fn builds_slots_in_order() {
        let bar = config(
            r#"
timeout_ms = 2500
stale_after = 3

[[slots]]
name = "usb"
interval_ms = 1000
provider = { kind = "custom-boolean-check", path = "/proc/sys/kernel/deny_new_usb" }

[[slots]]
name = "wifi"
push = true
provider = { kind = "link-state", wireless = true }

[[slots]]
name = "clock"
interval_ms = 60000
timeout_ms = 500
provider = { kind = "clock", format = "%H:%M" }
"#,
        );
        let scheduler = build_scheduler(&bar, Scheduler::builder()).unwrap();
        let names: Vec<_> = scheduler.slots().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["usb", "wifi", "clock"]);

        match scheduler.slots()[0].source() {
            Source::Poll { timeout, interval, .. } => {
                assert_eq!(*interval, Duration::from_secs(1));
                assert_eq!(*timeout, Duration::from_millis(2500));
            }
            other => panic!("expected poll, got {:?}", other),
        }
        assert!(matches!(scheduler.slots()[1].source(), Source::Push(_)));
        match scheduler.slots()[2].source() {
            Source::Poll { timeout, .. } => assert_eq!(*timeout, Duration::from_millis(500)),
            other => panic!("expected poll, got {:?}", other),
        }
    }

    #[test]
    fn custom_rules_replace_the_preset() {
        let bar = config(
            r#"
[[slots]]
name = "load"
interval_ms = 1000
provider = { kind = "load-average" }

[[slots.rules]]
when = { field = "load1", op = ">", value = 8 }
text = "LOAD {load1:.1}"
severity = "bad"

[slots.fallback]
suppress = true
"#,
        );
        let rule = build_rule(&bar.slots[0]).unwrap();
        let busy = RawValue::Load(barline_types::LoadAverage {
            one: 9.3,
            five: 0.0,
            fifteen: 0.0,
        });
        let seg = rule.evaluate("load", &busy);
        assert_eq!((seg.text.as_str(), seg.severity), ("LOAD 9.3", Severity::Bad));

        let idle = RawValue::Load(barline_types::LoadAverage {
            one: 0.5,
            five: 0.0,
            fifteen: 0.0,
        });
        assert!(rule.evaluate("load", &idle).is_suppressed());
    }

    #[test]
    fn rule_naming_unknown_field_is_rejected() {
        let bar = config(
            r#"
[[slots]]
name = "mem"
interval_ms = 1000
provider = { kind = "memory-usage" }

[slots.fallback]
text = "M: {swap}"
severity = "good"
"#,
        );
        let err = build_scheduler(&bar, Scheduler::builder()).unwrap_err();
        assert!(matches!(err, ConfigError::Rule { slot, .. } if slot == "mem"));
    }

    #[test]
    fn wrong_literal_type_is_rejected() {
        let bar = config(
            r#"
[[slots]]
name = "vol"
interval_ms = 1000
provider = { kind = "audio-volume" }

[[slots.rules]]
when = { field = "muted", op = "==", value = 1 }
text = "muted"
severity = "bad"
"#,
        );
        assert!(matches!(
            build_scheduler(&bar, Scheduler::builder()),
            Err(ConfigError::Rule { .. })
        ));
    }

    #[test]
    fn invalid_clock_format_is_rejected() {
        let bar = config(
            r#"
[[slots]]
name = "clock"
interval_ms = 1000
provider = { kind = "clock", format = "%H:%" }
"#,
        );
        assert!(matches!(
            build_scheduler(&bar, Scheduler::builder()),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn slot_table_lists_every_slot() {
        let bar = config(
            r#"
timeout_ms = 2000

[[slots]]
name = "wifi"
push = true
provider = { kind = "link-state", wireless = true }

[[slots]]
name = "load"
interval_ms = 1000
provider = { kind = "load-average" }

[[slots.rules]]
when = { field = "load1", op = ">", value = 8 }
text = "LOAD"
severity = "bad"
"#,
        );
        let table = slot_table(&bar);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("SLOT"));
        assert!(lines[1].starts_with("wifi"));
        assert!(lines[1].contains("push"));
        assert!(lines[1].ends_with("preset"));
        assert!(lines[2].contains("every 1000ms"));
        assert!(lines[2].contains("2000ms"));
        assert!(lines[2].ends_with("1 custom"));
    }

    #[test]
    fn demo_configuration_is_valid() {
        let bar = config(include_str!("../demos/config.toml"));
        let scheduler = build_scheduler(&bar, Scheduler::builder()).unwrap();
        assert_eq!(scheduler.slots().len(), 12);
        assert_eq!(scheduler.slots()[0].name(), "usb");
    }
}
