//! Default rules for each provider kind.
//!
//! A slot without `rules` in its configuration gets the preset for its
//! provider. Thresholds here are only defaults; any of them can be replaced
//! from the configuration file.

use barline_sdk::{CompareOp, Literal, Outcome, Predicate, Rule, RuleError, Severity, Template};

use crate::config::ProviderConfig;

/// Available memory below which only the free amount is shown, in bytes.
pub const LOW_MEMORY: f64 = 1e9;

fn show(text: &str, severity: Severity) -> Result<Outcome, RuleError> {
    let template = Template::parse(text).map_err(|source| RuleError::Template {
        template: text.to_string(),
        source,
    })?;
    Ok(Outcome::show(template, severity))
}

fn cmp(field: &str, op: CompareOp, value: f64) -> Predicate {
    Predicate::compare(field, op, Literal::Float(value))
}

fn text_is(field: &str, value: &str) -> Predicate {
    Predicate::compare(field, CompareOp::Eq, Literal::Text(value.to_string()))
}

fn all(preds: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::All {
        all: preds.into_iter().collect(),
    }
}

/// Escape braces so a slot name can be used as literal template text.
fn literal(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// Whether an interface name (or name prefix) follows the wireless naming
/// scheme (`wlan0`, `wlp3s0`).
fn is_wireless_name(name: &str) -> bool {
    name.starts_with("wl")
}

/// The preset rule for a slot.
pub fn default_rule(slot: &str, provider: &ProviderConfig) -> Result<Rule, RuleError> {
    use CompareOp::{Ge, Gt, Lt};
    use Severity::{Bad, Degraded, Good, Neutral};

    let rule = match provider {
        ProviderConfig::DiskUsage { .. } => {
            let text = "D: {used}/{total}";
            Rule::new(show(text, Good)?)
                .when(cmp("avail_frac", Lt, 0.1), show(text, Bad)?)
                .when(cmp("avail_frac", Lt, 0.3), show(text, Degraded)?)
        }
        ProviderConfig::DiskIo { .. } => Rule::new(show("I: {input} O: {output}", Neutral)?),
        ProviderConfig::CpuTemperature { .. } => {
            let text = "T: {celsius}C";
            Rule::new(show(text, Good)?)
                .when(cmp("celsius", Ge, 86.0), show(text, Bad)?)
                .when(cmp("celsius", Gt, 65.0), show(text, Degraded)?)
        }
        ProviderConfig::LinkState {
            name,
            prefix,
            wireless,
        } => {
            let no_ip = text_is("ip", "");
            let connected = Predicate::is_true("connected");
            let selected = name.as_deref().or(prefix.as_deref());
            let (label, with_ip, without_ip) = if *wireless || selected.is_some_and(is_wireless_name) {
                ("W", "W: ({ssid}) {ip}", "W: ({ssid})")
            } else {
                ("E", "E: {ip}", "E: <no ip>")
            };
            Rule::new(Outcome::Suppress)
                .when(all([connected.clone(), no_ip]), show(without_ip, Good)?)
                .when(connected, show(with_ip, Good)?)
                .when(
                    Predicate::is_true("connecting"),
                    show(&format!("{}: connecting...", label), Degraded)?,
                )
                .when(
                    Predicate::is_true("enabled"),
                    show(&format!("{}: down", label), Bad)?,
                )
        }
        ProviderConfig::NetworkThroughput { .. } => Rule::new(Outcome::Suppress).when(
            Predicate::is_true("connected"),
            show("Rx: {rx} Tx: {tx}", Neutral)?,
        ),
        ProviderConfig::Battery { .. } => {
            // The time estimate is only shown when the battery reports one
            let timed = Predicate::is_true("has_remaining");
            let discharging = Predicate::is_true("discharging");
            let levels = [
                (Predicate::is_true("plugged_in"), Good),
                (all([discharging.clone(), cmp("pct", Lt, 20.0)]), Bad),
                (all([discharging.clone(), cmp("pct", Lt, 50.0)]), Degraded),
                (discharging, Good),
            ];
            let rule = Rule::new(Outcome::Suppress)
                .when(text_is("status", "disconnected"), Outcome::Suppress)
                .when(text_is("status", "full"), show("B: 100%", Good)?);
            levels.into_iter().try_fold(rule, |rule, (when, severity)| -> Result<Rule, RuleError> {
                Ok(rule
                    .when(
                        all([when.clone(), timed.clone()]),
                        show("B: {pct}% {remaining}", severity)?,
                    )
                    .when(when, show("B: {pct}%", severity)?))
            })?
        }
        ProviderConfig::AudioVolume { .. } => {
            let text = "V: {pct:03}";
            Rule::new(show(text, Good)?).when(Predicate::is_true("muted"), show(text, Bad)?)
        }
        ProviderConfig::MemoryUsage => {
            let text = "M: {used}/{total}";
            Rule::new(show(text, Good)?)
                .when(cmp("available", Lt, LOW_MEMORY), show("M: {available}", Bad)?)
                .when(cmp("avail_frac", Lt, 0.2), show(text, Bad)?)
                .when(cmp("avail_frac", Lt, 0.33), show(text, Degraded)?)
        }
        ProviderConfig::LoadAverage => {
            let text = "C: {load1:.2}";
            Rule::new(show(text, Good)?)
                .when(cmp("load1", Gt, 4.0), show(text, Bad)?)
                .when(cmp("load1", Gt, 2.0), show(text, Degraded)?)
        }
        ProviderConfig::Clock { .. } => Rule::new(show("{time}", Neutral)?),
        ProviderConfig::CustomBooleanCheck { .. } => {
            let text = literal(slot);
            Rule::new(show(&text, Bad)?).when(Predicate::is_true("value"), show(&text, Good)?)
        }
    };
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use barline_sdk::{RawValue, Segment};
    use barline_types::{
        BatteryInfo, BatteryStatus, DiskIo, DiskUsage, LinkInfo, LinkState, LoadAverage,
        MemoryInfo, Temperature, Throughput, Volume,
    };

    const GIB: u64 = 1024 * 1024 * 1024;

    fn every_provider() -> Vec<ProviderConfig> {
        vec![
            ProviderConfig::DiskUsage {
                path: PathBuf::from("/"),
            },
            ProviderConfig::DiskIo {
                device: "dm-0".into(),
            },
            ProviderConfig::CpuTemperature { sensor: None },
            ProviderConfig::LinkState {
                name: None,
                prefix: None,
                wireless: true,
            },
            ProviderConfig::LinkState {
                name: None,
                prefix: Some("e".into()),
                wireless: false,
            },
            ProviderConfig::NetworkThroughput {
                interface: "wlp3s0".into(),
            },
            ProviderConfig::Battery { name: None },
            ProviderConfig::AudioVolume { control: None },
            ProviderConfig::MemoryUsage,
            ProviderConfig::LoadAverage,
            ProviderConfig::Clock { format: None },
            ProviderConfig::CustomBooleanCheck {
                path: PathBuf::from("/proc/sys/kernel/deny_new_usb"),
            },
        ]
    }

    fn eval(provider: &ProviderConfig, raw: RawValue) -> Segment {
        default_rule("slot", provider).unwrap().evaluate("slot", &raw)
    }

    #[test]
    fn every_preset_is_valid_for_its_kind() {
        for provider in every_provider() {
            let rule = default_rule("USB", &provider).unwrap();
            rule.validate(provider.kind())
                .unwrap_or_else(|e| panic!("{}: {}", provider.kind(), e));
        }
    }

    #[test]
    fn disk_thresholds() {
        let disk = ProviderConfig::DiskUsage {
            path: PathBuf::from("/"),
        };
        let seg = eval(&disk, RawValue::Disk(DiskUsage::new("/", 80, 100)));
        assert_eq!(seg.severity, Severity::Degraded);
        assert_eq!(seg.text, "D: 80B/100B");

        let seg = eval(&disk, RawValue::Disk(DiskUsage::new("/", 95, 100)));
        assert_eq!(seg.severity, Severity::Bad);

        let seg = eval(&disk, RawValue::Disk(DiskUsage::new("/", 10, 100)));
        assert_eq!(seg.severity, Severity::Good);
    }

    #[test]
    fn temperature_thresholds() {
        let temp = ProviderConfig::CpuTemperature { sensor: None };
        let at = |c: f64| eval(&temp, RawValue::Temperature(Temperature::from_celsius(c)));
        assert_eq!(at(86.4).severity, Severity::Bad);
        assert_eq!(at(86.4).text, "T: 86C");
        assert_eq!(at(65.9).severity, Severity::Good);
        assert_eq!(at(66.0).severity, Severity::Degraded);
    }

    #[test]
    fn wifi_states() {
        let wifi = ProviderConfig::LinkState {
            name: None,
            prefix: None,
            wireless: true,
        };
        let mut up = LinkInfo::new("wlan0", LinkState::Connected);
        up.ssid = Some("home".into());
        up.ips = vec!["192.168.1.5".into()];
        let seg = eval(&wifi, RawValue::Link(up.clone()));
        assert_eq!((seg.text.as_str(), seg.severity), ("W: (home) 192.168.1.5", Severity::Good));

        up.ips.clear();
        assert_eq!(eval(&wifi, RawValue::Link(up)).text, "W: (home)");

        let seg = eval(&wifi, RawValue::Link(LinkInfo::new("wlan0", LinkState::Connecting)));
        assert_eq!((seg.text.as_str(), seg.severity), ("W: connecting...", Severity::Degraded));

        let seg = eval(&wifi, RawValue::Link(LinkInfo::new("wlan0", LinkState::Down)));
        assert_eq!((seg.text.as_str(), seg.severity), ("W: down", Severity::Bad));

        let seg = eval(&wifi, RawValue::Link(LinkInfo::new("wlan0", LinkState::Disabled)));
        assert!(seg.is_suppressed());
    }

    #[test]
    fn link_label_follows_selector() {
        let named = |name: &str| ProviderConfig::LinkState {
            name: Some(name.into()),
            prefix: None,
            wireless: false,
        };
        let down = |name: &str| RawValue::Link(LinkInfo::new(name, LinkState::Down));
        assert_eq!(eval(&named("wlp3s0"), down("wlp3s0")).text, "W: down");
        assert_eq!(eval(&named("enp0s25"), down("enp0s25")).text, "E: down");

        let by_prefix = ProviderConfig::LinkState {
            name: None,
            prefix: Some("wl".into()),
            wireless: false,
        };
        assert_eq!(eval(&by_prefix, down("wlan0")).text, "W: down");
    }

    #[test]
    fn ethernet_without_address() {
        let eth = ProviderConfig::LinkState {
            name: None,
            prefix: Some("e".into()),
            wireless: false,
        };
        let seg = eval(&eth, RawValue::Link(LinkInfo::new("enp0s25", LinkState::Connected)));
        assert_eq!(seg.text, "E: <no ip>");
        assert_eq!(seg.severity, Severity::Good);
    }

    #[test]
    fn battery_states() {
        let battery = ProviderConfig::Battery { name: None };
        let at = |status, pct| eval(&battery, RawValue::Battery(BatteryInfo::new(status, pct)));

        assert!(at(BatteryStatus::Disconnected, 0).is_suppressed());
        let full = at(BatteryStatus::Full, 12);
        assert_eq!((full.text.as_str(), full.severity), ("B: 100%", Severity::Good));
        assert_eq!(at(BatteryStatus::Charging, 10).severity, Severity::Good);
        assert_eq!(at(BatteryStatus::Discharging, 15).severity, Severity::Bad);
        assert_eq!(at(BatteryStatus::Discharging, 45).severity, Severity::Degraded);
        assert_eq!(at(BatteryStatus::Discharging, 80).severity, Severity::Good);
        assert!(at(BatteryStatus::Unknown, 80).is_suppressed());

        let mut info = BatteryInfo::new(BatteryStatus::Discharging, 42);
        info.remaining = Some(Duration::from_secs(2 * 3600 + 5 * 60));
        let seg = eval(&battery, RawValue::Battery(info));
        assert_eq!((seg.text.as_str(), seg.severity), ("B: 42% 2h05m", Severity::Degraded));
    }

    #[test]
    fn battery_without_estimate_omits_time() {
        let battery = ProviderConfig::Battery { name: None };
        let seg = eval(
            &battery,
            RawValue::Battery(BatteryInfo::new(BatteryStatus::Discharging, 80)),
        );
        assert_eq!((seg.text.as_str(), seg.severity), ("B: 80%", Severity::Good));

        let seg = eval(
            &battery,
            RawValue::Battery(BatteryInfo::new(BatteryStatus::Charging, 60)),
        );
        assert_eq!(seg.text, "B: 60%");
    }

    #[test]
    fn volume_padding_and_mute() {
        let volume = ProviderConfig::AudioVolume { control: None };
        let seg = eval(&volume, RawValue::Volume(Volume { pct: 50, muted: true }));
        assert_eq!((seg.text.as_str(), seg.severity), ("V: 050", Severity::Bad));
        let seg = eval(&volume, RawValue::Volume(Volume { pct: 100, muted: false }));
        assert_eq!((seg.text.as_str(), seg.severity), ("V: 100", Severity::Good));
    }

    #[test]
    fn memory_thresholds() {
        let mem = ProviderConfig::MemoryUsage;
        let at = |available| {
            eval(
                &mem,
                RawValue::Memory(MemoryInfo {
                    total: 16 * GIB,
                    available,
                }),
            )
        };
        let low = at(512 * 1024 * 1024);
        assert_eq!((low.text.as_str(), low.severity), ("M: 512.0MiB", Severity::Bad));
        assert_eq!(at(2 * GIB).severity, Severity::Bad);
        assert_eq!(at(4 * GIB).severity, Severity::Degraded);
        let ok = at(8 * GIB);
        assert_eq!((ok.text.as_str(), ok.severity), ("M: 8.0GiB/16.0GiB", Severity::Good));
    }

    #[test]
    fn load_thresholds() {
        let load = ProviderConfig::LoadAverage;
        let at = |one| {
            eval(
                &load,
                RawValue::Load(LoadAverage {
                    one,
                    five: 0.0,
                    fifteen: 0.0,
                }),
            )
        };
        assert_eq!(at(0.5).text, "C: 0.50");
        assert_eq!(at(0.5).severity, Severity::Good);
        assert_eq!(at(2.5).severity, Severity::Degraded);
        assert_eq!(at(4.01).severity, Severity::Bad);
    }

    #[test]
    fn neutral_readouts() {
        let clock = eval(&ProviderConfig::Clock { format: None }, RawValue::Clock("2024-05-01 09:30".into()));
        assert_eq!((clock.text.as_str(), clock.severity), ("2024-05-01 09:30", Severity::Neutral));

        let io = eval(
            &ProviderConfig::DiskIo {
                device: "dm-0".into(),
            },
            RawValue::DiskIo(DiskIo {
                device: "dm-0".into(),
                input: 0.0,
                output: 0.0,
            }),
        );
        assert_eq!(io.severity, Severity::Neutral);

        let net = ProviderConfig::NetworkThroughput {
            interface: "eth0".into(),
        };
        let down = Throughput {
            interface: "eth0".into(),
            rx: 0.0,
            tx: 0.0,
            connected: false,
        };
        assert!(eval(&net, RawValue::Throughput(down)).is_suppressed());
    }

    #[test]
    fn flag_uses_slot_name() {
        let flag = ProviderConfig::CustomBooleanCheck {
            path: PathBuf::from("/proc/sys/kernel/deny_new_usb"),
        };
        let rule = default_rule("USB", &flag).unwrap();
        let on = rule.evaluate(
            "usb",
            &RawValue::Flag {
                path: "/proc/sys/kernel/deny_new_usb".into(),
                value: true,
            },
        );
        assert_eq!((on.text.as_str(), on.severity), ("USB", Severity::Good));
        let off = rule.evaluate(
            "usb",
            &RawValue::Flag {
                path: "x".into(),
                value: false,
            },
        );
        assert_eq!(off.severity, Severity::Bad);

        let braces = default_rule("{x}", &flag).unwrap();
        let seg = braces.evaluate("x", &RawValue::Flag { path: "x".into(), value: true });
        assert_eq!(seg.text, "{x}");
    }
}
