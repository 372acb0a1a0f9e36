//! Raw readings produced by providers.
//!
//! Each provider kind has one [`RawValue`] variant. Rules never look at the
//! structs directly: they read named fields through [`RawValue::field`], and
//! the set of names a kind exposes is published by [`ProviderKind::fields`]
//! so configuration can be validated before anything runs.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A single field read out of a raw value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Signed integer (percentages, whole degrees).
    Int(i64),
    /// Floating point (fractions, load averages).
    Float(f64),
    /// Byte count, rendered with IEC units.
    Bytes(u64),
    /// Bytes per second, rendered with IEC units.
    Rate(f64),
    /// A span of time.
    Duration(Duration),
    /// Boolean flag.
    Bool(bool),
    /// Free text.
    Text(String),
}

impl FieldValue {
    /// The kind of this value.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Bytes(_) => FieldKind::Bytes,
            FieldValue::Rate(_) => FieldKind::Rate,
            FieldValue::Duration(_) => FieldKind::Duration,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Text(_) => FieldKind::Text,
        }
    }

    /// Numeric view used by threshold comparisons.
    ///
    /// Durations compare in seconds, bytes in bytes.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(n) => Some(*n as f64),
            FieldValue::Float(x) | FieldValue::Rate(x) => Some(*x),
            FieldValue::Bytes(b) => Some(*b as f64),
            FieldValue::Duration(d) => Some(d.as_secs_f64()),
            FieldValue::Bool(_) | FieldValue::Text(_) => None,
        }
    }
}

/// The type of a field, used to validate rules against a provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int,
    Float,
    Bytes,
    Rate,
    Duration,
    Bool,
    Text,
}

impl FieldKind {
    /// Whether values of this kind can be compared with `<`, `>` and friends.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, FieldKind::Bool | FieldKind::Text)
    }
}

/// Every kind of provider barline knows how to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ProviderKind {
    DiskUsage,
    DiskIo,
    CpuTemperature,
    LinkState,
    NetworkThroughput,
    Battery,
    AudioVolume,
    MemoryUsage,
    LoadAverage,
    Clock,
    CustomBooleanCheck,
}

impl ProviderKind {
    /// All provider kinds.
    pub const ALL: [ProviderKind; 11] = [
        ProviderKind::DiskUsage,
        ProviderKind::DiskIo,
        ProviderKind::CpuTemperature,
        ProviderKind::LinkState,
        ProviderKind::NetworkThroughput,
        ProviderKind::Battery,
        ProviderKind::AudioVolume,
        ProviderKind::MemoryUsage,
        ProviderKind::LoadAverage,
        ProviderKind::Clock,
        ProviderKind::CustomBooleanCheck,
    ];

    /// The kebab-case name used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::DiskUsage => "disk-usage",
            ProviderKind::DiskIo => "disk-io",
            ProviderKind::CpuTemperature => "cpu-temperature",
            ProviderKind::LinkState => "link-state",
            ProviderKind::NetworkThroughput => "network-throughput",
            ProviderKind::Battery => "battery",
            ProviderKind::AudioVolume => "audio-volume",
            ProviderKind::MemoryUsage => "memory-usage",
            ProviderKind::LoadAverage => "load-average",
            ProviderKind::Clock => "clock",
            ProviderKind::CustomBooleanCheck => "custom-boolean-check",
        }
    }

    /// The named fields a raw value of this kind exposes to rules.
    pub fn fields(&self) -> &'static [(&'static str, FieldKind)] {
        use FieldKind::*;
        match self {
            ProviderKind::DiskUsage => &[
                ("path", Text),
                ("used", Bytes),
                ("total", Bytes),
                ("available", Bytes),
                ("avail_frac", Float),
                ("used_frac", Float),
                ("used_pct", Int),
            ],
            ProviderKind::DiskIo => &[("device", Text), ("input", Rate), ("output", Rate)],
            ProviderKind::CpuTemperature => &[("celsius", Int), ("fahrenheit", Int)],
            ProviderKind::LinkState => &[
                ("name", Text),
                ("connected", Bool),
                ("connecting", Bool),
                ("enabled", Bool),
                ("ssid", Text),
                ("ip", Text),
            ],
            ProviderKind::NetworkThroughput => &[
                ("interface", Text),
                ("rx", Rate),
                ("tx", Rate),
                ("connected", Bool),
            ],
            ProviderKind::Battery => &[
                ("status", Text),
                ("pct", Int),
                ("remaining", Duration),
                ("has_remaining", Bool),
                ("plugged_in", Bool),
                ("discharging", Bool),
            ],
            ProviderKind::AudioVolume => &[("pct", Int), ("muted", Bool)],
            ProviderKind::MemoryUsage => &[
                ("total", Bytes),
                ("available", Bytes),
                ("used", Bytes),
                ("avail_frac", Float),
            ],
            ProviderKind::LoadAverage => &[("load1", Float), ("load5", Float), ("load15", Float)],
            ProviderKind::Clock => &[("time", Text)],
            ProviderKind::CustomBooleanCheck => &[("value", Bool), ("path", Text)],
        }
    }

    /// Look up the kind of a named field.
    pub fn field_kind(&self, name: &str) -> Option<FieldKind> {
        self.fields()
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, kind)| *kind)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown provider kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProviderKind(pub String);

impl fmt::Display for UnknownProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown provider kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownProviderKind {}

impl FromStr for ProviderKind {
    type Err = UnknownProviderKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownProviderKind(s.to_string()))
    }
}

/// Space usage of one mounted filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskUsage {
    pub path: String,
    pub used: u64,
    pub total: u64,
}

impl DiskUsage {
    pub fn new(path: impl Into<String>, used: u64, total: u64) -> Self {
        Self {
            path: path.into(),
            used,
            total,
        }
    }

    /// Bytes still available.
    pub fn available(&self) -> u64 {
        self.total.saturating_sub(self.used)
    }

    /// Fraction of the filesystem still available, 0.0 for an empty filesystem.
    pub fn avail_frac(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.available() as f64 / self.total as f64
        }
    }
}

/// Read/write throughput of a block device.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskIo {
    pub device: String,
    /// Bytes read per second.
    pub input: f64,
    /// Bytes written per second.
    pub output: f64,
}

/// A temperature reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature {
    pub celsius: f64,
}

impl Temperature {
    pub fn from_celsius(celsius: f64) -> Self {
        Self { celsius }
    }

    pub fn fahrenheit(&self) -> f64 {
        self.celsius * 9.0 / 5.0 + 32.0
    }
}

/// State of a network link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// Up with an address.
    Connected,
    /// Up (or dormant) but not configured yet.
    Connecting,
    /// Present and enabled, but no carrier.
    Down,
    /// Missing or administratively disabled.
    Disabled,
}

/// A network interface and its link state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    pub name: String,
    pub state: LinkState,
    /// Wireless network name, when the link is wireless and associated.
    pub ssid: Option<String>,
    pub ips: Vec<String>,
}

impl LinkInfo {
    pub fn new(name: impl Into<String>, state: LinkState) -> Self {
        Self {
            name: name.into(),
            state,
            ssid: None,
            ips: Vec::new(),
        }
    }

    pub fn connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    pub fn connecting(&self) -> bool {
        self.state == LinkState::Connecting
    }

    pub fn enabled(&self) -> bool {
        self.state != LinkState::Disabled
    }
}

/// Receive/transmit rates of a network interface.
#[derive(Debug, Clone, PartialEq)]
pub struct Throughput {
    pub interface: String,
    pub rx: f64,
    pub tx: f64,
    pub connected: bool,
}

/// Charging state reported by a battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatteryStatus {
    Full,
    Charging,
    Discharging,
    NotCharging,
    Disconnected,
    Unknown,
}

impl BatteryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatteryStatus::Full => "full",
            BatteryStatus::Charging => "charging",
            BatteryStatus::Discharging => "discharging",
            BatteryStatus::NotCharging => "not-charging",
            BatteryStatus::Disconnected => "disconnected",
            BatteryStatus::Unknown => "unknown",
        }
    }
}

/// Battery charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatteryInfo {
    pub status: BatteryStatus,
    /// Remaining charge, 0..=100.
    pub pct: u8,
    /// Estimated time to empty (discharging) or full (charging).
    pub remaining: Option<Duration>,
}

impl BatteryInfo {
    pub fn new(status: BatteryStatus, pct: u8) -> Self {
        Self {
            status,
            pct: pct.min(100),
            remaining: None,
        }
    }

    /// On external power.
    pub fn plugged_in(&self) -> bool {
        matches!(
            self.status,
            BatteryStatus::Charging | BatteryStatus::Full | BatteryStatus::NotCharging
        )
    }

    pub fn discharging(&self) -> bool {
        self.status == BatteryStatus::Discharging
    }
}

/// Output volume of an audio sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume {
    pub pct: u8,
    pub muted: bool,
}

/// System memory usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total: u64,
    pub available: u64,
}

impl MemoryInfo {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.available)
    }

    pub fn avail_frac(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.available as f64 / self.total as f64
        }
    }
}

/// 1, 5 and 15 minute load averages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// The latest value produced by a provider.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Disk(DiskUsage),
    DiskIo(DiskIo),
    Temperature(Temperature),
    Link(LinkInfo),
    Throughput(Throughput),
    Battery(BatteryInfo),
    Volume(Volume),
    Memory(MemoryInfo),
    Load(LoadAverage),
    /// Already formatted wall-clock time.
    Clock(String),
    /// A boolean read from a file.
    Flag { path: String, value: bool },
    /// The provider explicitly has nothing to show.
    Unavailable,
}

impl RawValue {
    /// The provider kind that produces this value, `None` for `Unavailable`.
    pub fn kind(&self) -> Option<ProviderKind> {
        Some(match self {
            RawValue::Disk(_) => ProviderKind::DiskUsage,
            RawValue::DiskIo(_) => ProviderKind::DiskIo,
            RawValue::Temperature(_) => ProviderKind::CpuTemperature,
            RawValue::Link(_) => ProviderKind::LinkState,
            RawValue::Throughput(_) => ProviderKind::NetworkThroughput,
            RawValue::Battery(_) => ProviderKind::Battery,
            RawValue::Volume(_) => ProviderKind::AudioVolume,
            RawValue::Memory(_) => ProviderKind::MemoryUsage,
            RawValue::Load(_) => ProviderKind::LoadAverage,
            RawValue::Clock(_) => ProviderKind::Clock,
            RawValue::Flag { .. } => ProviderKind::CustomBooleanCheck,
            RawValue::Unavailable => return None,
        })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, RawValue::Unavailable)
    }

    /// Read a named field. Names match [`ProviderKind::fields`].
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        use FieldValue::*;
        let value = match (self, name) {
            (RawValue::Disk(d), "path") => Text(d.path.clone()),
            (RawValue::Disk(d), "used") => Bytes(d.used),
            (RawValue::Disk(d), "total") => Bytes(d.total),
            (RawValue::Disk(d), "available") => Bytes(d.available()),
            (RawValue::Disk(d), "avail_frac") => Float(d.avail_frac()),
            (RawValue::Disk(d), "used_frac") => Float(1.0 - d.avail_frac()),
            (RawValue::Disk(d), "used_pct") => Int(((1.0 - d.avail_frac()) * 100.0).round() as i64),

            (RawValue::DiskIo(io), "device") => Text(io.device.clone()),
            (RawValue::DiskIo(io), "input") => Rate(io.input),
            (RawValue::DiskIo(io), "output") => Rate(io.output),

            // Whole degrees, truncated
            (RawValue::Temperature(t), "celsius") => Int(t.celsius.trunc() as i64),
            (RawValue::Temperature(t), "fahrenheit") => Int(t.fahrenheit().trunc() as i64),

            (RawValue::Link(l), "name") => Text(l.name.clone()),
            (RawValue::Link(l), "connected") => Bool(l.connected()),
            (RawValue::Link(l), "connecting") => Bool(l.connecting()),
            (RawValue::Link(l), "enabled") => Bool(l.enabled()),
            (RawValue::Link(l), "ssid") => Text(l.ssid.clone().unwrap_or_default()),
            (RawValue::Link(l), "ip") => Text(l.ips.first().cloned().unwrap_or_default()),

            (RawValue::Throughput(t), "interface") => Text(t.interface.clone()),
            (RawValue::Throughput(t), "rx") => Rate(t.rx),
            (RawValue::Throughput(t), "tx") => Rate(t.tx),
            (RawValue::Throughput(t), "connected") => Bool(t.connected),

            (RawValue::Battery(b), "status") => Text(b.status.as_str().to_string()),
            (RawValue::Battery(b), "pct") => Int(b.pct as i64),
            (RawValue::Battery(b), "remaining") => Duration(b.remaining.unwrap_or_default()),
            (RawValue::Battery(b), "has_remaining") => Bool(b.remaining.is_some()),
            (RawValue::Battery(b), "plugged_in") => Bool(b.plugged_in()),
            (RawValue::Battery(b), "discharging") => Bool(b.discharging()),

            (RawValue::Volume(v), "pct") => Int(v.pct as i64),
            (RawValue::Volume(v), "muted") => Bool(v.muted),

            (RawValue::Memory(m), "total") => Bytes(m.total),
            (RawValue::Memory(m), "available") => Bytes(m.available),
            (RawValue::Memory(m), "used") => Bytes(m.used()),
            (RawValue::Memory(m), "avail_frac") => Float(m.avail_frac()),

            (RawValue::Load(l), "load1") => Float(l.one),
            (RawValue::Load(l), "load5") => Float(l.five),
            (RawValue::Load(l), "load15") => Float(l.fifteen),

            (RawValue::Clock(time), "time") => Text(time.clone()),

            (RawValue::Flag { value, .. }, "value") => Bool(*value),
            (RawValue::Flag { path, .. }, "path") => Text(path.clone()),

            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: ProviderKind) -> RawValue {
        match kind {
            ProviderKind::DiskUsage => RawValue::Disk(DiskUsage::new("/", 80, 100)),
            ProviderKind::DiskIo => RawValue::DiskIo(DiskIo {
                device: "dm-0".into(),
                input: 1.0,
                output: 2.0,
            }),
            ProviderKind::CpuTemperature => RawValue::Temperature(Temperature::from_celsius(50.0)),
            ProviderKind::LinkState => RawValue::Link(LinkInfo::new("eth0", LinkState::Down)),
            ProviderKind::NetworkThroughput => RawValue::Throughput(Throughput {
                interface: "eth0".into(),
                rx: 0.0,
                tx: 0.0,
                connected: true,
            }),
            ProviderKind::Battery => RawValue::Battery(BatteryInfo::new(BatteryStatus::Full, 100)),
            ProviderKind::AudioVolume => RawValue::Volume(Volume { pct: 40, muted: false }),
            ProviderKind::MemoryUsage => RawValue::Memory(MemoryInfo {
                total: 8,
                available: 2,
            }),
            ProviderKind::LoadAverage => RawValue::Load(LoadAverage {
                one: 0.1,
                five: 0.2,
                fifteen: 0.3,
            }),
            ProviderKind::Clock => RawValue::Clock("12:00".into()),
            ProviderKind::CustomBooleanCheck => RawValue::Flag {
                path: "/tmp/x".into(),
                value: true,
            },
        }
    }

    #[test]
    fn every_declared_field_is_readable_with_its_declared_kind() {
        for kind in ProviderKind::ALL {
            let value = sample(kind);
            assert_eq!(value.kind(), Some(kind));
            for (name, field_kind) in kind.fields() {
                let field = value
                    .field(name)
                    .unwrap_or_else(|| panic!("{} missing field {}", kind, name));
                assert_eq!(field.kind(), *field_kind, "{}.{}", kind, name);
            }
        }
    }

    #[test]
    fn undeclared_fields_are_absent() {
        let value = sample(ProviderKind::DiskUsage);
        assert!(value.field("celsius").is_none());
        assert!(RawValue::Unavailable.field("used").is_none());
    }

    #[test]
    fn disk_fractions() {
        let disk = DiskUsage::new("/", 80, 100);
        assert_eq!(disk.available(), 20);
        assert!((disk.avail_frac() - 0.2).abs() < 1e-9);
        assert_eq!(
            RawValue::Disk(disk).field("used_pct"),
            Some(FieldValue::Int(80))
        );
        assert_eq!(DiskUsage::new("/", 0, 0).avail_frac(), 0.0);
    }

    #[test]
    fn temperature_truncates_to_whole_degrees() {
        let value = RawValue::Temperature(Temperature::from_celsius(85.9));
        assert_eq!(value.field("celsius"), Some(FieldValue::Int(85)));
        assert_eq!(value.field("fahrenheit"), Some(FieldValue::Int(186)));
    }

    #[test]
    fn link_state_flags() {
        let down = LinkInfo::new("wlan0", LinkState::Down);
        assert!(!down.connected());
        assert!(down.enabled());

        let off = LinkInfo::new("wlan0", LinkState::Disabled);
        assert!(!off.enabled());
    }

    #[test]
    fn battery_power_source() {
        assert!(BatteryInfo::new(BatteryStatus::Charging, 50).plugged_in());
        assert!(BatteryInfo::new(BatteryStatus::Full, 100).plugged_in());
        assert!(!BatteryInfo::new(BatteryStatus::Discharging, 50).plugged_in());
        assert_eq!(BatteryInfo::new(BatteryStatus::Unknown, 250).pct, 100);
    }

    #[test]
    fn provider_kind_names_roundtrip() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>(), Ok(kind));
        }
        assert!("gpu".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn numeric_view() {
        assert_eq!(FieldValue::Bytes(10).as_f64(), Some(10.0));
        assert_eq!(FieldValue::Duration(Duration::from_secs(90)).as_f64(), Some(90.0));
        assert_eq!(FieldValue::Bool(true).as_f64(), None);
        assert!(FieldKind::Rate.is_numeric());
        assert!(!FieldKind::Text.is_numeric());
    }
}
