//! Battery charge from `/sys/class/power_supply`.
//!
//! Each `BAT*` directory has a `uevent` file of `POWER_SUPPLY_*=value`
//! lines. Energy values are in µWh and power in µW; older firmware reports
//! charge (µAh) and current (µA) instead, which give the same ratios.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use barline_sdk::{Provider, ProviderError};
use barline_types::{BatteryInfo, BatteryStatus, ProviderKind, RawValue};

use crate::AdapterError;

/// Default sysfs location of power supplies.
pub const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";

/// Which batteries to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatterySelector {
    /// Every `BAT*` supply, combined into one reading.
    All,
    /// A single supply by directory name, e.g. `BAT0`.
    Named(String),
}

/// One battery's `uevent` contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatteryReading {
    pub status: Option<BatteryStatus>,
    pub present: bool,
    pub now: f64,
    pub full: f64,
    pub rate: f64,
    pub capacity: Option<u8>,
}

/// Parse a power supply `uevent` file.
pub fn parse_uevent(text: &str) -> BatteryReading {
    let mut reading = BatteryReading {
        present: true,
        ..Default::default()
    };

    for line in text.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let Some(key) = key.strip_prefix("POWER_SUPPLY_") else {
            continue;
        };
        let number = || value.trim().parse::<f64>().ok();

        match key {
            "STATUS" => reading.status = Some(parse_status(value)),
            "PRESENT" => reading.present = value.trim() != "0",
            "ENERGY_NOW" | "CHARGE_NOW" => reading.now = number().unwrap_or(0.0),
            "ENERGY_FULL" | "CHARGE_FULL" => reading.full = number().unwrap_or(0.0),
            // Some firmware reports negative current while discharging
            "POWER_NOW" | "CURRENT_NOW" => reading.rate = number().unwrap_or(0.0).abs(),
            "CAPACITY" => reading.capacity = value.trim().parse().ok(),
            _ => {}
        }
    }
    reading
}

fn parse_status(value: &str) -> BatteryStatus {
    match value.trim() {
        "Full" => BatteryStatus::Full,
        "Charging" => BatteryStatus::Charging,
        "Discharging" => BatteryStatus::Discharging,
        "Not charging" => BatteryStatus::NotCharging,
        _ => BatteryStatus::Unknown,
    }
}

/// Combine the readings of several batteries into one.
///
/// No present battery reads as `Disconnected`.
pub fn combine(readings: &[BatteryReading]) -> BatteryInfo {
    let present: Vec<_> = readings.iter().filter(|r| r.present).collect();
    if present.is_empty() {
        return BatteryInfo::new(BatteryStatus::Disconnected, 0);
    }

    let now: f64 = present.iter().map(|r| r.now).sum();
    let full: f64 = present.iter().map(|r| r.full).sum();
    let rate: f64 = present.iter().map(|r| r.rate).sum();

    let pct = if full > 0.0 {
        (now / full * 100.0).round().clamp(0.0, 100.0) as u8
    } else {
        let capacities: Vec<u32> = present
            .iter()
            .filter_map(|r| r.capacity.map(u32::from))
            .collect();
        if capacities.is_empty() {
            0
        } else {
            (capacities.iter().sum::<u32>() / capacities.len() as u32) as u8
        }
    };

    let has = |status| present.iter().any(|r| r.status == Some(status));
    let status = if has(BatteryStatus::Discharging) {
        BatteryStatus::Discharging
    } else if has(BatteryStatus::Charging) {
        BatteryStatus::Charging
    } else if present.iter().all(|r| r.status == Some(BatteryStatus::Full)) {
        BatteryStatus::Full
    } else if has(BatteryStatus::NotCharging) {
        BatteryStatus::NotCharging
    } else {
        BatteryStatus::Unknown
    };

    let remaining_hours = match status {
        BatteryStatus::Discharging if rate > 0.0 => Some(now / rate),
        BatteryStatus::Charging if rate > 0.0 => Some((full - now).max(0.0) / rate),
        _ => None,
    };

    let mut info = BatteryInfo::new(status, pct);
    info.remaining = remaining_hours.map(|h| Duration::from_secs_f64(h * 3600.0));
    info
}

/// Reports battery charge and state.
#[derive(Debug, Clone)]
pub struct BatteryProvider {
    root: PathBuf,
    selector: BatterySelector,
}

impl BatteryProvider {
    pub fn new(selector: BatterySelector) -> Self {
        Self::with_root(POWER_SUPPLY_ROOT, selector)
    }

    /// Read supplies from a different directory.
    pub fn with_root(root: impl Into<PathBuf>, selector: BatterySelector) -> Self {
        Self {
            root: root.into(),
            selector,
        }
    }

    async fn supplies(&self) -> Result<Vec<PathBuf>, AdapterError> {
        match &self.selector {
            BatterySelector::Named(name) => Ok(vec![self.root.join(name)]),
            BatterySelector::All => {
                let mut dirs = Vec::new();
                let mut entries = match tokio::fs::read_dir(&self.root).await {
                    Ok(entries) => entries,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(dirs),
                    Err(e) => return Err(AdapterError::io(&self.root, e)),
                };
                while let Some(entry) = entries
                    .next_entry()
                    .await
                    .map_err(|e| AdapterError::io(&self.root, e))?
                {
                    if entry.file_name().to_string_lossy().starts_with("BAT") {
                        dirs.push(entry.path());
                    }
                }
                dirs.sort();
                Ok(dirs)
            }
        }
    }

    async fn read_supply(dir: &Path) -> Result<Option<BatteryReading>, AdapterError> {
        let path = dir.join("uevent");
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(parse_uevent(&text))),
            // Unplugged between listing and reading
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AdapterError::io(path, e)),
        }
    }

    pub async fn read(&self) -> Result<BatteryInfo, AdapterError> {
        let mut readings = Vec::new();
        for dir in self.supplies().await? {
            if let Some(reading) = Self::read_supply(&dir).await? {
                readings.push(reading);
            }
        }
        Ok(combine(&readings))
    }
}

#[async_trait]
impl Provider for BatteryProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Battery
    }

    async fn poll(&self) -> Result<RawValue, ProviderError> {
        Ok(RawValue::Battery(self.read().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISCHARGING: &str = "\
POWER_SUPPLY_NAME=BAT0
POWER_SUPPLY_STATUS=Discharging
POWER_SUPPLY_PRESENT=1
POWER_SUPPLY_POWER_NOW=10000000
POWER_SUPPLY_ENERGY_FULL=50000000
POWER_SUPPLY_ENERGY_NOW=20000000
POWER_SUPPLY_CAPACITY=40
";

    fn write_battery(root: &Path, name: &str, uevent: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("uevent"), uevent).unwrap();
    }

    #[test]
    fn parses_energy_uevent() {
        let reading = parse_uevent(DISCHARGING);
        assert_eq!(reading.status, Some(BatteryStatus::Discharging));
        assert!(reading.present);
        assert_eq!(reading.now, 20_000_000.0);
        assert_eq!(reading.full, 50_000_000.0);
        assert_eq!(reading.rate, 10_000_000.0);
        assert_eq!(reading.capacity, Some(40));
    }

    #[test]
    fn parses_charge_uevent_with_negative_current() {
        let reading = parse_uevent(
            "POWER_SUPPLY_STATUS=Not charging\nPOWER_SUPPLY_CHARGE_NOW=3000\nPOWER_SUPPLY_CHARGE_FULL=4000\nPOWER_SUPPLY_CURRENT_NOW=-500\n",
        );
        assert_eq!(reading.status, Some(BatteryStatus::NotCharging));
        assert_eq!(reading.rate, 500.0);
    }

    #[test]
    fn discharging_remaining_time() {
        let info = combine(&[parse_uevent(DISCHARGING)]);
        assert_eq!(info.status, BatteryStatus::Discharging);
        assert_eq!(info.pct, 40);
        assert_eq!(info.remaining, Some(Duration::from_secs(2 * 3600)));
        assert!(info.discharging());
    }

    #[test]
    fn charging_time_to_full() {
        let text = DISCHARGING.replace("Discharging", "Charging");
        let info = combine(&[parse_uevent(&text)]);
        assert!(info.plugged_in());
        assert_eq!(info.remaining, Some(Duration::from_secs(3 * 3600)));
    }

    #[test]
    fn combines_multiple_batteries() {
        let full = "POWER_SUPPLY_STATUS=Full\nPOWER_SUPPLY_ENERGY_NOW=50000000\nPOWER_SUPPLY_ENERGY_FULL=50000000\n";
        let info = combine(&[parse_uevent(DISCHARGING), parse_uevent(full)]);
        assert_eq!(info.status, BatteryStatus::Discharging);
        assert_eq!(info.pct, 70);

        let info = combine(&[parse_uevent(full), parse_uevent(full)]);
        assert_eq!(info.status, BatteryStatus::Full);
        assert_eq!(info.pct, 100);
    }

    #[test]
    fn falls_back_to_capacity() {
        let info = combine(&[parse_uevent("POWER_SUPPLY_STATUS=Unknown\nPOWER_SUPPLY_CAPACITY=64\n")]);
        assert_eq!(info.pct, 64);
        assert_eq!(info.status, BatteryStatus::Unknown);
    }

    #[test]
    fn absent_batteries_are_disconnected() {
        assert_eq!(combine(&[]).status, BatteryStatus::Disconnected);
        let info = combine(&[parse_uevent("POWER_SUPPLY_PRESENT=0\n")]);
        assert_eq!(info.status, BatteryStatus::Disconnected);
    }

    #[tokio::test]
    async fn reads_all_bat_directories() {
        let root = tempfile::tempdir().unwrap();
        write_battery(root.path(), "BAT0", DISCHARGING);
        write_battery(root.path(), "AC", "POWER_SUPPLY_ONLINE=0\n");

        let provider = BatteryProvider::with_root(root.path(), BatterySelector::All);
        let RawValue::Battery(info) = provider.poll().await.unwrap() else {
            panic!("expected a battery reading");
        };
        assert_eq!(info.pct, 40);
        assert_eq!(info.status, BatteryStatus::Discharging);
    }

    #[tokio::test]
    async fn missing_named_battery_is_disconnected() {
        let root = tempfile::tempdir().unwrap();
        let provider =
            BatteryProvider::with_root(root.path(), BatterySelector::Named("BAT1".into()));
        assert_eq!(provider.read().await.unwrap().status, BatteryStatus::Disconnected);
    }

    #[tokio::test]
    async fn missing_root_is_disconnected() {
        let root = tempfile::tempdir().unwrap();
        let provider = BatteryProvider::with_root(root.path().join("nope"), BatterySelector::All);
        assert_eq!(provider.read().await.unwrap().status, BatteryStatus::Disconnected);
    }
}
