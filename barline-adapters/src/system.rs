//! Providers backed by `sysinfo`: disk usage, memory, load and CPU temperature.
//!
//! `sysinfo` reads are blocking, so each poll refreshes its handle on the
//! blocking pool. A poll timeout cannot stop a read that is stuck (a hung
//! network mount), so while one is still holding the handle later polls
//! fail fast with [`AdapterError::Busy`] instead of queueing behind it.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use barline_sdk::{Provider, ProviderError};
use barline_types::{DiskUsage, LoadAverage, MemoryInfo, ProviderKind, RawValue, Temperature};
use parking_lot::Mutex;
use sysinfo::{Components, Disks, System};

use crate::AdapterError;

/// Run `f` on the blocking pool with the handle locked, or fail with
/// `Busy` if an earlier read still holds it.
async fn with_handle<H, T, F>(
    handle: &Arc<Mutex<H>>,
    what: &'static str,
    f: F,
) -> Result<T, AdapterError>
where
    H: Send + 'static,
    T: Send + 'static,
    F: FnOnce(&mut H) -> Result<T, AdapterError> + Send + 'static,
{
    if handle.is_locked() {
        return Err(AdapterError::Busy(what));
    }
    let handle = Arc::clone(handle);
    tokio::task::spawn_blocking(move || {
        let mut guard = handle.try_lock().ok_or(AdapterError::Busy(what))?;
        f(&mut guard)
    })
    .await?
}

/// Space used on the filesystem mounted at a path.
pub struct DiskUsageProvider {
    mount: PathBuf,
    disks: Arc<Mutex<Disks>>,
}

impl DiskUsageProvider {
    pub fn new(mount: impl Into<PathBuf>) -> Self {
        Self {
            mount: mount.into(),
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
        }
    }
}

#[async_trait]
impl Provider for DiskUsageProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DiskUsage
    }

    async fn poll(&self) -> Result<RawValue, ProviderError> {
        let mount = self.mount.clone();
        let usage = with_handle(&self.disks, "disk list", move |disks| {
            disks.refresh_list();
            disks
                .iter()
                .find(|d| d.mount_point() == mount.as_path())
                .map(|d| {
                    let total = d.total_space();
                    DiskUsage::new(
                        mount.display().to_string(),
                        total.saturating_sub(d.available_space()),
                        total,
                    )
                })
                .ok_or_else(|| AdapterError::NotFound(format!("mount {}", mount.display())))
        })
        .await?;
        Ok(RawValue::Disk(usage))
    }
}

/// Physical memory in use.
pub struct MemoryProvider {
    system: Arc<Mutex<System>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
        }
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MemoryProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::MemoryUsage
    }

    async fn poll(&self) -> Result<RawValue, ProviderError> {
        let info = with_handle(&self.system, "memory", |system| {
            system.refresh_memory();
            Ok(MemoryInfo {
                total: system.total_memory(),
                available: system.available_memory(),
            })
        })
        .await?;
        Ok(RawValue::Memory(info))
    }
}

/// The 1, 5 and 15 minute load averages.
#[derive(Debug, Default)]
pub struct LoadAverageProvider;

#[async_trait]
impl Provider for LoadAverageProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::LoadAverage
    }

    async fn poll(&self) -> Result<RawValue, ProviderError> {
        let load = System::load_average();
        Ok(RawValue::Load(LoadAverage {
            one: load.one,
            five: load.five,
            fifteen: load.fifteen,
        }))
    }
}

/// CPU temperature from hardware sensors.
///
/// With a sensor name, the first component whose label contains it is
/// used; otherwise the hottest component.
pub struct CpuTempProvider {
    sensor: Option<String>,
    components: Arc<Mutex<Components>>,
}

impl CpuTempProvider {
    pub fn new(sensor: Option<String>) -> Self {
        Self {
            sensor,
            components: Arc::new(Mutex::new(Components::new_with_refreshed_list())),
        }
    }
}

/// Pick a reading from `(label, celsius)` pairs.
pub fn pick_temperature<'a>(
    readings: impl IntoIterator<Item = (&'a str, f32)>,
    sensor: Option<&str>,
) -> Option<f64> {
    let mut valid = readings.into_iter().filter(|(_, t)| t.is_finite());
    match sensor {
        Some(name) => valid.find(|(label, _)| label.contains(name)).map(|(_, t)| t as f64),
        None => valid.map(|(_, t)| t as f64).reduce(f64::max),
    }
}

#[async_trait]
impl Provider for CpuTempProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CpuTemperature
    }

    async fn poll(&self) -> Result<RawValue, ProviderError> {
        let sensor = self.sensor.clone();
        let celsius = with_handle(&self.components, "sensors", move |components| {
            components.refresh();
            pick_temperature(
                components.iter().map(|c| (c.label(), c.temperature())),
                sensor.as_deref(),
            )
            .ok_or_else(|| {
                AdapterError::NotFound(match sensor {
                    Some(name) => format!("temperature sensor '{}'", name),
                    None => "temperature sensors".to_string(),
                })
            })
        })
        .await?;
        Ok(RawValue::Temperature(Temperature::from_celsius(celsius)))
    }
}
