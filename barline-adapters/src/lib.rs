//! # barline-adapters
//!
//! Ready-made providers for the values a status bar usually shows.
//!
//! ## Providers
//!
//! - **Always available** - [`FileFlagProvider`] reads a boolean from a file
//! - **sysinfo** (`sysinfo` feature) - disk usage, memory, load average and
//!   CPU temperature
//! - **clock** (`clock` feature) - local time with a strftime format
//! - **linux** (`linux` feature) - batteries, network links and throughput,
//!   block device I/O from sysfs, and volume through `amixer`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use barline_adapters::ClockProvider;
//! use barline_sdk::{Outcome, Rule, Scheduler, Severity, Slot, Template};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let clock = ClockProvider::new("%H:%M")?;
//! let rule = Rule::new(Outcome::show(Template::parse("{time}")?, Severity::Neutral));
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.register(Slot::polled("clock", Arc::new(clock), Duration::from_secs(1)).rule(rule))?;
//! # Ok(())
//! # }
//! ```

pub mod error;
mod flag;
mod fs;

#[cfg(feature = "linux")]
mod command;
#[cfg(feature = "linux")]
mod rate;

#[cfg(feature = "linux")]
pub mod battery;
#[cfg(feature = "linux")]
pub mod diskio;
#[cfg(feature = "linux")]
pub mod link;
#[cfg(feature = "linux")]
pub mod throughput;
#[cfg(feature = "linux")]
pub mod volume;

#[cfg(feature = "clock")]
pub mod clock;

#[cfg(feature = "sysinfo")]
pub mod system;

pub use error::AdapterError;
pub use flag::{parse_bool, FileFlagProvider};

#[cfg(feature = "linux")]
pub use battery::{BatteryProvider, BatterySelector};
#[cfg(feature = "linux")]
pub use diskio::DiskIoProvider;
#[cfg(feature = "linux")]
pub use link::{LinkSelector, LinkStateProvider};
#[cfg(feature = "linux")]
pub use throughput::ThroughputProvider;
#[cfg(feature = "linux")]
pub use volume::VolumeProvider;

#[cfg(feature = "clock")]
pub use clock::{ClockProvider, DEFAULT_CLOCK_FORMAT};

#[cfg(feature = "sysinfo")]
pub use system::{CpuTempProvider, DiskUsageProvider, LoadAverageProvider, MemoryProvider};
