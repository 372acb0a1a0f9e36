//! Block device read and write rates from `/sys/block/<dev>/stat`.

use std::path::PathBuf;

use async_trait::async_trait;
use barline_sdk::{Provider, ProviderError};
use barline_types::{DiskIo, ProviderKind, RawValue};

use crate::fs::read_trimmed;
use crate::rate::RateCounter;
use crate::AdapterError;

/// Default sysfs location of block devices.
pub const BLOCK_ROOT: &str = "/sys/block";

/// The kernel always counts in 512 byte sectors here.
const SECTOR_SIZE: u64 = 512;

/// Bytes read and written per second on one block device.
#[derive(Debug)]
pub struct DiskIoProvider {
    root: PathBuf,
    device: String,
    counter: RateCounter,
}

impl DiskIoProvider {
    pub fn new(device: impl Into<String>) -> Self {
        Self::with_root(BLOCK_ROOT, device)
    }

    pub fn with_root(root: impl Into<PathBuf>, device: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            device: device.into(),
            counter: RateCounter::default(),
        }
    }

    async fn read(&self) -> Result<DiskIo, AdapterError> {
        let path = self.root.join(&self.device).join("stat");
        let (read, written) = parse_stat(&read_trimmed(&path).await?)?;
        let (input, output) = self.counter.update(read, written);
        Ok(DiskIo {
            device: self.device.clone(),
            input,
            output,
        })
    }
}

/// Bytes read and written so far, from the contents of a `stat` file.
pub fn parse_stat(text: &str) -> Result<(u64, u64), AdapterError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    let sectors = |idx: usize| -> Result<u64, AdapterError> {
        fields
            .get(idx)
            .and_then(|f| f.parse::<u64>().ok())
            .ok_or_else(|| AdapterError::parse("block device stat", format!("no field {}", idx)))
    };
    Ok((sectors(2)? * SECTOR_SIZE, sectors(6)? * SECTOR_SIZE))
}

#[async_trait]
impl Provider for DiskIoProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DiskIo
    }

    async fn poll(&self) -> Result<RawValue, ProviderError> {
        Ok(RawValue::DiskIo(self.read().await?))
    }
}
