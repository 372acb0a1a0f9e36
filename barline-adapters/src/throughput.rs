//! Network throughput from interface statistics.

use std::path::PathBuf;

use async_trait::async_trait;
use barline_sdk::{Provider, ProviderError};
use barline_types::{ProviderKind, RawValue, Throughput};

use crate::fs::{read_trimmed, read_u64};
use crate::link::NET_ROOT;
use crate::rate::RateCounter;
use crate::AdapterError;

/// Receive and transmit rates of one interface.
///
/// The first poll reports zero. A missing interface reads as disconnected
/// with zero rates.
#[derive(Debug)]
pub struct ThroughputProvider {
    root: PathBuf,
    interface: String,
    counter: RateCounter,
}

impl ThroughputProvider {
    pub fn new(interface: impl Into<String>) -> Self {
        Self::with_root(NET_ROOT, interface)
    }

    pub fn with_root(root: impl Into<PathBuf>, interface: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            interface: interface.into(),
            counter: RateCounter::default(),
        }
    }

    async fn read(&self) -> Result<Throughput, AdapterError> {
        let dir = self.root.join(&self.interface);
        let operstate = match read_trimmed(&dir.join("operstate")).await {
            Ok(state) => state,
            Err(AdapterError::NotFound(_)) => {
                self.counter.reset();
                return Ok(Throughput {
                    interface: self.interface.clone(),
                    rx: 0.0,
                    tx: 0.0,
                    connected: false,
                });
            }
            Err(e) => return Err(e),
        };

        let stats = dir.join("statistics");
        let rx_bytes = read_u64(&stats.join("rx_bytes")).await?;
        let tx_bytes = read_u64(&stats.join("tx_bytes")).await?;
        let (rx, tx) = self.counter.update(rx_bytes, tx_bytes);

        Ok(Throughput {
            interface: self.interface.clone(),
            rx,
            tx,
            connected: operstate == "up",
        })
    }
}

#[async_trait]
impl Provider for ThroughputProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::NetworkThroughput
    }

    async fn poll(&self) -> Result<RawValue, ProviderError> {
        Ok(RawValue::Throughput(self.read().await?))
    }
}
