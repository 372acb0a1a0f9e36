//! Provider traits implemented by adapters.

use async_trait::async_trait;
use barline_types::{ProviderKind, RawValue};
use tokio::sync::mpsc;

use crate::error::ProviderError;

/// A source that is asked for its value on every tick.
#[async_trait]
pub trait Provider: Send + Sync {
    /// The kind of raw value this provider returns.
    fn kind(&self) -> ProviderKind;

    /// Produce the current value.
    async fn poll(&self) -> Result<RawValue, ProviderError>;
}

/// A source that reports values as they change.
///
/// `run` is expected to loop until the updates channel closes. Returning
/// `Ok(())` or a retryable error makes the scheduler restart it after a
/// delay; `ProviderError::Unavailable` ends the slot.
#[async_trait]
pub trait PushProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn run(&self, updates: UpdateSender) -> Result<(), ProviderError>;
}

/// Channel a push provider sends its values through.
#[derive(Debug, Clone)]
pub struct UpdateSender {
    tx: mpsc::Sender<RawValue>,
}

impl UpdateSender {
    /// Create a sender and the receiver the scheduler reads from.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<RawValue>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    /// Send a new value. Fails once the slot has shut down.
    pub async fn send(&self, value: RawValue) -> Result<(), ProviderError> {
        self.tx
            .send(value)
            .await
            .map_err(|_| ProviderError::unavailable("slot shut down"))
    }

    /// Whether the scheduler stopped listening.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
