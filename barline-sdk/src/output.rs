//! Output backends for emitting snapshots.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use barline_types::Snapshot;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::SinkError;

/// How long a TCP output waits for a connection before skipping a snapshot.
pub const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Minimum time between TCP reconnect attempts.
pub const TCP_RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// Consumer of published snapshots.
///
/// Called once per snapshot, in sequence order. An error stops the scheduler.
#[async_trait]
pub trait Sink: Send {
    async fn on_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), SinkError>;
}

/// Built-in output destinations.
#[derive(Debug)]
pub enum Output {
    /// Write snapshots to a JSON file.
    ///
    /// The file is overwritten with each snapshot.
    File(PathBuf),

    /// Send snapshots to a TCP server as newline-delimited JSON.
    ///
    /// Delivery is best effort. A connect attempt is bounded by
    /// `connect_timeout`; after a failure, snapshots are skipped until
    /// [`TCP_RECONNECT_BACKOFF`] has passed.
    Tcp {
        addr: String,
        stream: Option<TcpStream>,
        connect_timeout: Duration,
        retry_at: Option<Instant>,
    },

    /// Send snapshots through a channel.
    ///
    /// Use `Output::channel()` to create this variant and get the receiver.
    Channel(mpsc::Sender<Arc<Snapshot>>),
}

impl Output {
    /// Create a file output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use barline_sdk::Output;
    ///
    /// let output = Output::file("bar.json");
    /// ```
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Output::File(path.into())
    }

    /// Create a TCP output.
    pub fn tcp(addr: impl Into<String>) -> Self {
        Self::tcp_with_timeout(addr, TCP_CONNECT_TIMEOUT)
    }

    /// Create a TCP output with a custom connect timeout.
    pub fn tcp_with_timeout(addr: impl Into<String>, connect_timeout: Duration) -> Self {
        Output::Tcp {
            addr: addr.into(),
            stream: None,
            connect_timeout,
            retry_at: None,
        }
    }

    /// Create a channel output and return both the output and receiver.
    ///
    /// Sending waits for capacity, so a slow receiver slows the publisher
    /// rather than losing snapshots.
    ///
    /// # Example
    ///
    /// ```rust
    /// use barline_sdk::Output;
    ///
    /// let (output, mut rx) = Output::channel(16);
    ///
    /// // Later, receive snapshots
    /// // while let Some(snapshot) = rx.recv().await {
    /// //     println!("{}", snapshot.text(" | "));
    /// // }
    /// ```
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Arc<Snapshot>>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Output::Channel(tx), rx)
    }
}

#[async_trait]
impl Sink for Output {
    async fn on_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), SinkError> {
        match self {
            Output::File(path) => {
                let json = serde_json::to_string_pretty(snapshot)?;
                tokio::fs::write(path, json).await?;
            }
            Output::Tcp {
                addr,
                stream,
                connect_timeout,
                retry_at,
            } => {
                if stream.is_none() {
                    if retry_at.is_some_and(|at| Instant::now() < at) {
                        return Ok(());
                    }
                    match tokio::time::timeout(*connect_timeout, TcpStream::connect(addr.as_str()))
                        .await
                    {
                        Ok(Ok(s)) => {
                            *stream = Some(s);
                            *retry_at = None;
                        }
                        Ok(Err(e)) => {
                            tracing::debug!(addr = %addr, error = %e, "tcp output not connected");
                            *retry_at = Some(Instant::now() + TCP_RECONNECT_BACKOFF);
                            return Ok(());
                        }
                        Err(_) => {
                            tracing::debug!(addr = %addr, "tcp output connect timed out");
                            *retry_at = Some(Instant::now() + TCP_RECONNECT_BACKOFF);
                            return Ok(());
                        }
                    }
                }

                let mut line = serde_json::to_vec(snapshot)?;
                line.push(b'\n');
                if let Some(s) = stream.as_mut() {
                    if let Err(e) = s.write_all(&line).await {
                        tracing::debug!(addr = %addr, error = %e, "tcp output dropped");
                        *stream = None;
                    }
                }
            }
            Output::Channel(tx) => {
                tx.send(Arc::new(snapshot.clone()))
                    .await
                    .map_err(|_| SinkError::Closed)?;
            }
        }
        Ok(())
    }
}

/// Forward every snapshot from a subscription to the sinks, in order.
///
/// Returns when the subscription ends or a sink fails.
pub async fn publish(
    mut snapshots: mpsc::UnboundedReceiver<Arc<Snapshot>>,
    sinks: &mut [Box<dyn Sink>],
) -> Result<(), SinkError> {
    while let Some(snapshot) = snapshots.recv().await {
        for sink in sinks.iter_mut() {
            sink.on_snapshot(&snapshot).await?;
        }
    }
    Ok(())
}
