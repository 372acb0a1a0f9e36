use async_trait::async_trait;
use barline_sdk::{Sink, SinkError, Snapshot};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Writes each snapshot as a single line of JSON.
pub struct JsonSink<W> {
    out: W,
}

impl<W: AsyncWrite + Unpin + Send> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Sink for JsonSink<W> {
    async fn on_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(snapshot)?;
        line.push(b'\n');
        self.out.write_all(&line).await?;
        self.out.flush().await?;
        Ok(())
    }
}
