use async_trait::async_trait;
use barline_sdk::{Sink, SinkError, Snapshot};
use crossterm::style::{style, Stylize};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::theme::Palette;

/// Render a snapshot as one line of text, colored with ANSI escapes when
/// `palette` is given.
pub fn render_line(snapshot: &Snapshot, separator: &str, palette: Option<&Palette>) -> String {
    let mut line = String::new();
    for (i, segment) in snapshot.iter().enumerate() {
        if i > 0 {
            line.push_str(separator);
        }
        match palette.and_then(|p| p.color(segment.severity)) {
            Some(rgb) => line.push_str(&style(&segment.text).with(rgb.into()).to_string()),
            None => line.push_str(&segment.text),
        }
    }
    line
}

/// Writes each snapshot as a line of text.
pub struct TextSink<W> {
    out: W,
    separator: String,
    palette: Option<Palette>,
}

impl<W: AsyncWrite + Unpin + Send> TextSink<W> {
    /// Plain text, no colors.
    pub fn new(out: W, separator: impl Into<String>) -> Self {
        Self {
            out,
            separator: separator.into(),
            palette: None,
        }
    }

    /// Color segments by severity.
    pub fn colored(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Sink for TextSink<W> {
    async fn on_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), SinkError> {
        let mut line = render_line(snapshot, &self.separator, self.palette.as_ref());
        line.push('\n');
        self.out.write_all(line.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }
}
