//! StdoutSink - JSON lines on standard output

use contracts::{ContractError, TwistSink, TwistStamped};
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tracing::{debug, instrument};

use super::encode_line;

/// Writes one JSON object per sample and flushes after each line
pub struct StdoutSink<W = Stdout> {
    name: String,
    writer: W,
    lines: u64,
}

impl StdoutSink<Stdout> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_writer(name, tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> StdoutSink<W> {
    /// Same output format on another writer
    pub fn with_writer(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer,
            lines: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: AsyncWrite + Unpin + Send> TwistSink for StdoutSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "stdout_sink_write",
        skip(self, sample),
        fields(sink = %self.name, stamp = sample.header.stamp)
    )]
    async fn write(&mut self, sample: &TwistStamped) -> Result<(), ContractError> {
        let line = encode_line(&self.name, sample)?;
        self.writer
            .write_all(&line)
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        self.lines += 1;
        Ok(())
    }

    #[instrument(name = "stdout_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "stdout_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, lines = self.lines, "StdoutSink closed");
        Ok(())
    }
}
