//! FileSink - appends JSON lines to a file

use std::collections::HashMap;
use std::path::PathBuf;

use contracts::{ContractError, TwistSink, TwistStamped};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use super::encode_line;
use crate::error::DispatcherError;

/// Output path when `params.path` is absent
pub const DEFAULT_FILE_SINK_PATH: &str = "./tf_velocity.jsonl";

/// Configuration for FileSink
#[derive(Debug, Clone, PartialEq)]
pub struct FileSinkConfig {
    pub path: PathBuf,
    /// Append to an existing file instead of truncating it
    pub append: bool,
}

impl FileSinkConfig {
    /// Read `path` and `append` from the sink's params
    pub fn from_params(
        sink_name: &str,
        params: &HashMap<String, String>,
    ) -> Result<Self, DispatcherError> {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_SINK_PATH));

        let append = match params.get("append").map(|v| v.trim()) {
            None | Some("true") => true,
            Some("false") => false,
            Some(other) => {
                return Err(DispatcherError::invalid_param(sink_name, "append", other));
            }
        };

        Ok(Self { path, append })
    }
}

pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writer: BufWriter<File>,
    lines: u64,
}

impl FileSink {
    /// Open (or create) the output file, creating parent directories
    pub async fn open(
        name: impl Into<String>,
        config: FileSinkConfig,
    ) -> Result<Self, DispatcherError> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if config.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options.open(&config.path).await?;

        Ok(Self {
            name: name.into(),
            config,
            writer: BufWriter::new(file),
            lines: 0,
        })
    }

    /// Build from the sink's params (for the factory)
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, DispatcherError> {
        let name = name.into();
        let config = FileSinkConfig::from_params(&name, params)?;
        Self::open(name, config).await
    }

    pub fn path(&self) -> &std::path::Path {
        &self.config.path
    }

    fn write_error(&self, e: std::io::Error) -> ContractError {
        ContractError::sink_write(&self.name, format!("{}: {}", self.config.path.display(), e))
    }
}

impl TwistSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, sample),
        fields(sink = %self.name, stamp = sample.header.stamp)
    )]
    async fn write(&mut self, sample: &TwistStamped) -> Result<(), ContractError> {
        let line = encode_line(&self.name, sample)?;
        if let Err(e) = self.writer.write_all(&line).await {
            return Err(self.write_error(e));
        }
        self.lines += 1;
        Ok(())
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        match self.writer.flush().await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.write_error(e)),
        }
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush().await?;
        debug!(
            sink = %self.name,
            path = %self.config.path.display(),
            lines = self.lines,
            "FileSink closed"
        );
        Ok(())
    }
}
