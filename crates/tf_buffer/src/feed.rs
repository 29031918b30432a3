//! TransformFeed - JSON-lines transform ingestion
//!
//! One `TransformStamped` JSON object per line, from a file or stdin.
//! Bad lines are logged and skipped; the feed never takes the buffer down.

use std::path::PathBuf;
use std::time::Duration;

use contracts::{ContractError, TransformStamped};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::shared::SharedTransformBuffer;

/// Where transform records come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Stdin,
    File(PathBuf),
}

impl FeedSource {
    /// `-` means stdin, anything else is a path
    pub fn parse(value: &str) -> Self {
        if value == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(value))
        }
    }
}

/// Feed configuration
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub source: FeedSource,
    /// Replay records with their original spacing
    pub pace: bool,
}

/// Counters reported when the feed ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Lines read (including blank/comment lines)
    pub lines: u64,
    /// Records accepted by the buffer
    pub inserted: u64,
    /// Lines that failed to parse
    pub malformed: u64,
    /// Records refused by the buffer
    pub rejected: u64,
}

type FeedReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Background transform ingestion
pub struct TransformFeed {
    reader: FeedReader,
    buffer: SharedTransformBuffer,
    pace: bool,
}

impl TransformFeed {
    /// Open the configured source
    ///
    /// # Errors
    /// Returns the IO error if the file cannot be opened.
    pub async fn open(
        config: &FeedConfig,
        buffer: SharedTransformBuffer,
    ) -> std::io::Result<Self> {
        let reader: FeedReader = match &config.source {
            FeedSource::Stdin => Box::new(BufReader::new(tokio::io::stdin())),
            FeedSource::File(path) => {
                let file = tokio::fs::File::open(path).await?;
                Box::new(BufReader::new(file))
            }
        };
        Ok(Self::from_reader(reader, buffer, config.pace))
    }

    /// Build a feed over any buffered reader
    pub fn from_reader(reader: FeedReader, buffer: SharedTransformBuffer, pace: bool) -> Self {
        Self {
            reader,
            buffer,
            pace,
        }
    }

    /// Spawn the feed as a background task
    pub fn spawn(self) -> JoinHandle<FeedStats> {
        tokio::spawn(self.run())
    }

    /// Read until EOF
    #[instrument(name = "transform_feed_run", skip(self), fields(pace = self.pace))]
    pub async fn run(self) -> FeedStats {
        let mut stats = FeedStats::default();
        let mut lines = self.reader.lines();
        let mut pacer = Pacer::default();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "transform feed read failed, stopping feed");
                    break;
                }
            };
            stats.lines += 1;

            let tf = match parse_line(&line, stats.lines as usize) {
                Ok(Some(tf)) => tf,
                Ok(None) => continue,
                Err(e) => {
                    stats.malformed += 1;
                    warn!(error = %e, "skipping malformed transform");
                    continue;
                }
            };

            if self.pace && !tf.is_static {
                pacer.wait_for(tf.stamp()).await;
            }

            match self.buffer.insert(tf) {
                Ok(()) => stats.inserted += 1,
                Err(e) => {
                    stats.rejected += 1;
                    warn!(error = %e, "transform rejected");
                }
            }

            if stats.lines.is_multiple_of(1000) {
                debug!(lines = stats.lines, inserted = stats.inserted, "Transform feed progress");
            }
        }

        info!(
            lines = stats.lines,
            inserted = stats.inserted,
            malformed = stats.malformed,
            rejected = stats.rejected,
            "Transform feed reached end of input"
        );
        stats
    }
}

/// Parse one feed line
///
/// Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<TransformStamped>, ContractError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| ContractError::TransformParse {
            line: line_no,
            message: e.to_string(),
        })
}

/// Maps stream time onto the local clock, anchored at the first record
#[derive(Debug, Default)]
struct Pacer {
    anchor: Option<(f64, Instant)>,
}

impl Pacer {
    async fn wait_for(&mut self, stamp: f64) {
        let (first_stamp, first_instant) = *self.anchor.get_or_insert((stamp, Instant::now()));
        let offset = stamp - first_stamp;
        if offset > 0.0 && offset.is_finite() {
            tokio::time::sleep_until(first_instant + Duration::from_secs_f64(offset)).await;
        }
    }
}
