//! Sink implementations

mod file;
mod log;
mod stdout;

pub use self::file::{FileSink, FileSinkConfig, DEFAULT_FILE_SINK_PATH};
pub use self::log::LogSink;
pub use self::stdout::StdoutSink;

use contracts::{ContractError, TwistStamped};

/// One JSON object plus a trailing newline
fn encode_line(sink_name: &str, sample: &TwistStamped) -> Result<Vec<u8>, ContractError> {
    let mut line = serde_json::to_vec(sample)
        .map_err(|e| ContractError::sink_write(sink_name, e.to_string()))?;
    line.push(b'\n');
    Ok(line)
}
