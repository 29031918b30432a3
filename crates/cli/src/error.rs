//! Error types for CLI operations.

use thiserror::Error;

/// Exit status for a malformed invocation
pub const EXIT_USAGE: u8 = 255;

/// Exit status for any other startup failure
pub const EXIT_FAILURE: u8 = 1;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Wrong positional arguments or empty frame ids
    #[error("invalid arguments: {message}")]
    Usage { message: String },

    /// Configuration file unreadable or invalid
    #[error("configuration error: {0}")]
    Config(#[from] contracts::ContractError),

    /// Transform stream could not be opened
    #[error("cannot open transform stream '{path}': {source}")]
    Feed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Sink setup failed
    #[error("sink setup failed: {0}")]
    Sinks(#[from] dispatcher::DispatcherError),

    /// Generic error wrapper
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub fn feed(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Feed {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this error
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Usage { .. } => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
