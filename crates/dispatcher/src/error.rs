//! Dispatcher error types

use thiserror::Error;

/// Errors raised while building sinks
#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// A sink parameter has a value the sink cannot use
    #[error("sink '{sink}': invalid value '{value}' for param '{key}'")]
    InvalidParam {
        sink: String,
        key: String,
        value: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_param(
        sink: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidParam {
            sink: sink.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}
