//! Layered error definitions
//!
//! Categorized by source: config / transform lookup / sink

use thiserror::Error;

/// Transform lookup failure
///
/// Returned by transform history providers. Every variant is recoverable from
/// the sampler's point of view: the tick is skipped and the next one retries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    /// Frame has never been seen by the provider
    #[error("frame '{frame}' does not exist")]
    UnknownFrame { frame: String },

    /// Both frames exist but share no common ancestor
    #[error("frames '{source_frame}' and '{target_frame}' are not connected")]
    Disconnected {
        source_frame: String,
        target_frame: String,
    },

    /// Requested time is older than the oldest buffered transform
    #[error(
        "lookup would require extrapolation into the past: requested {requested:.6}, earliest data at {earliest:.6}"
    )]
    ExtrapolationPast { requested: f64, earliest: f64 },

    /// Requested time is newer than the newest buffered transform
    #[error(
        "lookup would require extrapolation into the future: requested {requested:.6}, latest data at {latest:.6}"
    )]
    ExtrapolationFuture { requested: f64, latest: f64 },

    /// Availability wait gave up
    #[error("timed out after {waited_ms}ms waiting for transform '{target_frame}' -> '{source_frame}'")]
    Timeout {
        source_frame: String,
        target_frame: String,
        waited_ms: u64,
    },

    /// Any other provider fault
    #[error("{message}")]
    Other { message: String },
}

impl LookupError {
    /// Create unknown frame error
    pub fn unknown_frame(frame: impl Into<String>) -> Self {
        Self::UnknownFrame {
            frame: frame.into(),
        }
    }

    /// Create disconnected graph error
    pub fn disconnected(source_frame: impl Into<String>, target_frame: impl Into<String>) -> Self {
        Self::Disconnected {
            source_frame: source_frame.into(),
            target_frame: target_frame.into(),
        }
    }

    /// Create generic provider error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Short machine-friendly label (used for metrics)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownFrame { .. } => "unknown_frame",
            Self::Disconnected { .. } => "disconnected",
            Self::ExtrapolationPast { .. } => "extrapolation_past",
            Self::ExtrapolationFuture { .. } => "extrapolation_future",
            Self::Timeout { .. } => "timeout",
            Self::Other { .. } => "other",
        }
    }
}

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Transform Errors =====
    /// Transform record could not be parsed from the feed
    #[error("transform parse error at line {line}: {message}")]
    TransformParse { line: usize, message: String },

    /// Transform record refused by the buffer
    #[error("transform '{parent}' -> '{child}' rejected: {message}")]
    TransformRejected {
        parent: String,
        child: String,
        message: String,
    },

    /// Lookup failure surfaced outside the sampling loop
    #[error(transparent)]
    Lookup(#[from] LookupError),

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create transform rejection error
    pub fn transform_rejected(
        parent: impl Into<String>,
        child: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::TransformRejected {
            parent: parent.into(),
            child: child.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
