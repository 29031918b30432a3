//! NodeConfig - Config Loader output
//!
//! Named parameters plus output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default sampling rate (Hz) for the `rate` parameter
pub const DEFAULT_RATE_HZ: f64 = 1.0;

/// Default transform history length per edge (seconds)
pub const DEFAULT_CACHE_TIME_S: f64 = 10.0;

/// Complete node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Named parameters
    #[serde(default)]
    pub params: NodeParams,

    /// Output routing
    #[serde(default = "default_sinks")]
    pub sinks: Vec<SinkConfig>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            params: NodeParams::default(),
            sinks: default_sinks(),
        }
    }
}

/// Named parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeParams {
    /// Sampling rate (Hz); not validated, non-positive values are caller responsibility
    #[serde(default = "default_rate")]
    pub rate: f64,

    /// Seconds of history kept per transform edge
    #[serde(default = "default_cache_time")]
    pub cache_time: f64,
}

impl Default for NodeParams {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE_HZ,
            cache_time: DEFAULT_CACHE_TIME_S,
        }
    }
}

fn default_rate() -> f64 {
    DEFAULT_RATE_HZ
}

fn default_cache_time() -> f64 {
    DEFAULT_CACHE_TIME_S
}

fn default_sinks() -> Vec<SinkConfig> {
    vec![SinkConfig {
        name: "stdout".to_string(),
        sink_type: SinkType::Stdout,
        queue_capacity: default_queue_capacity(),
        params: HashMap::new(),
    }]
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    64
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// JSON lines on standard output
    Stdout,
    /// JSON lines appended to a file
    File,
    /// Tracing log summary
    Log,
}
