//! # Dispatcher
//!
//! Fans each published twist out to the configured sinks. Every sink gets
//! its own bounded queue and worker, so a slow or failing sink never holds
//! up the sampler or the other sinks.

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{PublishSink, TwistSink, TwistStamped};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, FileSinkConfig, LogSink, StdoutSink, DEFAULT_FILE_SINK_PATH};
