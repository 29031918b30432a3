//! Dispatcher - fans published samples out to every sink

use contracts::{PublishSink, SinkConfig, SinkType, TwistStamped};
use tracing::{debug, info, instrument, warn};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink, StdoutSink};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub sinks: Vec<SinkConfig>,
}

/// Builds the sinks and spawns their workers
pub struct DispatcherBuilder {
    config: DispatcherConfig,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig) -> Self {
        Self { config }
    }

    /// Create every sink; fails on the first sink that cannot be created
    #[instrument(
        name = "dispatcher_builder_build",
        skip(self),
        fields(sink_count = self.config.sinks.len())
    )]
    pub async fn build(self) -> Result<Dispatcher, DispatcherError> {
        if self.config.sinks.is_empty() {
            warn!("No sinks configured, published samples will be discarded");
        }
        let mut handles = Vec::with_capacity(self.config.sinks.len());
        for sink_config in &self.config.sinks {
            match create_sink_handle(sink_config).await {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    Dispatcher::shutdown_handles(handles).await;
                    return Err(e);
                }
            }
        }
        Ok(Dispatcher::with_handles(handles))
    }
}

#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
async fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    let handle = match config.sink_type {
        SinkType::Stdout => {
            SinkHandle::spawn(StdoutSink::new(&config.name), config.queue_capacity)
        }
        SinkType::Log => SinkHandle::spawn(LogSink::new(&config.name), config.queue_capacity),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            debug!(path = %sink.path().display(), "File sink opened");
            SinkHandle::spawn(sink, config.queue_capacity)
        }
    };
    Ok(handle)
}

/// Publish sink backed by one queue per output
///
/// `publish` never waits: a sink whose queue is full loses that sample,
/// the others still get it.
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    published: u64,
}

impl Dispatcher {
    /// Dispatcher over already spawned handles
    pub fn with_handles(handles: Vec<SinkHandle>) -> Self {
        Self {
            handles,
            published: 0,
        }
    }

    pub fn sink_count(&self) -> usize {
        self.handles.len()
    }

    /// Samples handed to `publish` so far
    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Drain every sink and report its final counters
    #[instrument(name = "dispatcher_shutdown", skip(self), fields(sinks = self.handles.len()))]
    pub async fn shutdown(self) -> Vec<(String, MetricsSnapshot)> {
        let handles = self.handles;
        let metrics: Vec<_> = handles
            .iter()
            .map(|h| (h.name().to_string(), std::sync::Arc::clone(h.metrics())))
            .collect();

        Self::shutdown_handles(handles).await;

        let report: Vec<_> = metrics
            .into_iter()
            .map(|(name, m)| (name, m.snapshot()))
            .collect();
        info!(published = self.published, "Dispatcher shutdown complete");
        report
    }

    async fn shutdown_handles(handles: Vec<SinkHandle>) {
        for handle in handles {
            handle.shutdown().await;
        }
    }
}

impl PublishSink for Dispatcher {
    fn publish(&mut self, sample: TwistStamped) {
        self.published += 1;
        if let Some((last, rest)) = self.handles.split_last() {
            for handle in rest {
                handle.try_send(sample.clone());
            }
            last.try_send(sample);
        }
        if self.published.is_multiple_of(100) {
            debug!(published = self.published, "Dispatcher progress");
        }
    }
}

/// Build a dispatcher from sink configs
pub async fn create_dispatcher(
    sink_configs: Vec<SinkConfig>,
) -> Result<Dispatcher, DispatcherError> {
    DispatcherBuilder::new(DispatcherConfig {
        sinks: sink_configs,
    })
    .build()
    .await
}
