//! Node orchestrator - builds the components and runs the sampler.

use std::time::Duration;

use contracts::{FramePair, NodeConfig};
use dispatcher::create_dispatcher;
use sampler::{SamplerConfig, ShutdownSignal, VelocitySampler};
use tf_buffer::{BufferConfig, FeedConfig, FeedSource, SharedTransformBuffer, TransformFeed};
use tracing::{info, warn};

use super::RunStats;
use crate::error::{CliError, Result};

/// How long sinks get to drain after the sampler stops
const SINK_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything the node needs, resolved from the command line and config
#[derive(Debug, Clone)]
pub struct NodeSettings {
    pub frames: FramePair,
    pub rate_hz: f64,
    pub feed: FeedConfig,
    pub config: NodeConfig,
}

pub struct Node {
    settings: NodeSettings,
}

impl Node {
    pub fn new(settings: NodeSettings) -> Self {
        Self { settings }
    }

    /// Run until `shutdown` fires
    ///
    /// Startup failures (feed or sinks) are returned before the sampler
    /// starts. Once running, the node only stops on cancellation.
    pub async fn run(self, shutdown: ShutdownSignal) -> Result<RunStats> {
        let NodeSettings {
            frames,
            rate_hz,
            feed,
            config,
        } = self.settings;

        let buffer = SharedTransformBuffer::new(BufferConfig {
            cache_time: config.params.cache_time,
            ..Default::default()
        });

        let transform_feed = TransformFeed::open(&feed, buffer.clone())
            .await
            .map_err(|e| CliError::feed(feed_label(&feed.source), e))?;

        let dispatcher = create_dispatcher(config.sinks.clone()).await?;
        info!(
            sinks = dispatcher.sink_count(),
            source = %feed_label(&feed.source),
            pace = feed.pace,
            "Node components ready"
        );

        let feed_task = transform_feed.spawn();

        let mut velocity_sampler =
            VelocitySampler::new(SamplerConfig::new(frames, rate_hz), buffer, dispatcher);
        let sampler_stats = velocity_sampler.run(shutdown).await;
        let dispatcher = velocity_sampler.into_sink();

        let feed_stats = if feed_task.is_finished() {
            feed_task.await.ok()
        } else {
            feed_task.abort();
            None
        };

        let sinks = match tokio::time::timeout(SINK_DRAIN_TIMEOUT, dispatcher.shutdown()).await {
            Ok(report) => report,
            Err(_) => {
                warn!(
                    timeout_secs = SINK_DRAIN_TIMEOUT.as_secs(),
                    "Sinks did not drain in time"
                );
                Vec::new()
            }
        };

        Ok(RunStats {
            sampler: sampler_stats,
            feed: feed_stats,
            sinks,
        })
    }
}

fn feed_label(source: &FeedSource) -> String {
    match source {
        FeedSource::Stdin => "stdin".to_string(),
        FeedSource::File(path) => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SinkConfig, SinkType};
    use sampler::shutdown_channel;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn settings(feed: FeedSource, sinks: Vec<SinkConfig>) -> NodeSettings {
        NodeSettings {
            frames: FramePair::new("odom", "base_link").unwrap(),
            rate_hz: 10.0,
            feed: FeedConfig {
                source: feed,
                pace: false,
            },
            config: NodeConfig {
                sinks,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_missing_feed_file_fails_before_start() {
        let node = Node::new(settings(
            FeedSource::File(PathBuf::from("/nonexistent/tf.jsonl")),
            Vec::new(),
        ));
        let (_trigger, signal) = shutdown_channel();

        let err = node.run(signal).await.unwrap_err();
        assert!(matches!(err, CliError::Feed { .. }));
        assert_eq!(err.exit_status(), 1);
    }

    #[tokio::test]
    async fn test_bad_sink_fails_before_start() {
        let feed = tempfile::NamedTempFile::new().unwrap();
        let sink = SinkConfig {
            name: "file".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 4,
            params: HashMap::from([("append".to_string(), "nope".to_string())]),
        };
        let node = Node::new(settings(FeedSource::File(feed.path().to_path_buf()), vec![sink]));
        let (_trigger, signal) = shutdown_channel();

        let err = node.run(signal).await.unwrap_err();
        assert!(matches!(err, CliError::Sinks(_)));
    }
}
