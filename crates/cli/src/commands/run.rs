//! Implementation of the node invocation.

use std::path::PathBuf;

use config_loader::ConfigLoader;
use contracts::{FramePair, NodeConfig};
use sampler::{resolve_rate, shutdown_channel, RateSource};
use tf_buffer::{FeedConfig, FeedSource};
use tracing::{debug, info, warn};

use crate::args::RosArgs;
use crate::cli::Cli;
use crate::error::{CliError, Result};
use crate::pipeline::{Node, NodeSettings};

/// Validated invocation
#[derive(Debug, Clone)]
pub struct NodeArgs {
    pub frames: FramePair,
    pub rate_arg: Option<String>,
    pub config_path: Option<PathBuf>,
    pub feed: FeedConfig,
    pub ros: RosArgs,
    pub quiet: bool,
}

impl NodeArgs {
    /// Check the frame ids; anything wrong here is a usage error
    pub fn from_cli(cli: &Cli, ros: RosArgs) -> Result<Self> {
        let frames = FramePair::new(cli.source_frame.as_str(), cli.target_frame.as_str())
            .map_err(|e| CliError::usage(e.to_string()))?;

        Ok(Self {
            frames,
            rate_arg: cli.rate_hz.clone(),
            config_path: cli.config.clone(),
            feed: FeedConfig {
                source: FeedSource::parse(&cli.transforms),
                pace: cli.pace,
            },
            ros,
            quiet: cli.quiet,
        })
    }

    /// Load the config and settle the rate
    pub fn resolve(self) -> Result<(NodeSettings, RateSource)> {
        self.ros.log_ignored();

        let mut config = ConfigLoader::load_or_default(self.config_path.as_deref())?;
        apply_private_params(&mut config, &self.ros);

        let configured = self.config_path.is_some().then_some(config.params.rate);
        let (rate_hz, rate_source) = resolve_rate(
            self.rate_arg.as_deref(),
            self.ros.private_param("rate"),
            configured,
        );

        let settings = NodeSettings {
            frames: self.frames,
            rate_hz,
            feed: self.feed,
            config,
        };
        Ok((settings, rate_source))
    }
}

/// Private parameters other than `rate` override the config file
fn apply_private_params(config: &mut NodeConfig, ros: &RosArgs) {
    for (name, value) in &ros.private_params {
        match name.as_str() {
            "rate" => {}
            "cache_time" => match value.trim().parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs > 0.0 => config.params.cache_time = secs,
                _ => warn!(value = %value, "Ignoring invalid _cache_time"),
            },
            _ => debug!(param = %name, "Ignoring unknown private parameter"),
        }
    }
}

/// Run the node until Ctrl+C / SIGTERM
pub async fn run_node(args: NodeArgs) -> Result<()> {
    let quiet = args.quiet;
    let (settings, rate_source) = args.resolve()?;

    info!(
        source_frame = %settings.frames.source_frame,
        target_frame = %settings.frames.target_frame,
        rate_hz = settings.rate_hz,
        rate_source = %rate_source,
        "tf-velocity starting"
    );

    let (trigger, signal) = shutdown_channel();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("Received shutdown signal, stopping sampler...");
        trigger.trigger();
    });

    let stats = Node::new(settings).run(signal).await?;

    info!(
        ticks = stats.sampler.ticks(),
        published = stats.sampler.published(),
        failed = stats.sampler.failed(),
        dropped = stats.dropped(),
        "tf-velocity finished"
    );
    if !quiet {
        stats.print_summary();
    }
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves, so the trigger held
/// by the caller is not dropped.
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
