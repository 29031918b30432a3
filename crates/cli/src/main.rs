//! # tf-velocity
//!
//! Publishes the averaged velocity of one coordinate frame relative to
//! another at a fixed rate.
//!
//! ```text
//! tf-velocity <source_frame> <target_frame> [rate_hz]
//! ```

mod args;
mod cli;
mod commands;
mod error;
mod invocation;
mod pipeline;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use observability::ObservabilityConfig;
use tracing::error;

use cli::Cli;
use commands::run_node;
use error::EXIT_FAILURE;
use invocation::{parse_invocation, Invocation};

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("tf-velocity: failed to start tokio runtime: {e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let status = runtime.block_on(run());

    // a stdin feed may still be parked in a blocking read
    runtime.shutdown_timeout(Duration::from_millis(200));
    ExitCode::from(status)
}

async fn run() -> u8 {
    let argv = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());
    let Invocation { cli, args } = match parse_invocation(argv, &mut std::io::stdout()) {
        Ok(invocation) => invocation,
        Err(status) => return status,
    };

    if let Err(e) = init_observability(&cli) {
        eprintln!("tf-velocity: {e:#}");
        return EXIT_FAILURE;
    }

    match run_node(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "tf-velocity failed");
            e.exit_status()
        }
    }
}

/// Logging (stderr) and the optional Prometheus endpoint
fn init_observability(cli: &Cli) -> anyhow::Result<()> {
    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: cli.metrics_port(),
        default_log_level: cli.default_log_level().to_string(),
    })
    .context("Failed to initialize logging")
}
