//! CLI argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Printed on stdout when the positional arguments are wrong
pub const USAGE: &str = "\
Usage: tf-velocity [OPTIONS] <source_frame> <target_frame> [rate_hz]

Publishes the velocity of target_frame relative to source_frame, averaged
over one second, expressed in source_frame.

rate_hz defaults to the `rate` parameter (_rate:=<hz> or params.rate in the
config file), then to 1.0.

Example: tf-velocity odom base_link 10
";

/// tf-velocity - fixed-rate twist between two coordinate frames
#[derive(Parser, Debug)]
#[command(
    name = "tf-velocity",
    version,
    about = "Publish the averaged velocity between two coordinate frames",
    long_about = "Samples the transform history between two frames at a fixed rate and \n\
                  publishes the velocity of the target frame as seen from the source \n\
                  frame, one stamped record per tick.",
    allow_negative_numbers = true
)]
pub struct Cli {
    /// Frame the velocity is observed from and expressed in
    pub source_frame: String,

    /// Frame whose motion is tracked
    pub target_frame: String,

    /// Sampling rate in Hz (parsed leniently, like C atof)
    pub rate_hz: Option<String>,

    /// Node configuration file (TOML or JSON)
    #[arg(short, long, env = "TF_VELOCITY_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON-lines transform stream, `-` for stdin
    #[arg(short, long, default_value = "-", env = "TF_VELOCITY_TRANSFORMS")]
    pub transforms: String,

    /// Replay the transform stream with its original timing
    #[arg(long)]
    pub pace: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value = "pretty", env = "TF_VELOCITY_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "TF_VELOCITY_METRICS_PORT")]
    pub metrics_port: u16,
}

impl Cli {
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    pub fn metrics_port(&self) -> Option<u16> {
        (self.metrics_port != 0).then_some(self.metrics_port)
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_two_and_three_positionals() {
        let cli = Cli::try_parse_from(["tf-velocity", "odom", "base_link"]).unwrap();
        assert_eq!(cli.source_frame, "odom");
        assert_eq!(cli.target_frame, "base_link");
        assert_eq!(cli.rate_hz, None);
        assert_eq!(cli.transforms, "-");
        assert_eq!(cli.metrics_port(), None);

        let cli = Cli::try_parse_from(["tf-velocity", "odom", "base_link", "10"]).unwrap();
        assert_eq!(cli.rate_hz.as_deref(), Some("10"));
    }

    #[test]
    fn test_wrong_positional_counts_fail() {
        assert!(Cli::try_parse_from(["tf-velocity"]).is_err());
        assert!(Cli::try_parse_from(["tf-velocity", "odom"]).is_err());
        assert!(Cli::try_parse_from(["tf-velocity", "a", "b", "1", "extra"]).is_err());
    }

    #[test]
    fn test_negative_rate_is_positional() {
        let cli = Cli::try_parse_from(["tf-velocity", "odom", "base_link", "-2"]).unwrap();
        assert_eq!(cli.rate_hz.as_deref(), Some("-2"));
    }

    #[test]
    fn test_options_do_not_count_as_positionals() {
        let cli = Cli::try_parse_from([
            "tf-velocity",
            "-c",
            "node.toml",
            "odom",
            "--pace",
            "base_link",
            "-t",
            "tf.jsonl",
            "-vv",
            "--metrics-port",
            "9100",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("node.toml")));
        assert_eq!(cli.transforms, "tf.jsonl");
        assert!(cli.pace);
        assert_eq!(cli.default_log_level(), "trace");
        assert_eq!(cli.metrics_port(), Some(9100));
    }

    #[test]
    fn test_help_and_version_are_not_usage_errors() {
        let err = Cli::try_parse_from(["tf-velocity", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        let err = Cli::try_parse_from(["tf-velocity", "--version"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }
}
