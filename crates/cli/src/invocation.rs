//! Command-line gate: argv in, validated invocation or exit status out.

use std::io::Write;

use clap::error::ErrorKind;
use clap::Parser;

use crate::args::split_ros_args;
use crate::cli::{Cli, USAGE};
use crate::commands::NodeArgs;
use crate::error::EXIT_USAGE;

/// A command line that passed the usage gate
#[derive(Debug)]
pub struct Invocation {
    pub cli: Cli,
    pub args: NodeArgs,
}

/// Split ROS-style args, parse and validate
///
/// On a malformed invocation the usage text goes to `usage_out` and the
/// error is `EXIT_USAGE`. `--help` and `--version` print and yield 0.
pub fn parse_invocation<I, W>(argv: I, usage_out: &mut W) -> Result<Invocation, u8>
where
    I: IntoIterator<Item = String>,
    W: Write,
{
    let (plain, ros) = split_ros_args(argv);

    let cli = match Cli::try_parse_from(plain) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return Err(0);
        }
        Err(e) => {
            let _ = e.print();
            let _ = usage_out.write_all(USAGE.as_bytes());
            return Err(EXIT_USAGE);
        }
    };

    match NodeArgs::from_cli(&cli, ros) {
        Ok(args) => Ok(Invocation { cli, args }),
        Err(e) => {
            eprintln!("tf-velocity: {e}");
            let _ = usage_out.write_all(USAGE.as_bytes());
            Err(e.exit_status())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(argv: &[&str]) -> (Result<Invocation, u8>, String) {
        let mut out = Vec::new();
        let result = parse_invocation(argv.iter().map(|s| s.to_string()), &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_wrong_positional_counts_print_usage() {
        for argv in [
            &["tf-velocity"][..],
            &["tf-velocity", "odom"][..],
            &["tf-velocity", "odom", "base_link", "10", "extra"][..],
        ] {
            let (result, out) = gate(argv);
            assert_eq!(result.unwrap_err(), EXIT_USAGE, "argv: {argv:?}");
            assert!(out.starts_with("Usage: tf-velocity"));
        }
    }

    #[test]
    fn test_ros_args_are_not_counted() {
        let (result, out) = gate(&["tf-velocity", "_rate:=5", "odom", "__name:=tf_vel"]);
        assert_eq!(result.unwrap_err(), EXIT_USAGE);
        assert!(out.contains("Usage:"));

        let (result, out) = gate(&["tf-velocity", "odom", "_rate:=5", "base_link"]);
        let invocation = result.unwrap();
        assert_eq!(invocation.args.frames.target_frame, "base_link");
        assert_eq!(invocation.args.rate_arg, None);
        assert_eq!(invocation.args.ros.private_param("rate"), Some("5"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_three_positionals_pass() {
        let (result, out) = gate(&["tf-velocity", "/odom", "/base_link", "10"]);
        let invocation = result.unwrap();
        assert_eq!(invocation.args.frames.source_frame, "odom");
        assert_eq!(invocation.args.rate_arg.as_deref(), Some("10"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_frame_prints_usage() {
        let (result, out) = gate(&["tf-velocity", "odom", ""]);
        assert_eq!(result.unwrap_err(), EXIT_USAGE);
        assert!(out.contains("Usage:"));
    }

    #[test]
    fn test_help_and_version_exit_zero() {
        let (result, out) = gate(&["tf-velocity", "--help"]);
        assert_eq!(result.unwrap_err(), 0);
        assert!(out.is_empty());

        let (result, _) = gate(&["tf-velocity", "--version"]);
        assert_eq!(result.unwrap_err(), 0);
    }
}
