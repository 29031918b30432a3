//! ROS-style command line arguments
//!
//! Any argument containing `:=` is taken out before clap sees the command
//! line. `_name:=value` sets the private parameter `name`; every other
//! `from:=to` is a remapping, which this node accepts and ignores.

use std::collections::HashMap;

use tracing::debug;

/// Arguments pulled out of the command line
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RosArgs {
    /// `_name:=value` assignments, by name
    pub private_params: HashMap<String, String>,
    /// Remappings and special (`__name:=`) assignments
    pub remappings: Vec<(String, String)>,
}

impl RosArgs {
    pub fn private_param(&self, name: &str) -> Option<&str> {
        self.private_params.get(name).map(String::as_str)
    }

    /// Log what the node ignores
    pub fn log_ignored(&self) {
        for (from, to) in &self.remappings {
            debug!(from = %from, to = %to, "Ignoring remapping argument");
        }
    }
}

/// Separate `:=` arguments from the rest, keeping the rest in order
pub fn split_ros_args<I>(args: I) -> (Vec<String>, RosArgs)
where
    I: IntoIterator<Item = String>,
{
    let mut plain = Vec::new();
    let mut ros = RosArgs::default();

    for arg in args {
        let Some((name, value)) = arg.split_once(":=") else {
            plain.push(arg);
            continue;
        };

        match name.strip_prefix('_') {
            Some(param) if !param.is_empty() && !param.starts_with('_') => {
                ros.private_params
                    .insert(param.to_string(), value.to_string());
            }
            _ => ros.remappings.push((name.to_string(), value.to_string())),
        }
    }

    (plain, ros)
}
