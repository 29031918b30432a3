//! Node wiring: transform feed, buffer, sampler and sinks.

mod orchestrator;
mod stats;

pub use orchestrator::{Node, NodeSettings};
pub use stats::RunStats;
