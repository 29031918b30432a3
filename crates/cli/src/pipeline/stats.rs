//! Statistics reported when the node stops.

use dispatcher::MetricsSnapshot;
use sampler::SamplerStats;
use tf_buffer::FeedStats;

/// Statistics from a node run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub sampler: SamplerStats,

    /// None when the feed was still open at shutdown
    pub feed: Option<FeedStats>,

    /// Final counters per sink
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

impl RunStats {
    /// Samples dropped across all sinks
    pub fn dropped(&self) -> u64 {
        self.sinks.iter().map(|(_, m)| m.dropped).sum()
    }

    /// Print the summary on stderr (stdout carries samples)
    pub fn print_summary(&self) {
        eprintln!("{}", self);
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sampler)?;

        match &self.feed {
            Some(feed) => writeln!(
                f,
                "Transform feed: {} lines, {} inserted, {} malformed, {} rejected",
                feed.lines, feed.inserted, feed.malformed, feed.rejected
            )?,
            None => writeln!(f, "Transform feed: still open at shutdown")?,
        }

        if !self.sinks.is_empty() {
            writeln!(f, "Sinks:")?;
            for (name, snapshot) in &self.sinks {
                writeln!(f, "  {}: {}", name, snapshot)?;
            }
        }
        Ok(())
    }
}
