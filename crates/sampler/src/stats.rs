//! Sampler run statistics

use contracts::TwistStamped;
use observability::SamplerMetricsAggregator;

/// Statistics from a sampler run
///
/// Tick counts live in `metrics`; the accessors below read them from there.
#[derive(Debug, Clone, Default)]
pub struct SamplerStats {
    /// Whether the initial wait saw the transform
    pub initially_available: bool,

    /// Clock reading when the run started
    pub started_at: Option<f64>,

    /// Clock reading when the run stopped
    pub stopped_at: Option<f64>,

    /// Speed and failure breakdown
    pub metrics: SamplerMetricsAggregator,
}

impl SamplerStats {
    pub(crate) fn record_published(&mut self, sample: &TwistStamped) {
        self.metrics.record_published(sample);
    }

    pub(crate) fn record_failed(&mut self, kind: &str) {
        self.metrics.record_failed(kind);
    }

    /// Ticks executed
    pub fn ticks(&self) -> u64 {
        self.metrics.total_ticks
    }

    /// Ticks that published a sample
    pub fn published(&self) -> u64 {
        self.metrics.published
    }

    /// Ticks whose lookup failed
    pub fn failed(&self) -> u64 {
        self.metrics.failed
    }

    /// Seconds between start and stop (0 while running)
    pub fn duration(&self) -> f64 {
        match (self.started_at, self.stopped_at) {
            (Some(start), Some(stop)) => (stop - start).max(0.0),
            _ => 0.0,
        }
    }

    /// Published samples per second
    pub fn publish_rate(&self) -> f64 {
        let duration = self.duration();
        if duration > 0.0 {
            self.published() as f64 / duration
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for SamplerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Duration: {:.2}s", self.duration())?;
        writeln!(f, "Initial transform available: {}", self.initially_available)?;
        writeln!(f, "Publish rate: {:.2} Hz", self.publish_rate())?;
        write!(f, "{}", self.metrics.summary())
    }
}
