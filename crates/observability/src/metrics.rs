//! Sampler metrics
//!
//! Prometheus-facing counters/gauges recorded through the `metrics` facade,
//! plus an in-memory aggregator used for the shutdown summary.

use std::collections::HashMap;

use contracts::TwistStamped;
use metrics::{counter, gauge, histogram};

/// Record a successful tick
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_twist_published;
///
/// record_twist_published(&sample);
/// sink.publish(sample);
/// ```
pub fn record_twist_published(sample: &TwistStamped) {
    counter!("tf_velocity_ticks_total", "outcome" => "published").increment(1);

    gauge!("tf_velocity_last_stamp_seconds").set(sample.header.stamp);

    let linear = sample.twist.linear.norm();
    let angular = sample.twist.angular.norm();
    gauge!("tf_velocity_linear_speed").set(linear);
    gauge!("tf_velocity_angular_speed").set(angular);
    histogram!("tf_velocity_linear_speed_hist").record(linear);
}

/// Record a failed tick
pub fn record_lookup_failure(kind: &'static str) {
    counter!("tf_velocity_ticks_total", "outcome" => "failed").increment(1);
    counter!("tf_velocity_lookup_failures_total", "kind" => kind).increment(1);
}

/// Record the outcome of the startup availability wait
pub fn record_initial_wait(available: bool, waited_ms: f64) {
    let status = if available { "available" } else { "timeout" };
    counter!("tf_velocity_initial_wait_total", "status" => status).increment(1);
    histogram!("tf_velocity_initial_wait_ms").record(waited_ms);
}

/// Record a sink write
pub fn record_sink_write(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "tf_velocity_sink_writes_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record a sample dropped because a sink queue was full
pub fn record_sample_dropped(sink_name: &str) {
    counter!(
        "tf_velocity_samples_dropped_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

/// Record the lookup duration of one tick
pub fn record_lookup_latency_ms(latency_ms: f64) {
    histogram!("tf_velocity_lookup_latency_ms").record(latency_ms);
}

/// Sampler metrics aggregator
///
/// Aggregates in memory for the summary printed at shutdown.
#[derive(Debug, Clone, Default)]
pub struct SamplerMetricsAggregator {
    /// Ticks executed
    pub total_ticks: u64,

    /// Ticks that published a sample
    pub published: u64,

    /// Ticks that failed the lookup
    pub failed: u64,

    /// Failure count per error kind
    pub failure_kinds: HashMap<String, u64>,

    /// Linear speed (m/s) of published samples
    pub linear_speed: RunningStats,

    /// Angular speed (rad/s) of published samples
    pub angular_speed: RunningStats,

    /// Lookup duration (ms)
    pub lookup_latency_ms: RunningStats,
}

impl SamplerMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for a published sample
    pub fn record_published(&mut self, sample: &TwistStamped) {
        self.total_ticks += 1;
        self.published += 1;
        self.linear_speed.push(sample.twist.linear.norm());
        self.angular_speed.push(sample.twist.angular.norm());
    }

    /// Account for a failed lookup
    pub fn record_failed(&mut self, kind: &str) {
        self.total_ticks += 1;
        self.failed += 1;
        *self.failure_kinds.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn record_lookup_latency(&mut self, latency_ms: f64) {
        self.lookup_latency_ms.push(latency_ms);
    }

    /// Build a summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_ticks: self.total_ticks,
            published: self.published,
            failed: self.failed,
            failure_rate: if self.total_ticks > 0 {
                self.failed as f64 / self.total_ticks as f64 * 100.0
            } else {
                0.0
            },
            linear_speed: StatsSummary::from(&self.linear_speed),
            angular_speed: StatsSummary::from(&self.angular_speed),
            lookup_latency_ms: StatsSummary::from(&self.lookup_latency_ms),
            failure_kinds: self.failure_kinds.clone(),
        }
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub published: u64,
    pub failed: u64,
    pub failure_rate: f64,
    pub linear_speed: StatsSummary,
    pub angular_speed: StatsSummary,
    pub lookup_latency_ms: StatsSummary,
    pub failure_kinds: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Velocity Sampler Summary ===")?;
        writeln!(f, "Ticks: {}", self.total_ticks)?;
        writeln!(f, "Published: {}", self.published)?;
        writeln!(f, "Failed: {} ({:.2}%)", self.failed, self.failure_rate)?;
        writeln!(f, "Linear speed (m/s): {}", self.linear_speed)?;
        writeln!(f, "Angular speed (rad/s): {}", self.angular_speed)?;
        writeln!(f, "Lookup latency (ms): {}", self.lookup_latency_ms)?;

        if !self.failure_kinds.is_empty() {
            let mut kinds: Vec<_> = self.failure_kinds.iter().collect();
            kinds.sort();
            writeln!(f, "Failures by kind:")?;
            for (kind, count) in kinds {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Twist, Vector3};

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_counts_outcomes() {
        let mut aggregator = SamplerMetricsAggregator::new();
        let sample = TwistStamped::new(
            "odom",
            1.0,
            Twist::new(Vector3::new(3.0, 4.0, 0.0), Vector3::ZERO),
        );

        aggregator.record_published(&sample);
        aggregator.record_failed("extrapolation_past");
        aggregator.record_failed("extrapolation_past");
        aggregator.record_failed("unknown_frame");

        let summary = aggregator.summary();
        assert_eq!(summary.total_ticks, 4);
        assert_eq!(summary.published, 1);
        assert_eq!(summary.failed, 3);
        assert!((summary.failure_rate - 75.0).abs() < 1e-10);
        assert_eq!(summary.failure_kinds.get("extrapolation_past"), Some(&2));
        assert!((summary.linear_speed.mean - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = SamplerMetricsAggregator::new();
        aggregator.record_failed("timeout");

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Ticks: 1"));
        assert!(output.contains("100.00%"));
        assert!(output.contains("timeout: 1"));
        assert!(output.contains("Linear speed (m/s): N/A"));
    }
}
