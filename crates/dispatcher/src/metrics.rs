//! Per-sink delivery counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single sink, shared between handle and worker
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Samples accepted into the queue
    enqueued: AtomicU64,
    /// Samples the sink wrote
    written: AtomicU64,
    /// Samples the sink failed to write
    failed: AtomicU64,
    /// Samples refused because the queue was full
    dropped: AtomicU64,
    /// Stamp of the last written sample (f64 bits, NaN until the first write)
    last_written_stamp: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self {
            last_written_stamp: AtomicU64::new(f64::NAN.to_bits()),
            ..Default::default()
        }
    }

    pub fn inc_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_written(&self, stamp: f64) {
        self.written.fetch_add(1, Ordering::Relaxed);
        self.last_written_stamp
            .store(stamp.to_bits(), Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stamp of the last written sample
    pub fn last_written_stamp(&self) -> Option<f64> {
        let stamp = f64::from_bits(self.last_written_stamp.load(Ordering::Relaxed));
        (!stamp.is_nan()).then_some(stamp)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            written: self.written(),
            failed: self.failed(),
            dropped: self.dropped(),
            last_written_stamp: self.last_written_stamp(),
        }
    }
}

/// Point-in-time copy of `SinkMetrics`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    pub enqueued: u64,
    pub written: u64,
    pub failed: u64,
    pub dropped: u64,
    pub last_written_stamp: Option<f64>,
}

impl MetricsSnapshot {
    /// Samples offered to this sink, queued or not
    pub fn offered(&self) -> u64 {
        self.enqueued + self.dropped
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "written={}, failed={}, dropped={}",
            self.written, self.failed, self.dropped
        )?;
        if let Some(stamp) = self.last_written_stamp {
            write!(f, ", last_stamp={:.3}", stamp)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let metrics = SinkMetrics::new();
        assert_eq!(metrics.last_written_stamp(), None);

        metrics.inc_enqueued();
        metrics.inc_enqueued();
        metrics.record_written(12.5);
        metrics.inc_failed();
        metrics.inc_dropped();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.offered(), 3);
        assert_eq!(snapshot.written, 1);
        assert_eq!(snapshot.last_written_stamp, Some(12.5));
        assert_eq!(
            snapshot.to_string(),
            "written=1, failed=1, dropped=1, last_stamp=12.500"
        );
    }
}
