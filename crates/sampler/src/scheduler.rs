//! Fixed-rate tick scheduling

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::shutdown::ShutdownSignal;

/// Upper bound on the tick period
pub const MAX_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Tick period for a rate in Hz
///
/// Rates that are not positive, or not finite, map to a zero period.
/// Very small positive rates are capped at `MAX_PERIOD`.
pub fn period_for_rate(rate_hz: f64) -> Duration {
    if !rate_hz.is_finite() || rate_hz <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(1.0 / rate_hz)
        .map(|period| period.min(MAX_PERIOD))
        .unwrap_or(MAX_PERIOD)
}

/// Why `wait_next` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Tick,
    Cancelled,
}

/// Sleeps to the next tick boundary
///
/// Boundaries are anchored at creation time and spaced by the period. A
/// tick that overruns its slot skips the missed boundaries instead of
/// bursting to catch up. A zero period only yields to the runtime.
#[derive(Debug)]
pub struct RateScheduler {
    period: Duration,
    interval: Option<Interval>,
}

impl RateScheduler {
    pub fn new(rate_hz: f64) -> Self {
        Self::with_period(period_for_rate(rate_hz))
    }

    pub fn with_period(period: Duration) -> Self {
        let interval = (!period.is_zero()).then(|| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });
        Self { period, interval }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next boundary, or for cancellation
    pub async fn wait_next(&mut self, shutdown: &mut ShutdownSignal) -> Wake {
        let Some(interval) = self.interval.as_mut() else {
            tokio::task::yield_now().await;
            return if shutdown.is_cancelled() {
                Wake::Cancelled
            } else {
                Wake::Tick
            };
        };

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => Wake::Cancelled,
            _ = interval.tick() => Wake::Tick,
        }
    }
}
