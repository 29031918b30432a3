//! Time sources for tick stamps

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

/// Source of tick stamps (seconds)
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Wall clock, seconds since the UNIX epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Clock driven by tokio's timer
///
/// Reads `origin` at creation and advances with `tokio::time`, so it follows
/// the paused virtual clock in tests.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: f64,
    started: Instant,
}

impl TokioClock {
    pub fn starting_at(origin: f64) -> Self {
        Self {
            origin,
            started: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> f64 {
        self.origin + self.started.elapsed().as_secs_f64()
    }
}
