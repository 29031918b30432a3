//! VelocitySampler - fixed-rate twist sampling loop
//!
//! Each tick asks the provider for the velocity of the target frame as seen
//! from the source frame, averaged over one second, at the latest time the
//! provider has data for. Successes are published, failures are logged and
//! the loop moves on.

use std::time::Duration;

use contracts::{
    FramePair, LookupError, LookupTime, PublishSink, TransformHistoryProvider, TwistStamped,
};
use observability::metrics::{
    record_initial_wait, record_lookup_failure, record_lookup_latency_ms, record_twist_published,
};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::scheduler::{period_for_rate, RateScheduler, Wake};
use crate::shutdown::ShutdownSignal;
use crate::stats::SamplerStats;

/// Window the velocity is averaged over
pub const AVERAGING_INTERVAL: Duration = Duration::from_secs(1);

/// Bound on the startup availability wait
pub const INITIAL_WAIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Sampler configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    pub frames: FramePair,
    pub rate_hz: f64,
    pub averaging_interval: Duration,
    pub initial_wait: Duration,
}

impl SamplerConfig {
    pub fn new(frames: FramePair, rate_hz: f64) -> Self {
        Self {
            frames,
            rate_hz,
            averaging_interval: AVERAGING_INTERVAL,
            initial_wait: INITIAL_WAIT_TIMEOUT,
        }
    }

    /// Tick period (zero when the rate is not a positive number)
    pub fn period(&self) -> Duration {
        period_for_rate(self.rate_hz)
    }
}

/// Lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    WaitingForInitialTransform,
    Running,
    Stopped,
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Published { stamp: f64 },
    Failed { stamp: f64, error: LookupError },
}

impl TickOutcome {
    pub fn stamp(&self) -> f64 {
        match self {
            Self::Published { stamp } | Self::Failed { stamp, .. } => *stamp,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

/// Velocity sampler
pub struct VelocitySampler<P, S, C = SystemClock> {
    config: SamplerConfig,
    provider: P,
    sink: S,
    clock: C,
    state: SamplerState,
    stats: SamplerStats,
    failure_streak: u64,
}

impl<P, S> VelocitySampler<P, S, SystemClock>
where
    P: TransformHistoryProvider,
    S: PublishSink,
{
    /// Sampler stamping ticks with the wall clock
    pub fn new(config: SamplerConfig, provider: P, sink: S) -> Self {
        Self::with_clock(config, provider, sink, SystemClock)
    }
}

impl<P, S, C> VelocitySampler<P, S, C>
where
    P: TransformHistoryProvider,
    S: PublishSink,
    C: Clock,
{
    pub fn with_clock(config: SamplerConfig, provider: P, sink: S, clock: C) -> Self {
        Self {
            config,
            provider,
            sink,
            clock,
            state: SamplerState::WaitingForInitialTransform,
            stats: SamplerStats::default(),
            failure_streak: 0,
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn stats(&self) -> &SamplerStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Bounded wait for the frame pair to become available
    ///
    /// Best effort: returns whether the transform showed up, and the caller
    /// proceeds either way.
    #[instrument(
        name = "sampler_initial_wait",
        skip(self),
        fields(frames = %self.config.frames)
    )]
    pub async fn wait_for_initial_transform(&mut self) -> bool {
        let started = Instant::now();
        let result = self
            .provider
            .wait_until_available(&self.config.frames, self.config.initial_wait)
            .await;
        let waited_ms = started.elapsed().as_secs_f64() * 1000.0;

        let available = match result {
            Ok(()) => {
                debug!(waited_ms, "Initial transform available");
                true
            }
            Err(e) => {
                warn!(error = %e, "Transform not available yet, starting anyway");
                false
            }
        };
        record_initial_wait(available, waited_ms);
        self.stats.initially_available = available;
        available
    }

    /// One sampling iteration
    ///
    /// Never fails: lookup errors are logged and reported in the outcome.
    pub async fn tick(&mut self) -> TickOutcome {
        let stamp = self.clock.now();
        let frames = &self.config.frames;

        let started = Instant::now();
        let result = self
            .provider
            .lookup_averaged_twist(
                &frames.target_frame,
                &frames.source_frame,
                LookupTime::Latest,
                self.config.averaging_interval,
            )
            .await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        record_lookup_latency_ms(latency_ms);
        self.stats.metrics.record_lookup_latency(latency_ms);

        match result {
            Ok(twist) => {
                let sample = TwistStamped::new(frames.source_frame.clone(), stamp, twist);
                if self.failure_streak > 0 {
                    info!(
                        stamp,
                        failed_ticks = self.failure_streak,
                        "transform available again"
                    );
                    self.failure_streak = 0;
                }
                record_twist_published(&sample);
                self.stats.record_published(&sample);
                self.sink.publish(sample);
                TickOutcome::Published { stamp }
            }
            Err(error) => {
                warn!(stamp, kind = error.kind(), "Failure at {stamp:.6}: {error}");
                record_lookup_failure(error.kind());
                self.stats.record_failed(error.kind());
                self.failure_streak += 1;
                TickOutcome::Failed { stamp, error }
            }
        }
    }

    /// Run until cancelled
    ///
    /// Cancellation is checked before every tick and also interrupts the
    /// initial wait and the inter-tick sleep. An in-flight lookup is not
    /// preempted.
    #[instrument(
        name = "sampler_run",
        skip(self, shutdown),
        fields(frames = %self.config.frames, rate_hz = self.config.rate_hz)
    )]
    pub async fn run(&mut self, mut shutdown: ShutdownSignal) -> SamplerStats {
        self.state = SamplerState::WaitingForInitialTransform;
        self.stats.started_at = Some(self.clock.now());

        let cancelled = tokio::select! {
            biased;
            _ = shutdown.cancelled() => true,
            _ = self.wait_for_initial_transform() => false,
        };
        if cancelled {
            info!("Cancelled during initial wait");
            return self.stop();
        }

        let mut scheduler = RateScheduler::new(self.config.rate_hz);
        if scheduler.period().is_zero() {
            warn!(
                rate_hz = self.config.rate_hz,
                "Rate is not a positive number, sampling without delay"
            );
        }
        self.state = SamplerState::Running;
        info!(period_ms = scheduler.period().as_millis() as u64, "Sampling started");

        loop {
            if shutdown.is_cancelled() {
                break;
            }
            self.tick().await;
            if scheduler.wait_next(&mut shutdown).await == Wake::Cancelled {
                break;
            }
        }

        self.stop()
    }

    fn stop(&mut self) -> SamplerStats {
        self.state = SamplerState::Stopped;
        self.stats.stopped_at = Some(self.clock.now());
        info!(
            ticks = self.stats.ticks(),
            published = self.stats.published(),
            failed = self.stats.failed(),
            "Sampler stopped"
        );
        self.stats.clone()
    }
}
