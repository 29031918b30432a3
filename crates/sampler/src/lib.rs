//! # Sampler
//!
//! Fixed-rate velocity sampling between two frames.
//!
//! ```ignore
//! use sampler::{shutdown_channel, SamplerConfig, VelocitySampler};
//!
//! let (trigger, signal) = shutdown_channel();
//! let mut sampler = VelocitySampler::new(SamplerConfig::new(frames, 10.0), provider, sink);
//! let stats = sampler.run(signal).await;
//! ```

pub mod clock;
pub mod rate;
pub mod sampler;
pub mod scheduler;
pub mod shutdown;
pub mod stats;

pub use clock::{Clock, SystemClock, TokioClock};
pub use rate::{parse_rate_lenient, resolve_rate, RateSource};
pub use sampler::{
    SamplerConfig, SamplerState, TickOutcome, VelocitySampler, AVERAGING_INTERVAL,
    INITIAL_WAIT_TIMEOUT,
};
pub use scheduler::{period_for_rate, RateScheduler, Wake};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
pub use stats::SamplerStats;
