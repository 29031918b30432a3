//! TransformHistoryProvider trait - transform graph capability
//!
//! The sampler never touches a frame graph directly. It is handed something
//! that implements this trait: the in-memory buffer in production, a scripted
//! fake in tests.

use std::time::Duration;

use crate::{FramePair, LookupError, Twist};

/// Reference time for a lookup
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum LookupTime {
    /// Newest time for which the provider has data on every edge involved
    #[default]
    Latest,

    /// Specific time (seconds)
    At(f64),
}

/// Transform history capability
#[trait_variant::make(TransformHistoryProvider: Send)]
pub trait LocalTransformHistoryProvider {
    /// Wait until the transform between the pair's frames can be computed
    ///
    /// # Errors
    /// Returns `LookupError::Timeout` if the transform is still unavailable
    /// after `timeout`.
    async fn wait_until_available(
        &self,
        frames: &FramePair,
        timeout: Duration,
    ) -> Result<(), LookupError>;

    /// Velocity of `tracking_frame` as observed from `observation_frame`
    ///
    /// Estimated by differencing the transform history across `interval`
    /// ending at the resolved reference time. The result is expressed in
    /// `observation_frame` with the reference point at the origin of
    /// `tracking_frame`.
    async fn lookup_averaged_twist(
        &self,
        tracking_frame: &str,
        observation_frame: &str,
        at: LookupTime,
        interval: Duration,
    ) -> Result<Twist, LookupError>;
}
