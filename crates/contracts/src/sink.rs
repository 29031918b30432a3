//! Output interfaces
//!
//! `PublishSink` is what the sampler sees: a synchronous, fire-and-forget
//! hand-off. `TwistSink` is what concrete outputs implement; the dispatcher
//! bridges the two with a bounded queue per sink.

use crate::{ContractError, TwistStamped};

/// Fire-and-forget publish capability
///
/// Implementations must not block and must not report backpressure to the
/// caller. Dropping a record is preferable to stalling the sampling loop.
pub trait PublishSink: Send {
    fn publish(&mut self, sample: TwistStamped);
}

impl<S: PublishSink + ?Sized> PublishSink for Box<S> {
    fn publish(&mut self, sample: TwistStamped) {
        (**self).publish(sample)
    }
}

/// Data output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(TwistSink: Send)]
pub trait LocalTwistSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one twist record
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, sample: &TwistStamped) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
