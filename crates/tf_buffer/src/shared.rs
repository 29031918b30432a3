//! SharedTransformBuffer - thread-safe provider over a `TransformBuffer`
//!
//! Writers (the feed task) insert under a write lock and wake every waiter;
//! the sampler reads under a read lock. No lock is held across an await.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use contracts::{
    ContractError, FramePair, LookupError, LookupTime, TransformHistoryProvider,
    TransformStamped, Twist,
};
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::buffer::{BufferConfig, TransformBuffer};

struct Shared {
    buffer: RwLock<TransformBuffer>,
    updated: Notify,
}

/// Cloneable handle to a shared transform buffer
#[derive(Clone)]
pub struct SharedTransformBuffer {
    inner: Arc<Shared>,
}

impl SharedTransformBuffer {
    /// Create an empty shared buffer
    pub fn new(config: BufferConfig) -> Self {
        Self::from_buffer(TransformBuffer::with_config(config))
    }

    /// Wrap an existing buffer
    pub fn from_buffer(buffer: TransformBuffer) -> Self {
        Self {
            inner: Arc::new(Shared {
                buffer: RwLock::new(buffer),
                updated: Notify::new(),
            }),
        }
    }

    /// Insert a transform and wake availability waiters
    pub fn insert(&self, tf: TransformStamped) -> Result<(), ContractError> {
        {
            let mut buffer = self
                .inner
                .buffer
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            buffer.insert(tf)?;
        }
        self.inner.updated.notify_waiters();
        Ok(())
    }

    /// Run a closure against the buffer under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&TransformBuffer) -> R) -> R {
        let buffer = self
            .inner
            .buffer
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&buffer)
    }

    /// Whether the pair's transform can currently be computed
    pub fn can_transform(&self, frames: &FramePair) -> bool {
        self.read(|buffer| {
            buffer.can_transform(
                &frames.source_frame,
                &frames.target_frame,
                LookupTime::Latest,
            )
        })
    }
}

impl Default for SharedTransformBuffer {
    fn default() -> Self {
        Self::new(BufferConfig::default())
    }
}

impl TransformHistoryProvider for SharedTransformBuffer {
    #[instrument(
        name = "tf_wait_until_available",
        skip(self, frames),
        fields(source = %frames.source_frame, target = %frames.target_frame)
    )]
    async fn wait_until_available(
        &self,
        frames: &FramePair,
        timeout: Duration,
    ) -> Result<(), LookupError> {
        let started = Instant::now();
        let wait = async {
            loop {
                // Register before checking so an insert in between is not missed
                let notified = self.inner.updated.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                if self.can_transform(frames) {
                    return;
                }
                notified.await;
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(()) => {
                debug!(
                    waited_ms = started.elapsed().as_millis() as u64,
                    "transform available"
                );
                Ok(())
            }
            Err(_) => Err(LookupError::Timeout {
                source_frame: frames.source_frame.clone(),
                target_frame: frames.target_frame.clone(),
                waited_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn lookup_averaged_twist(
        &self,
        tracking_frame: &str,
        observation_frame: &str,
        at: LookupTime,
        interval: Duration,
    ) -> Result<Twist, LookupError> {
        self.read(|buffer| buffer.lookup_twist(tracking_frame, observation_frame, at, interval))
    }
}
