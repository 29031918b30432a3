//! SinkHandle - one sink behind its own bounded queue and worker task

use std::sync::Arc;

use contracts::{TwistSink, TwistStamped};
use observability::metrics::{record_sample_dropped, record_sink_write};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::metrics::SinkMetrics;

/// Handle to a running sink worker
pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<TwistStamped>,
    metrics: Arc<SinkMetrics>,
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Spawn the worker for `sink`
    ///
    /// A zero capacity is raised to one.
    pub fn spawn<S: TwistSink + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_handle = tokio::spawn(sink_worker(
            sink,
            rx,
            Arc::clone(&metrics),
            name.clone(),
        ));

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a sample without waiting
    ///
    /// Returns false if the sample was dropped (queue full or worker gone).
    pub fn try_send(&self, sample: TwistStamped) -> bool {
        match self.tx.try_send(sample) {
            Ok(()) => {
                self.metrics.inc_enqueued();
                true
            }
            Err(mpsc::error::TrySendError::Full(sample)) => {
                self.metrics.inc_dropped();
                record_sample_dropped(&self.name);
                warn!(
                    sink = %self.name,
                    stamp = sample.header.stamp,
                    "Queue full, sample dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.metrics.inc_dropped();
                error!(sink = %self.name, "Sink worker closed unexpectedly");
                false
            }
        }
    }

    /// Drain the queue, then flush and close the sink
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "SinkHandle shutdown complete");
    }
}

#[instrument(name = "sink_worker_loop", skip(sink, rx, metrics), fields(sink = %name))]
async fn sink_worker<S: TwistSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<TwistStamped>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!("Sink worker started");

    while let Some(sample) = rx.recv().await {
        match sink.write(&sample).await {
            Ok(()) => {
                metrics.record_written(sample.header.stamp);
                record_sink_write(&name, true);
            }
            Err(e) => {
                metrics.inc_failed();
                record_sink_write(&name, false);
                error!(stamp = sample.header.stamp, error = %e, "Write failed");
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(error = %e, "Close failed on shutdown");
    }

    debug!("Sink worker stopped");
}
