//! Periodic sweep that evicts expired samples from idle endpoints.
//!
//! Eviction on `record()` only touches the endpoint being written, so an
//! endpoint that stops receiving traffic would keep its stale samples
//! forever without this task.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::metrics::MetricsRecorder;

/// Shortest period the sweep loop accepts; `interval()` rejects zero.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a running janitor task.
pub struct Janitor {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl Janitor {
    /// Spawn the sweep loop. The first sweep happens one `every` after start.
    /// Periods below `MIN_INTERVAL` are raised to it.
    pub fn start(recorder: Arc<MetricsRecorder>, every: Duration) -> Self {
        let every = if every < MIN_INTERVAL {
            warn!("janitor interval {every:?} too short, using {MIN_INTERVAL:?}");
            MIN_INTERVAL
        } else {
            every
        };
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() fires immediately; skip that tick
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        sweep(&recorder);
                    }
                }
            }
            debug!("janitor exited");
        });

        Self { shutdown, handle }
    }

    /// Cancel and wait for the task to finish.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.handle.await {
            error!("janitor task failed: {e}");
        }
    }

    /// True once the task has exited, whether cancelled or not.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// One eviction pass over every endpoint. Returns samples dropped.
pub fn sweep(recorder: &MetricsRecorder) -> usize {
    let evicted = recorder.evict_expired();
    if evicted > 0 {
        let stats = recorder.stats();
        info!(
            "janitor evicted {evicted} expired samples ({} endpoints, {} samples retained)",
            stats.endpoints, stats.samples
        );
    }
    evicted
}
