use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use parking_lot::Mutex;
use serde::Serialize;

use super::window::EndpointWindow;
use super::{MetricSample, WindowConfig};
use crate::clock::{Clock, SystemClock};

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe per-endpoint sample store.
/// The HTTP layer calls `record()`; the optimizer and janitor read or
/// sweep through `snapshot()` / `evict_expired()`.
pub struct MetricsRecorder {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    config: WindowConfig,
}

/// Copy of every endpoint's retained samples, taken under the lock.
pub type WindowSnapshot = HashMap<String, Vec<MetricSample>>;

/// Coarse memory footprint of the recorder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecorderStats {
    pub endpoints: usize,
    pub samples: usize,
}

// ─── Internal state ──────────────────────────────────────────────

struct Inner {
    windows: HashMap<String, EndpointWindow>,
}

// ─── MetricsRecorder impl ────────────────────────────────────────

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), WindowConfig::default())
    }

    pub fn with_clock(clock: Arc<dyn Clock>, config: WindowConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                windows: HashMap::new(),
            }),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Record one completed request. Never fails from the caller's view:
    /// malformed input is clamped or dropped here.
    pub fn record(&self, endpoint: &str, latency_ms: f64, is_error: bool) {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            debug!("dropping sample with empty endpoint");
            return;
        }
        if !latency_ms.is_finite() {
            debug!("dropping non-finite latency {latency_ms} for {endpoint}");
            return;
        }

        let now = self.clock.now();
        let sample = MetricSample {
            endpoint: endpoint.to_owned(),
            timestamp: now,
            latency_ms: latency_ms.max(0.0),
            is_error,
        };

        // Lookup-or-create happens under the same lock as the append,
        // so concurrent first writes share one window.
        let mut inner = self.inner.lock();
        inner
            .windows
            .entry(sample.endpoint.clone())
            .or_default()
            .push(sample, now, &self.config);
    }

    /// Shallow copy of every window. Aggregation runs on the copy,
    /// outside the lock.
    pub fn snapshot(&self) -> WindowSnapshot {
        let inner = self.inner.lock();
        inner
            .windows
            .iter()
            .map(|(endpoint, window)| (endpoint.clone(), window.to_vec()))
            .collect()
    }

    /// Copy of a single endpoint's samples, if it has ever been recorded.
    pub fn samples(&self, endpoint: &str) -> Option<Vec<MetricSample>> {
        self.inner.lock().windows.get(endpoint).map(EndpointWindow::to_vec)
    }

    /// Apply time eviction to every window; returns samples dropped.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner
            .windows
            .values_mut()
            .map(|w| w.evict_expired(now, self.config.window_duration))
            .sum()
    }

    pub fn stats(&self) -> RecorderStats {
        let inner = self.inner.lock();
        RecorderStats {
            endpoints: inner.windows.len(),
            samples: inner.windows.values().map(EndpointWindow::len).sum(),
        }
    }

    /// Wipe all windows.
    pub fn clear(&self) {
        self.inner.lock().windows.clear();
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
