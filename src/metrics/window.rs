use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::{MetricSample, WindowConfig};

/// Bounded, insertion-ordered history of recent samples for one endpoint.
#[derive(Debug, Clone, Default)]
pub struct EndpointWindow {
    samples: VecDeque<MetricSample>,
}

impl EndpointWindow {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::new(),
        }
    }

    /// Append a sample, then apply time eviction and the hard cap.
    pub fn push(&mut self, sample: MetricSample, now: Instant, config: &WindowConfig) {
        self.samples.push_back(sample);
        self.evict_expired(now, config.window_duration);
        self.enforce_cap(config.max_samples);
    }

    /// Drop every sample with `now - timestamp >= window`.
    ///
    /// Uses `retain` rather than popping from the front: timestamps are
    /// not sorted when samples arrive out of order.
    pub fn evict_expired(&mut self, now: Instant, window: Duration) -> usize {
        let before = self.samples.len();
        self.samples
            .retain(|s| now.saturating_duration_since(s.timestamp) < window);
        before - self.samples.len()
    }

    /// Drop oldest-by-insertion until at most `max` remain.
    pub fn enforce_cap(&mut self, max: usize) -> usize {
        let excess = self.samples.len().saturating_sub(max);
        self.samples.drain(..excess);
        excess
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricSample> {
        self.samples.iter()
    }

    /// Shallow copy of the retained samples, in insertion order.
    pub fn to_vec(&self) -> Vec<MetricSample> {
        self.samples.iter().cloned().collect()
    }
}
