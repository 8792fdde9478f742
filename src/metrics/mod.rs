pub mod aggregate;
pub mod percentiles;
pub mod recorder;
pub mod stream;
pub mod window;

use std::time::{Duration, Instant};

pub use aggregate::{aggregate, Stats};
pub use recorder::{MetricsRecorder, RecorderStats};
pub use window::EndpointWindow;

/// Samples older than this are excluded from aggregates and evicted.
pub const WINDOW_DURATION: Duration = Duration::from_secs(5 * 60);

/// Hard per-endpoint cap on retained samples.
pub const MAX_SAMPLES: usize = 100;

/// One completed request's outcome, as seen by the HTTP layer.
/// Created once per request and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// e.g. "GET /api/products"
    pub endpoint: String,
    /// Capture time; not guaranteed monotonic across samples
    pub timestamp: Instant,
    /// Observed response time, always >= 0
    pub latency_ms: f64,
    /// Whether this single request ended in an error outcome
    pub is_error: bool,
}

/// Eviction parameters shared by every `EndpointWindow`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowConfig {
    pub window_duration: Duration,
    pub max_samples: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_duration: WINDOW_DURATION,
            max_samples: MAX_SAMPLES,
        }
    }
}
