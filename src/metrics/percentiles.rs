use hdrhistogram::Histogram;
use serde::Serialize;

use super::MetricSample;

/// HdrHistogram range: 1 μs → 60 s, 3 significant figures
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 60_000_000;
const HIST_SIGFIG: u8 = 3;

/// Latency percentile breakdown for one endpoint's window, in milliseconds.
/// Serialized straight into `GET /api/metrics`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PercentileSet {
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub count: u64,
}

impl PercentileSet {
    /// Build a percentile set from a window snapshot.
    /// Latencies are recorded at microsecond resolution and clamped into
    /// the histogram's range. Returns zeroed values for an empty slice.
    pub fn from_samples<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = &'a MetricSample>,
    {
        let mut hist = match Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG) {
            Ok(h) => h,
            Err(_) => return Self::empty(),
        };

        for s in samples {
            let us = (s.latency_ms * 1000.0).round() as u64;
            hist.saturating_record(us.clamp(HIST_LOW, HIST_HIGH));
        }

        if hist.len() == 0 {
            return Self::empty();
        }

        let ms = |us: u64| us as f64 / 1000.0;
        Self {
            min_ms: ms(hist.min()),
            max_ms: ms(hist.max()),
            mean_ms: hist.mean() / 1000.0,
            p50_ms: ms(hist.value_at_percentile(50.0)),
            p95_ms: ms(hist.value_at_percentile(95.0)),
            p99_ms: ms(hist.value_at_percentile(99.0)),
            count: hist.len(),
        }
    }

    /// All-zero placeholder used before any samples are recorded.
    pub fn empty() -> Self {
        Self {
            min_ms: 0.0,
            max_ms: 0.0,
            mean_ms: 0.0,
            p50_ms: 0.0,
            p95_ms: 0.0,
            p99_ms: 0.0,
            count: 0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_empty_samples_give_empty_set() {
        let set = PercentileSet::from_samples(&Vec::<MetricSample>::new());
        assert!(!set.has_data());
        assert_eq!(set, PercentileSet::empty());
    }

    #[test]
    fn test_percentiles_within_histogram_precision() {
        let now = Instant::now();
        let samples: Vec<MetricSample> = (1..=100)
            .map(|i| MetricSample {
                endpoint: "GET /x".into(),
                timestamp: now,
                latency_ms: i as f64,
                is_error: false,
            })
            .collect();

        let set = PercentileSet::from_samples(&samples);

        assert_eq!(set.count, 100);
        assert!((set.min_ms - 1.0).abs() < 0.01);
        assert!((set.max_ms - 100.0).abs() < 0.1);
        assert!((set.p50_ms - 50.0).abs() < 0.1);
        assert!((set.p99_ms - 99.0).abs() < 0.1);
    }
}
