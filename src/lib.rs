//! Adaptive rate-limit optimizer.
//!
//! Records per-endpoint request outcomes in bounded sliding windows and,
//! on demand, recommends admission limits and classifies endpoint health.
//! Recommendations are advisory; nothing here enforces a limit.

use std::sync::Arc;

use parking_lot::RwLock;

pub mod clock;
pub mod config;
pub mod handlers;
pub mod janitor;
pub mod logger;
pub mod metrics;
pub mod middleware;
pub mod optimizer;
pub mod server;

pub use config::{OptimizerConfig, Settings};
pub use optimizer::{
    CurrentLimits, HealthReport, HealthReportEntry, HealthStatus, LimitAction, LimitConfig,
    RateLimitOptimizer, Recommendation,
};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Recorder, recommendation engine, classifier and janitor.
    pub optimizer: Arc<RateLimitOptimizer>,

    /// Operator-managed limits table, as read by the enforcement layer.
    pub limits: RwLock<CurrentLimits>,
}

impl AppState {
    pub fn new(optimizer: Arc<RateLimitOptimizer>, limits: CurrentLimits) -> Self {
        Self {
            optimizer,
            limits: RwLock::new(limits),
        }
    }
}
