//! Runtime configuration, read from `OPTIMIZER_*` environment variables.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

use crate::metrics::WindowConfig;
use crate::optimizer::{AnalysisConfig, CurrentLimits};

pub const ENV_BIND_ADDR: &str = "OPTIMIZER_BIND_ADDR";
pub const ENV_JANITOR_INTERVAL_SECS: &str = "OPTIMIZER_JANITOR_INTERVAL_SECS";
pub const ENV_WINDOW_SECS: &str = "OPTIMIZER_WINDOW_SECS";
pub const ENV_MAX_SAMPLES: &str = "OPTIMIZER_MAX_SAMPLES";
pub const ENV_LIMITS: &str = "OPTIMIZER_LIMITS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_JANITOR_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("OPTIMIZER_LIMITS is not a valid limits object: {0}")]
    InvalidLimits(#[from] serde_json::Error),

    #[error("limit for {0:?} must be greater than zero")]
    ZeroLimit(String),
}

/// Everything the core needs; no I/O.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    pub window: WindowConfig,
    pub analysis: AnalysisConfig,
    pub janitor_interval: Duration,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            analysis: AnalysisConfig::default(),
            janitor_interval: DEFAULT_JANITOR_INTERVAL,
        }
    }
}

/// Service settings: core config plus the HTTP surface.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub optimizer: OptimizerConfig,
    /// Limits the enforcement layer starts with
    pub limits: CurrentLimits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            optimizer: OptimizerConfig::default(),
            limits: CurrentLimits::new(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Build settings from an explicit variable map; unset keys keep defaults.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(addr) = vars.get(ENV_BIND_ADDR) {
            settings.bind_addr = addr.clone();
        }
        if let Some(secs) = positive(vars, ENV_JANITOR_INTERVAL_SECS)? {
            settings.optimizer.janitor_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = positive(vars, ENV_WINDOW_SECS)? {
            settings.optimizer.window.window_duration = Duration::from_secs(secs);
        }
        if let Some(max) = positive(vars, ENV_MAX_SAMPLES)? {
            settings.optimizer.window.max_samples = max as usize;
        }
        if let Some(raw) = vars.get(ENV_LIMITS) {
            settings.limits = parse_limits(raw)?;
        }

        Ok(settings)
    }
}

/// Parse a `{"GET /api/products": {"max_requests": 100}, ...}` object.
pub fn parse_limits(raw: &str) -> Result<CurrentLimits, ConfigError> {
    let limits: CurrentLimits = serde_json::from_str(raw)?;
    if let Some((endpoint, _)) = limits.iter().find(|(_, l)| l.max_requests == 0) {
        return Err(ConfigError::ZeroLimit(endpoint.clone()));
    }
    Ok(limits)
}

fn positive(vars: &HashMap<String, String>, var: &'static str) -> Result<Option<u64>, ConfigError> {
    let Some(value) = vars.get(var) else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: value.clone(),
        }),
    }
}
