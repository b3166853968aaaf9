//! Scheduler configuration: pool sizing, timer cadence and result retention.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::WorkerPoolConfig;

/// Default upper bound on how long the timer thread sleeps between passes.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Worker pool sizing.
    pub pool: WorkerPoolConfig,
    /// Longest the timer thread waits before re-checking due tasks.
    pub poll_interval_ms: u64,
    /// Results kept per task; oldest are dropped first. `None` keeps all.
    pub max_results_per_task: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pool: WorkerPoolConfig::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_results_per_task: None,
        }
    }
}

impl SchedulerConfig {
    /// Timer poll interval as a `Duration`.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate the pool and scheduler settings.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        self.pool
            .validate()
            .map_err(|e| format!("pool invalid: {e}"))?;
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".into());
        }
        if self.max_results_per_task == Some(0) {
            return Err("max_results_per_task must be greater than 0 when set".into());
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a message on parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `SCHEDULER_*` environment variables, loading
    /// a `.env` file first when present. Unset variables keep their defaults.
    ///
    /// Recognized: `SCHEDULER_WORKER_COUNT`, `SCHEDULER_MAX_QUEUE_DEPTH`,
    /// `SCHEDULER_POLL_INTERVAL_MS`, `SCHEDULER_MAX_RESULTS`.
    ///
    /// # Errors
    ///
    /// Returns a message when a variable does not parse or validation fails.
    pub fn from_env() -> Result<Self, String> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded environment file");
        }
        let mut cfg = Self::default();
        if let Some(v) = env_var("SCHEDULER_WORKER_COUNT")? {
            cfg.pool.worker_count = v;
        }
        if let Some(v) = env_var("SCHEDULER_MAX_QUEUE_DEPTH")? {
            cfg.pool.max_queue_depth = v;
        }
        if let Some(v) = env_var("SCHEDULER_POLL_INTERVAL_MS")? {
            cfg.poll_interval_ms = v;
        }
        if let Some(v) = env_var("SCHEDULER_MAX_RESULTS")? {
            cfg.max_results_per_task = Some(v);
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn env_var<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("{name}: {e}")),
        Err(_) => Ok(None),
    }
}
