// Runner configuration

use super::constants::*;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Sizing of the bounded worker pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Bodies running concurrently
    pub max_workers: usize,
    /// Jobs admitted beyond `max_workers`, waiting for a free worker
    pub queue_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl RunnerConfig {
    /// Defaults overridden by `PANELKIT_MAX_WORKERS` / `PANELKIT_QUEUE_CAPACITY`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_MAX_WORKERS) {
            config.max_workers = parse_count(ENV_MAX_WORKERS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_QUEUE_CAPACITY) {
            config.queue_capacity = parse_count(ENV_QUEUE_CAPACITY, &raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(AppError::Config("max_workers must be at least 1".to_string()));
        }
        // tokio semaphores cap permits at usize::MAX >> 3
        if self.admission_capacity() > tokio::sync::Semaphore::MAX_PERMITS {
            return Err(AppError::Config(format!(
                "max_workers + queue_capacity exceeds {}",
                tokio::sync::Semaphore::MAX_PERMITS
            )));
        }
        Ok(())
    }

    /// Jobs admitted at once: running plus waiting
    pub fn admission_capacity(&self) -> usize {
        self.max_workers.saturating_add(self.queue_capacity)
    }
}

fn parse_count(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{key}={raw:?}: {e}")))
}
