//! Serializable pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use swinglab_core::config::EvaluationConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid thresholds: {0}")]
    Thresholds(#[from] swinglab_core::config::ConfigError),
    #[error("max_concurrency must be at least 1")]
    ZeroConcurrency,
}

/// Everything a run needs beyond its request: evaluator threshold tables
/// plus orchestration knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on concurrently evaluated candidates.
    pub max_concurrency: usize,
    /// Overall pipeline deadline in seconds; candidates still pending when
    /// it expires are excluded, not failed. None disables the deadline.
    pub deadline_secs: Option<u64>,
    pub evaluation: EvaluationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            deadline_secs: None,
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        self.evaluation.validate()?;
        Ok(())
    }
}
