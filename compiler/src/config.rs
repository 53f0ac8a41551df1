//! Pipeline configuration.
//!
//! Settings are plain JSON, e.g.
//! `{ "initial_stage": 0, "retain_stages": 4, "verify_each_pass": true }`.
//! Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ir::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Stage the front end runs at.
    pub initial_stage: u32,
    /// How many of the most recent stages must stay exactly reconstructible.
    /// `None` keeps the full history.
    pub retain_stages: Option<u32>,
    /// Run the invariant verifier after every pass.
    pub verify_each_pass: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            initial_stage: Stage::FRONTEND.to_raw(),
            retain_stages: None,
            verify_each_pass: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read pipeline config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid pipeline config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("retain_stages must be at least 1")]
    ZeroRetention,
    #[error("initial_stage {0} leaves no room for lowering passes")]
    InitialStageTooLarge(u32),
}

impl PipelineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retain_stages == Some(0) {
            return Err(ConfigError::ZeroRetention);
        }
        if self.initial_stage >= Stage::NEVER.to_raw() - 1 {
            return Err(ConfigError::InitialStageTooLarge(self.initial_stage));
        }
        Ok(())
    }

    pub fn initial_stage(&self) -> Stage {
        Stage::new(self.initial_stage)
    }

    /// Oldest stage whose view must survive compaction once `current` is done.
    pub fn retention_floor(&self, current: Stage) -> Option<Stage> {
        self.retain_stages
            .map(|keep| Stage::new(current.to_raw().saturating_sub(keep.saturating_sub(1))))
    }
}
