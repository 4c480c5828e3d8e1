use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::hash::algorithm::{validate_algorithm_set, Algorithm, DEFAULT_ALGORITHMS};
use crate::hash::pipeline::{DigestPipeline, PipelineMode, DEFAULT_BLOCK_SIZE, DEFAULT_QUEUE_CAPACITY};
use crate::hash::HashUtilityError;

/// Digest settings shared by every command of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub algorithms: Vec<Algorithm>,
    pub block_size: usize,
    pub queue_capacity: usize,
    pub mode: PipelineMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithms: DEFAULT_ALGORITHMS.to_vec(),
            block_size: DEFAULT_BLOCK_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            mode: PipelineMode::Parallel,
        }
    }
}

impl Config {
    /// `<config dir>/desiderata/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("desiderata").join("config.toml"))
    }

    /// Load an explicit config file, else the default one if present, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, HashUtilityError> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, HashUtilityError> {
        let invalid = |reason: String| HashUtilityError::InvalidConfig {
            reason: format!("{}: {}", path.display(), reason),
        };

        let contents = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match ext.to_lowercase().as_str() {
            "toml" => toml::from_str(&contents).map_err(|e| invalid(e.to_string())),
            "json" => serde_json::from_str(&contents).map_err(|e| invalid(e.to_string())),
            _ => Err(invalid(format!("unsupported config file extension: {:?}", ext))),
        }
    }

    pub fn validate(&self) -> Result<(), HashUtilityError> {
        validate_algorithm_set(&self.algorithms)?;
        if self.block_size == 0 {
            return Err(HashUtilityError::InvalidConfig {
                reason: "block_size must be positive".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(HashUtilityError::InvalidConfig {
                reason: "queue_capacity must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Pipeline configured from these settings
    pub fn pipeline(&self) -> Result<DigestPipeline, HashUtilityError> {
        Ok(DigestPipeline::new(self.algorithms.clone())?
            .with_block_size(self.block_size)
            .with_queue_capacity(self.queue_capacity)
            .with_mode(self.mode))
    }
}
