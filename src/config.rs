use crate::hull::AlphaShapeExtractor;
use crate::kmeans::KMeansConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Alpha in coordinate degrees. Roughly 25 km at mid latitudes.
pub const DEFAULT_ALPHA: f64 = 0.25;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("alpha must be a positive finite number, got {0}")]
    InvalidAlpha(f64),
    #[error("max_iterations must be at least 1")]
    ZeroIterations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Circumradius threshold for the alpha shape.
    pub alpha: f64,
    pub outer_only: bool,
    /// Run the per-zone work on the rayon pool.
    pub parallel: bool,
    pub kmeans: KMeansConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            outer_only: true,
            parallel: true,
            kmeans: KMeansConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(ConfigError::InvalidAlpha(self.alpha));
        }
        if self.kmeans.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(())
    }

    pub fn alpha_shape(&self) -> AlphaShapeExtractor {
        AlphaShapeExtractor {
            alpha: self.alpha,
            outer_only: self.outer_only,
        }
    }
}
