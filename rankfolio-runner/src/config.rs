//! Run specification files.
//!
//! A run spec is a TOML document with a `[backtest]` table (deserialized
//! straight into the core `BacktestConfig`, so every engine knob is reachable
//! from a file) and an optional `[stress]` table controlling the scenario
//! suite.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rankfolio_core::config::{BacktestConfig, ConfigError};

/// Errors raised while reading a run spec from disk.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read spec file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse spec file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid backtest configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Stress-suite settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressSettings {
    /// Run the standard scenario suite after the backtest.
    pub enabled: bool,
    /// Seed for the volatility-storm scenario.
    pub seed: u64,
}

impl Default for StressSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            seed: 42,
        }
    }
}

/// Everything a run needs besides the price data itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSpec {
    pub backtest: BacktestConfig,
    pub stress: StressSettings,
}

impl RunSpec {
    /// Parse and validate a spec from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, SpecError> {
        let spec: RunSpec = toml::from_str(text)?;
        spec.backtest.validate()?;
        Ok(spec)
    }

    /// Load a spec from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let text = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }
}
