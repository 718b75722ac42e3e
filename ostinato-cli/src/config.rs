//! CLI configuration
//!
//! Bootstrap settings load from a TOML file; every field has a default so a
//! missing file just means stock settings. Engine parameters nest under
//! `[engine]` and deserialize straight into `EngineParams`.

use anyhow::{Context, Result};
use ostinato_engine::EngineParams;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Engine parameters (`[engine]` table)
    pub engine: EngineParams,

    /// Length of the loop buffer in seconds
    pub loop_seconds: f64,

    /// Audio vector size in frames
    pub vector_size: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            engine: EngineParams::default(),
            loop_seconds: 30.0,
            vector_size: 64,
        }
    }
}

impl CliConfig {
    /// Load from a TOML file, falling back to defaults when the file does
    /// not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: CliConfig = toml::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if config.vector_size == 0 {
            anyhow::bail!("vector_size must be at least 1");
        }
        if config.loop_seconds <= 0.0 {
            anyhow::bail!("loop_seconds must be positive");
        }
        Ok(config)
    }
}
