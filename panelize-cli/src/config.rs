//! `panelize.toml` handling.
//!
//! Every section is optional; missing keys fall back to the built-in
//! defaults and command-line flags override whatever the file sets.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use wall_panelizer::NoiseFilter;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelizeConfig {
    pub detector: DetectorConfig,
    pub filter: NoiseFilter,
}

/// External wall detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Interpreter or executable to launch
    pub program: String,
    /// Script passed as the first argument, if any
    pub script: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            script: Some("imageProcTest.py".to_string()),
        }
    }
}

impl PanelizeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .context(format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults when no file is given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let filter = &self.filter;
        if !(filter.scale.is_finite() && filter.scale > 0.0) {
            anyhow::bail!("filter.scale must be positive, got {}", filter.scale);
        }
        if !(filter.noise_threshold.is_finite() && filter.noise_threshold > 0.0) {
            anyhow::bail!(
                "filter.noise_threshold must be positive, got {}",
                filter.noise_threshold
            );
        }
        if filter.min_short_side > filter.max_short_side {
            anyhow::bail!(
                "filter.min_short_side ({}) exceeds filter.max_short_side ({})",
                filter.min_short_side,
                filter.max_short_side
            );
        }
        if self.detector.program.trim().is_empty() {
            anyhow::bail!("detector.program must not be empty");
        }
        Ok(())
    }
}
