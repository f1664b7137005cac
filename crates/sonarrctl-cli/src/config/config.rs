//! `AppConfig` and its TOML file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sonarrctl_api::SonarrConfiguration;

/// Contents of `config.toml`.
///
/// ```toml
/// [sonarr]
/// host = "sonarr.lan"
/// port = 8989
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Connection settings for the Sonarr instance.
    #[serde(default)]
    pub sonarr: SonarrConfiguration,
}

impl AppConfig {
    /// Reads `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Writes `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Loads `path` and layers `SONARR_*` variables from `lookup` on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or an override is malformed.
    pub fn resolve<F>(path: &Path, lookup: F) -> Result<SonarrConfiguration>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = Self::load(path)?;
        file.sonarr
            .with_overrides(lookup)
            .context("invalid SONARR_* environment override")
    }
}
