//! Persistent user settings.
//!
//! Stored as TOML under the platform config directory. Every field has a
//! default so a partial or missing file still loads.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{BravoError, Result};

pub const CONFIG_DIR_NAME: &str = "bravo-sync";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// User settings for the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the simulator web API.
    pub api_url: String,
    pub request_timeout_ms: u64,
    pub tick_interval_ms: u64,
    pub double_click_ms: u64,
    /// Remembered profiles folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: crate::telemetry::http::DEFAULT_API_URL.to_string(),
            request_timeout_ms: 2000,
            tick_interval_ms: 100,
            double_click_ms: 500,
            profiles_dir: None,
        }
    }
}

impl Settings {
    /// Default settings file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load settings from `path`, or defaults if the file does not exist.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)
            .map_err(|e| BravoError::ConfigParse(format!("{}: {e}", path.display())))?;
        settings.validate()?;
        debug!(?settings, "Loaded settings");
        Ok(settings)
    }

    /// Load from `path` if given, else from the default location.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::default_path().map_or_else(|| Ok(Self::default()), |p| Self::load(&p)),
        }
    }

    /// Write settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| BravoError::ConfigParse(e.to_string()))?;
        fs::write(path, content)?;
        info!(path = %path.display(), "Saved settings");
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(BravoError::ConfigParse("api_url must not be empty".to_string()));
        }
        if self.tick_interval_ms == 0 {
            return Err(BravoError::ConfigParse(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub const fn double_click(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }
}
