use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Rule file used when neither the CLI nor the config file names one
pub const DEFAULT_RULES_FILE: &str = "Contest Rule.csv";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Rule table CSV
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_path: Option<PathBuf>,
    /// Where exported PNG/JSON files land
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
}

impl Config {
    pub fn get_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "contest-points", "contest-points")
            .map(|proj_dirs| proj_dirs.config_dir().join("config.json"))
    }

    /// Load the user's config, falling back to defaults when none exists yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let config_data = fs::read_to_string(config_path)
            .map_err(|e| ConfigError::LoadFailed(format!("{}: {}", config_path.display(), e)))?;

        let config: Config = serde_json::from_str(&config_data)
            .map_err(|e| ConfigError::LoadFailed(format!("{}: {}", config_path.display(), e)))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::DirectoryCreationFailed(e.to_string()))?;
        }

        let config_data = serde_json::to_string_pretty(self)?;

        fs::write(config_path, config_data)
            .map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        Ok(())
    }

    /// CLI flag wins, then the config file, then `Contest Rule.csv` in the working directory.
    pub fn resolve_rules_path(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.rules_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RULES_FILE))
    }

    pub fn resolve_export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
