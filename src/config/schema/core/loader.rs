use super::Config;
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// Load configuration from `path` (or `~/.imagecheck/config.toml`), then
    /// apply environment overrides and validate.
    ///
    /// A missing file is not an error: containerized deployments configure
    /// everything through the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path.map_or_else(|| Self::default().config_path, Path::to_path_buf);

        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            tracing::debug!(path = %config_path.display(), "config file not found, using defaults");
            Self {
                config_path,
                ..Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ConfigError::Load(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        let mut config: Self = toml::from_str(&contents).map_err(|e| {
            ConfigError::Load(format!("Failed to parse config file {}: {e}", path.display()))
        })?;
        config.config_path = PathBuf::from(path);
        Ok(config)
    }
}
