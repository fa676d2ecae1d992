//! Profile resolution and file loading.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{ConfigError, TalosConfig};

/// Directory searched for profile files when no explicit path is given.
const PROFILE_DIR: &str = "config";

impl TalosConfig {
    /// Loads configuration for a named profile.
    ///
    /// The profile resolves to `config/<profile>.json` unless `path`
    /// overrides it. The loaded configuration is validated before being
    /// returned, so a half-specified TLS pair or malformed listen address
    /// fails here, at startup, before anything binds.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file is missing, unreadable,
    /// malformed, or fails validation.
    pub fn load_profile(profile: &str, path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved: PathBuf = match path {
            Some(p) => p.to_path_buf(),
            None => Path::new(PROFILE_DIR).join(format!("{profile}.json")),
        };
        let config = Self::from_file(&resolved)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON or TOML file, by extension.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file is missing, unreadable, or does
    /// not parse. This does *not* validate; callers go through
    /// [`TalosConfig::load_profile`] for that.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(serde_json::from_str(&contents)?),
            Some("toml") => Ok(toml::from_str(&contents)?),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}
