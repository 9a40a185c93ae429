//! Configuration management.
//!
//! Configuration is stored in TOML with support for multiple named
//! profiles; a profile carries the connection coordinates for one service
//! endpoint. Catalogs live next to the config file in a `catalogs/`
//! directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write config at {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("no profile configured; use 'opsctl profile set' to create one")]
    NoProfile,

    #[error("could not determine a configuration directory for this platform")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Connection coordinates for one service endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    /// Base URL of the service API.
    pub url: String,
    /// Bearer token sent with each request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Accept invalid TLS certificates (self-signed endpoints).
    #[serde(default)]
    pub insecure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Config {
    /// Default config file location (`<config dir>/opsctl/config.toml`).
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "opsctl").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Directory scanned for `*.toml` operation catalogs.
    pub fn catalogs_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "opsctl").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("catalogs"))
    }

    /// Load from the default location. A missing file is an empty config.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_path()?)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.display().to_string(),
                source,
            })?;
        }
        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Resolve which profile a command should use: an explicit name, the
    /// configured default, or the sole profile when only one exists.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<(&str, &Profile)> {
        if let Some(name) = name {
            let (key, profile) =
                self.profiles
                    .get_key_value(name)
                    .ok_or_else(|| ConfigError::ProfileNotFound {
                        name: name.to_string(),
                    })?;
            return Ok((key.as_str(), profile));
        }
        if let Some(default) = &self.default_profile {
            let profile =
                self.profiles
                    .get(default)
                    .ok_or_else(|| ConfigError::ProfileNotFound {
                        name: default.clone(),
                    })?;
            return Ok((default.as_str(), profile));
        }
        if self.profiles.len() == 1 {
            let (name, profile) = self.profiles.iter().next().unwrap();
            return Ok((name.as_str(), profile));
        }
        Err(ConfigError::NoProfile)
    }

    pub fn set_profile(&mut self, name: impl Into<String>, profile: Profile) {
        let name = name.into();
        if self.profiles.is_empty() && self.default_profile.is_none() {
            self.default_profile = Some(name.clone());
        }
        self.profiles.insert(name, profile);
    }

    /// Remove a profile; clears the default if it pointed at it.
    pub fn remove_profile(&mut self, name: &str) -> bool {
        let removed = self.profiles.remove(name).is_some();
        if removed && self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        removed
    }
}
