//! Thumbnail cache configuration
//!
//! Cache location and startup behavior, configurable from a JSON file,
//! environment variables, or programmatically.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem failure while loading or saving
    #[error("config I/O failure: {0}")]
    Io(#[from] io::Error),

    /// Config file is not valid JSON for this schema
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// An environment variable held an unusable value
    #[error("invalid value in environment variable {0}")]
    InvalidEnvValue(String),
}

/// Settings for the thumbnail disk cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbCacheConfig {
    /// Directory holding the flat thumbnail cache
    pub cache_dir: PathBuf,

    /// Whether to bulk-clear the cache at startup
    pub clear_on_start: bool,
}

impl Default for ThumbCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: Self::default_cache_dir(),
            clear_on_start: true,
        }
    }
}

impl ThumbCacheConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache directory.
    pub fn with_cache_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cache_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set whether to bulk-clear at startup.
    pub fn with_clear_on_start(mut self, clear: bool) -> Self {
        self.clear_on_start = clear;
        self
    }

    /// Default cache directory for the current platform.
    ///
    /// - macOS: `~/Library/Caches/cloudshelf/thumbnails`
    /// - Linux: `~/.cache/cloudshelf/thumbnails`
    /// - Windows: `%LOCALAPPDATA%\cloudshelf\thumbnails`
    pub fn default_cache_dir() -> PathBuf {
        if let Some(cache_dir) = dirs::cache_dir() {
            cache_dir.join("cloudshelf").join("thumbnails")
        } else {
            // Fallback to current directory if cache dir unavailable
            PathBuf::from("cache/thumbnails")
        }
    }

    /// Load configuration from environment variables over defaults.
    ///
    /// - `CLOUDSHELF_CACHE_DIR`: cache directory path
    /// - `CLOUDSHELF_CLEAR_ON_START`: `true`/`false`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CLOUDSHELF_CACHE_DIR") {
            if val.is_empty() {
                return Err(ConfigError::InvalidEnvValue("CLOUDSHELF_CACHE_DIR".to_string()));
            }
            config.cache_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("CLOUDSHELF_CLEAR_ON_START") {
            config.clear_on_start = val
                .parse::<bool>()
                .map_err(|_| ConfigError::InvalidEnvValue("CLOUDSHELF_CLEAR_ON_START".to_string()))?;
        }

        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save configuration to a JSON file, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
