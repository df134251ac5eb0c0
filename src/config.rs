//! Server configuration module.
//!
//! Loads and validates an optional `phototree.toml`. Every key has a
//! default, so a config file only needs the values it wants to change, and
//! running without one is normal. Command-line flags override the file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! bind = "127.0.0.1:3333"   # Listen address for `phototree serve`
//! cors = true               # Permissive CORS headers on every response
//!
//! [cache]
//! # dir = "/srv/thumbs"     # Default: ~/.phototree/thumbs
//!
//! [thumbnails]
//! max_edge = 1200           # Longer edge of generated thumbnails, in pixels
//! quality = 75              # JPEG quality (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers for `warm` (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, ThumbnailConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Server configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP listener settings.
    pub server: ListenConfig,
    /// Thumbnail cache location.
    pub cache: CacheConfig,
    /// Thumbnail rendering settings.
    pub thumbnails: ThumbnailsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ServerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnails.max_edge == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.max_edge must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        self.bind_addr()?;
        Ok(())
    }

    /// The parsed `server.bind` address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.bind.parse().map_err(|_| {
            ConfigError::Validation(format!(
                "server.bind is not a socket address: {:?}",
                self.server.bind
            ))
        })
    }

    /// Configured cache directory, falling back to `~/.phototree/thumbs`.
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.cache.dir {
            Some(dir) => Ok(dir.clone()),
            None => default_cache_dir().ok_or_else(|| {
                ConfigError::Validation(
                    "cannot determine home directory; set cache.dir".into(),
                )
            }),
        }
    }

    pub fn thumbnail_config(&self) -> ThumbnailConfig {
        ThumbnailConfig {
            max_edge: self.thumbnails.max_edge,
            quality: Quality::new(self.thumbnails.quality),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ListenConfig {
    /// `host:port` to listen on.
    pub bind: String,
    /// Send permissive CORS headers.
    pub cors: bool,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3333".into(),
            cors: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Where thumbnails and sidecars are written. When absent, defaults to
    /// `~/.phototree/thumbs`.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Longer edge of a thumbnail in pixels. Smaller images are not upscaled.
    pub max_edge: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        let defaults = ThumbnailConfig::default();
        Self {
            max_edge: defaults.max_edge,
            quality: defaults.quality.value(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel thumbnail workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// `~/.phototree/thumbs`, if a home directory is known.
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".phototree").join("thumbs"))
}

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, or the defaults when no path is given.
///
/// An explicitly named file that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    match path {
        Some(path) => parse_config(&fs::read_to_string(path)?),
        None => Ok(ServerConfig::default()),
    }
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# phototree configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Pass this file with `phototree --config phototree.toml <command>`.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
# Address `phototree serve` listens on. `--bind` overrides it.
bind = "127.0.0.1:3333"

# Send permissive CORS headers so browser clients on other origins can call
# the API.
cors = true

# ---------------------------------------------------------------------------
# Thumbnail cache
# ---------------------------------------------------------------------------
[cache]
# Directory for generated thumbnails and their metadata. Nothing in it is
# ever evicted; delete it to force regeneration. `--cache-dir` overrides it.
# dir = "/home/me/.phototree/thumbs"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Longer edge in pixels. Smaller originals keep their size.
max_edge = 1200

# JPEG encoding quality (1 = worst, 100 = best).
quality = 75

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for `phototree warm`. Omit for auto (= number of
# CPU cores). Values above the core count are clamped down.
# max_processes = 4
"##
}
