//! Application configuration
//!
//! Settings are read from `config.json` in the XDG config directory
//! (`~/.config/chartcache/config.json` on Linux). Every field is optional; a
//! missing file yields the defaults. Extra offline regions can be declared
//! here alongside the builtin ones.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::default_cache_dir;
use crate::cache::transport::{DEFAULT_TILE_SERVER, DEFAULT_USER_AGENT};
use crate::tiles::{Region, RegionError, BUILTIN_REGIONS};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "chartcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Errors that can occur when loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file exists but could not be read
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not valid JSON for this schema
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A configured region is invalid
    #[error("Invalid region in config: {0}")]
    InvalidRegion(#[from] RegionError),

    /// Two regions share the same identifier
    #[error("Duplicate region id '{0}' in config")]
    DuplicateRegion(String),

    /// Requests would time out before any response arrives
    #[error("timeout_secs must be at least 1")]
    InvalidTimeout,

    /// No cache directory was configured and none could be determined
    #[error("Could not determine a cache directory; set cache_dir in the config or pass --cache-dir")]
    NoCacheDir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the slippy-map tile server
    pub tile_server: String,
    /// Tile cache directory; defaults to the XDG cache directory
    pub cache_dir: Option<PathBuf>,
    /// User-Agent sent with every tile request
    pub user_agent: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Number of tiles resolved at once (1 = sequential)
    pub concurrency: usize,
    /// Additional offline regions
    pub regions: Vec<Region>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tile_server: DEFAULT_TILE_SERVER.to_string(),
            cache_dir: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            concurrency: 1,
            regions: Vec::new(),
        }
    }
}

impl Config {
    /// Loads the config from the default location
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads the config from `path`, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Default config file path, if a config directory can be determined
    pub fn config_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", APP_NAME)?;
        Some(project_dirs.config_dir().join(CONFIG_FILE))
    }

    /// Checks the request timeout and every configured region, rejecting
    /// duplicate identifiers
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        let mut seen: Vec<&str> = BUILTIN_REGIONS.iter().map(|r| &*r.id).collect();
        for region in &self.regions {
            region.validate()?;
            if seen.contains(&&*region.id) {
                return Err(ConfigError::DuplicateRegion(region.id.to_string()));
            }
            seen.push(&region.id);
        }
        Ok(())
    }

    /// Builtin regions followed by configured ones
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        BUILTIN_REGIONS.iter().chain(self.regions.iter())
    }

    /// Looks up a region by identifier
    pub fn find_region(&self, id: &str) -> Option<&Region> {
        self.regions().find(|region| region.id == id)
    }

    /// Resolves the tile cache directory
    pub fn tile_cache_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        default_cache_dir().ok_or(ConfigError::NoCacheDir)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(contents: &str) -> (PathBuf, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&path, contents).expect("Should write config");
        (path, temp_dir)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tile_server, "https://tile.openstreetmap.org");
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.cache_dir.is_none());
        assert!(config.regions.is_empty());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let (path, _temp_dir) = write_config(r#"{ "concurrency": 4, "cache_dir": "/tmp/tiles" }"#);
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.tile_cache_dir().unwrap(), PathBuf::from("/tmp/tiles"));
        assert_eq!(config.tile_server, DEFAULT_TILE_SERVER);
    }

    #[test]
    fn test_configured_region_is_found_after_builtins() {
        let (path, _temp_dir) = write_config(
            r#"{
                "regions": [{
                    "id": "mobile-bay",
                    "name": "Mobile Bay",
                    "min_lat": 30.2, "max_lat": 30.8,
                    "min_lon": -88.2, "max_lon": -87.7,
                    "min_zoom": 8, "max_zoom": 11
                }]
            }"#,
        );
        let config = Config::load_from(&path).unwrap();

        let ids: Vec<_> = config.regions().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["louisiana-base", "mobile-bay"]);
        assert_eq!(config.find_region("mobile-bay").unwrap().name, "Mobile Bay");
        assert!(config.find_region("louisiana-base").is_some());
        assert!(config.find_region("atlantis").is_none());
    }

    #[test]
    fn test_invalid_region_is_rejected() {
        let (path, _temp_dir) = write_config(
            r#"{
                "regions": [{
                    "id": "upside-down",
                    "name": "Upside down",
                    "min_lat": 31.0, "max_lat": 30.0,
                    "min_lon": -88.2, "max_lon": -87.7,
                    "min_zoom": 8, "max_zoom": 11
                }]
            }"#,
        );
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegion(RegionError::LatitudeOrder { .. })));
    }

    #[test]
    fn test_duplicate_region_is_rejected() {
        let (path, _temp_dir) = write_config(
            r#"{
                "regions": [{
                    "id": "louisiana-base",
                    "name": "Shadowed",
                    "min_lat": 29.0, "max_lat": 30.0,
                    "min_lon": -91.0, "max_lon": -90.0,
                    "min_zoom": 6, "max_zoom": 8
                }]
            }"#,
        );
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRegion(id) if id == "louisiana-base"));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let (path, _temp_dir) = write_config(r#"{ "timeout_secs": 0 }"#);
        assert!(matches!(Config::load_from(&path), Err(ConfigError::InvalidTimeout)));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let (path, _temp_dir) = write_config("{ not json");
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
