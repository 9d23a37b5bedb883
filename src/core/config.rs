//! Configuration management for codesift.
//!
//! Loads configuration from a TOML file and environment variables, with
//! defaults for every setting.

use crate::core::error::{Result, SiftError};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Root directory holding repositories and the search index
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Verbose write-decision logging in the indexer
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Search configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Hits per result page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Facet bucket size for the fullRefs and ext facets
    #[serde(default = "default_facet_size")]
    pub facet_size: usize,

    /// Context lines before a matched line in previews
    #[serde(default = "default_preview_context")]
    pub preview_before: usize,

    /// Context lines after a matched line in previews
    #[serde(default = "default_preview_context")]
    pub preview_after: usize,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_page_size() -> usize {
    10
}

fn default_facet_size() -> usize {
    100
}

fn default_preview_context() -> usize {
    3
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8590
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            debug: false,
            search: SearchConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            facet_size: default_facet_size(),
            preview_before: default_preview_context(),
            preview_after: default_preview_context(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// Order: `CODESIFT_CONFIG` file if set, else `./codesift.toml` if
    /// present, else defaults. `CODESIFT_DATA_DIR` and `CODESIFT_DEBUG`
    /// override the file.
    pub fn load() -> Result<Self> {
        let mut config = match env::var("CODESIFT_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let default_path = Path::new("codesift.toml");
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(dir) = env::var("CODESIFT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(debug) = env::var("CODESIFT_DEBUG") {
            config.debug = matches!(debug.as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            SiftError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Directory holding the search index
    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("index")
    }

    /// Log effective settings at startup
    pub fn log_config(&self) {
        tracing::info!("data dir: {}", self.data_dir.display());
        tracing::info!("index dir: {}", self.index_dir().display());
        tracing::info!(
            "search: page_size={} facet_size={} preview={}±{}",
            self.search.page_size,
            self.search.facet_size,
            self.search.preview_before,
            self.search.preview_after
        );
        if self.debug {
            tracing::info!("debug logging enabled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert!(!config.debug);
        assert_eq!(config.search.page_size, 10);
        assert_eq!(config.search.facet_size, 100);
        assert_eq!(config.search.preview_before, 3);
        assert_eq!(config.search.preview_after, 3);
    }

    #[test]
    fn index_dir_under_data_dir() {
        let mut config = Config::default();
        config.data_dir = PathBuf::from("/var/lib/codesift");
        assert_eq!(config.index_dir(), PathBuf::from("/var/lib/codesift/index"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            data_dir = "/srv/codesift"

            [search]
            page_size = 25
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/codesift"));
        assert_eq!(config.search.page_size, 25);
        assert_eq!(config.search.facet_size, 100);
        assert_eq!(config.server.port, 8590);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let result: std::result::Result<Config, _> = toml::from_str("data_dir = [1,2]");
        assert!(result.is_err());
    }
}
