//! Configuration module for choque.
//!
//! Targets live in a JSON file in the working directory. A missing file is
//! replaced by an empty default on first load.

use serde::{Deserialize, Deserializer, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::scheduler::validate_interval;

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "choque-config.json";
/// Default log file location, relative to the working directory.
pub const DEFAULT_LOG_PATH: &str = "logs/choque.log";
/// Interval used for entries without one: 5 minutes.
pub const DEFAULT_INTERVAL_MS: u64 = 300_000;

/// Config error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write config {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// One configured URL as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEntry {
    pub url: String,
    /// Probe interval in milliseconds; 0 or absent falls back to the default interval.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub interval: u64,
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Persisted configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub urls: Vec<TargetEntry>,
    pub default_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            default_interval: DEFAULT_INTERVAL_MS,
        }
    }
}

/// A URL ready to be scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: String,
    pub interval: Duration,
}

impl Config {
    /// Load the config at `path`, creating and persisting the default when absent.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        match tokio::fs::read_to_string(path).await {
            Ok(data) => serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No config at {}, creating default", path.display());
                let cfg = Self::default();
                cfg.save(path).await?;
                Ok(cfg)
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write the config as pretty-printed JSON.
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let data = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tokio::fs::write(path, data)
            .await
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Append a URL with a clamped interval and return the stored target.
    pub fn add_target(&mut self, url: &str, requested: Duration) -> Target {
        let interval = validate_interval(requested);
        self.urls.push(TargetEntry {
            url: url.to_string(),
            interval: interval.as_millis() as u64,
        });

        Target {
            url: url.to_string(),
            interval,
        }
    }

    /// Resolve every entry into a schedulable target.
    pub fn targets(&self) -> Vec<Target> {
        self.urls
            .iter()
            .map(|entry| {
                let ms = if entry.interval == 0 {
                    self.default_interval
                } else {
                    entry.interval
                };
                Target {
                    url: entry.url.clone(),
                    interval: validate_interval(Duration::from_millis(ms)),
                }
            })
            .collect()
    }
}
