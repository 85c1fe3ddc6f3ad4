//! Configuration Module
//!
//! Process settings come from environment variables; the list of cleanup
//! tasks comes from a YAML file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default location of the YAML task list.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/folder-cleaner/config.yaml";

/// Process settings.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Path of the YAML file holding the task list
    pub config_path: PathBuf,
    /// HTTP port for the health and metrics endpoints
    pub server_port: u16,
}

impl Settings {
    /// Creates new Settings by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CONFIG_PATH` - YAML task list (default: /etc/folder-cleaner/config.yaml)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    pub fn from_env() -> Self {
        Self {
            config_path: env::var("CONFIG_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            server_port: 8080,
        }
    }
}

/// Top level of the YAML file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Configuration {
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

impl Configuration {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Configuration = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Rejects entries that can never clean anything.
    ///
    /// Pattern syntax is not checked here: a bad pattern only disables its
    /// own task when the cleaner is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (idx, task) in self.tasks.iter().enumerate() {
            if task.path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("task {} has an empty path", idx)));
            }
            if task.ttl.is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "task {} ({}) must have a ttl greater than zero",
                    idx,
                    task.path.display()
                )));
            }
        }
        Ok(())
    }
}

/// One configured cleanup task.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Folder to clean
    pub path: PathBuf,
    /// Regular expression a file name must match to be removed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Minimum age since last modification before a file is removed
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// Gap between scans; ttl/4 when unset or zero
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,
    /// Descend into subfolders
    #[serde(default)]
    pub recursive: bool,
    /// Deadline for a single scan
    #[serde(default, with = "humantime_serde")]
    pub scan_timeout: Option<Duration>,
}

impl TaskConfig {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            pattern: None,
            ttl,
            interval: None,
            recursive: false,
            scan_timeout: None,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = Some(timeout);
        self
    }

    /// The pattern source, treating an empty string as no pattern.
    pub fn pattern_source(&self) -> Option<&str> {
        self.pattern.as_deref().filter(|p| !p.is_empty())
    }

    /// Gap between two scans.
    pub fn effective_interval(&self) -> Duration {
        match self.interval {
            Some(interval) if !interval.is_zero() => interval,
            _ => self.ttl / 4,
        }
    }
}
