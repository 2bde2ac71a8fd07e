//! Configuration loading and management
//!
//! Handles parsing of `taskm.toml`. Every field has a default, so an absent
//! file or an empty one yields the stock layout under `./storage`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// File name looked up inside the storage directory
pub const CONFIG_FILE_NAME: &str = "taskm.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logger: LoggerConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

/// Where task data lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_tasks_file")]
    pub tasks_file: String,

    #[serde(default = "default_archive_file")]
    pub archive_file: String,

    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_dir() -> PathBuf {
    PathBuf::from("storage")
}

fn default_tasks_file() -> String {
    "tasks.txt".to_string()
}

fn default_archive_file() -> String {
    "archive.txt".to_string()
}

fn default_log_file() -> String {
    "log.txt".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            tasks_file: default_tasks_file(),
            archive_file: default_archive_file(),
            log_file: default_log_file(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Messages buffered before new ones are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    100
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Time between archive passes (e.g. "30s", "5m")
    #[serde(default = "default_archive_interval")]
    pub interval: String,

    /// Only append done tasks whose id is not in the archive yet
    #[serde(default = "default_true")]
    pub skip_archived: bool,
}

fn default_archive_interval() -> String {
    "30s".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            interval: default_archive_interval(),
            skip_archived: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// Upper bound on each wait for background workers
    #[serde(default = "default_shutdown_timeout")]
    pub timeout: String,
}

fn default_shutdown_timeout() -> String {
    "10s".to_string()
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout: default_shutdown_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from a `taskm.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| Error::storage(path, err))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Pick the configuration for this run.
    ///
    /// An explicit path must exist. Otherwise `<storage_dir>/taskm.toml` is
    /// used when present, else defaults. `storage_dir` wins over the file's
    /// `storage.dir`.
    pub fn resolve(explicit: Option<&Path>, storage_dir: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let dir = storage_dir.map(Path::to_path_buf).unwrap_or_else(default_dir);
                let candidate = dir.join(CONFIG_FILE_NAME);
                if candidate.is_file() {
                    Self::load(&candidate)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(dir) = storage_dir {
            config.storage.dir = dir.to_path_buf();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "storage.dir cannot be empty".to_string(),
            ));
        }
        for (field, name) in [
            ("storage.tasks_file", &self.storage.tasks_file),
            ("storage.archive_file", &self.storage.archive_file),
            ("storage.log_file", &self.storage.log_file),
        ] {
            if name.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{field} cannot be empty")));
            }
        }

        if self.logger.queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "logger.queue_capacity must be > 0".to_string(),
            ));
        }

        self.archive_interval()?;
        self.shutdown_timeout()?;
        Ok(())
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.storage.dir.join(&self.storage.tasks_file)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.storage.dir.join(&self.storage.archive_file)
    }

    pub fn log_path(&self) -> PathBuf {
        self.storage.dir.join(&self.storage.log_file)
    }

    pub fn archive_interval(&self) -> Result<Duration> {
        positive_duration(&self.archive.interval, "archive.interval")
    }

    pub fn shutdown_timeout(&self) -> Result<Duration> {
        positive_duration(&self.shutdown.timeout, "shutdown.timeout")
    }
}

/// Upper bound for configured intervals and timeouts (one year).
const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn positive_duration(raw: &str, field: &str) -> Result<Duration> {
    let duration = parse_duration(raw)
        .map_err(|err| Error::InvalidConfig(format!("{field}: {err}")))?;
    if duration.is_zero() {
        return Err(Error::InvalidConfig(format!("{field} must be > 0")));
    }
    if duration > MAX_DURATION {
        return Err(Error::InvalidConfig(format!("{field} must be at most 365d")));
    }
    Ok(duration)
}

/// Parse a duration string like "30s", "5m", "2h", "1d", "1w".
///
/// A bare number is minutes.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    if s.is_empty() {
        return Err(Error::InvalidArgument("Duration cannot be empty".to_string()));
    }

    let (num_str, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(pos) => (&s[..pos], s[pos..].trim()),
        None => (s, "m"),
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("Invalid duration number: '{}'", num_str)))?;

    let seconds_per_unit = match unit.to_lowercase().as_str() {
        "s" | "sec" | "second" | "seconds" => 1,
        "m" | "min" | "minute" | "minutes" => 60,
        "h" | "hr" | "hour" | "hours" => 60 * 60,
        "d" | "day" | "days" => 24 * 60 * 60,
        "w" | "week" | "weeks" => 7 * 24 * 60 * 60,
        _ => {
            return Err(Error::InvalidArgument(format!(
                "Invalid duration unit '{}'. Expected: s, m, h, d, w",
                unit
            )));
        }
    };

    num.checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| Error::InvalidArgument(format!("Duration too large: '{}'", s)))
}
