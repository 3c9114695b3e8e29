// SPDX-License-Identifier: MIT

//! Volume configuration
//!
//! One TOML table per managed volume. The configuration is parsed and
//! validated once at startup into an immutable [`Config`] value that is
//! passed by reference into the scheduler; nothing mutates it afterwards.
//!
//! ```toml
//! interval = "5m"
//!
//! [volume."tank/data"]
//! mountpoint = "/tank/data"
//! time = "21:00"            # or "trigger"
//! snapshot = true
//! clean = true
//! schema = "7d3w11m5y"
//!
//! [volume."tank/data".replicate]
//! target = "backup/tank-data"
//! host = "bak.example.com"  # omit for a local target
//! port = 22
//! compression = "zstd"
//! ```

use crate::retention;
use crate::runner::Endpoint;
use chrono::NaiveTime;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_SSH_PORT: u16 = 22;

static DATASET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-_:.a-zA-Z0-9][-_:./a-zA-Z0-9]*$").expect("constant regex pattern is valid")
});

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("[{volume}] is not a valid dataset name")]
    InvalidDataset { volume: String },
    #[error("[{volume}] invalid time {value:?}: expected \"HH:MM\" or \"trigger\"")]
    InvalidTime { volume: String, value: String },
    #[error("[{volume}] invalid retention schema {value:?}")]
    InvalidSchema { volume: String, value: String },
    #[error("[{volume}] replication target {value:?} is not a valid dataset name")]
    InvalidTarget { volume: String, value: String },
}

/// When a volume's decision procedure fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPolicy {
    /// Fire when a `.trigger` marker file appears under the mountpoint
    TriggerFile,
    /// Fire once per day after this local time
    TimeOfDay(NaiveTime),
}

/// Replication direction relative to the local host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Push,
    Pull,
}

/// Where and how a volume replicates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationTarget {
    /// Remote endpoint; `Local` replicates to another local dataset
    pub endpoint: Endpoint,
    /// Dataset name on the other side
    pub dataset: String,
    pub direction: Direction,
    /// Compression codec piped into the transfer, e.g. `zstd`
    pub compression: Option<String>,
}

/// A configured volume under management
#[derive(Debug, Clone)]
pub struct Volume {
    pub mountpoint: PathBuf,
    pub policy: TriggerPolicy,
    /// Whether to take snapshots at all (a volume may replicate only)
    pub snapshot: bool,
    /// Whether the retention cleaner runs for this volume
    pub clean: bool,
    /// Retention schema string handed to the cleaner
    pub schema: String,
    pub replicate: Option<ReplicationTarget>,
}

/// Immutable daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Sleep between scheduling cycles
    pub interval: Duration,
    /// Log file directory; stderr logging when absent
    pub log_dir: Option<PathBuf>,
    /// Pid/lock file path
    pub pid_file: Option<PathBuf>,
    /// Volumes keyed by dataset name
    pub volumes: BTreeMap<String, Volume>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(with = "humantime_serde", default = "default_interval")]
    interval: Duration,
    log_dir: Option<PathBuf>,
    pid_file: Option<PathBuf>,
    #[serde(default)]
    volume: BTreeMap<String, RawVolume>,
}

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVolume {
    mountpoint: PathBuf,
    time: String,
    #[serde(default = "default_true")]
    snapshot: bool,
    #[serde(default = "default_true")]
    clean: bool,
    schema: String,
    replicate: Option<RawReplicate>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReplicate {
    target: String,
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    #[serde(default)]
    direction: Direction,
    compression: Option<String>,
}

/// Load and validate configuration from a file
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

/// Parse and validate configuration from TOML content
pub fn parse(content: &str) -> Result<Config, ConfigError> {
    let raw: RawConfig = toml::from_str(content)?;

    let mut volumes = BTreeMap::new();
    for (dataset, raw_volume) in raw.volume {
        if !DATASET_NAME.is_match(&dataset) {
            return Err(ConfigError::InvalidDataset { volume: dataset });
        }
        let volume = validate_volume(&dataset, raw_volume)?;
        volumes.insert(dataset, volume);
    }

    Ok(Config {
        interval: raw.interval,
        log_dir: raw.log_dir,
        pid_file: raw.pid_file,
        volumes,
    })
}

fn validate_volume(dataset: &str, raw: RawVolume) -> Result<Volume, ConfigError> {
    let policy = parse_policy(&raw.time).ok_or_else(|| ConfigError::InvalidTime {
        volume: dataset.to_string(),
        value: raw.time.clone(),
    })?;

    if retention::parse_schema(&raw.schema).is_none() {
        return Err(ConfigError::InvalidSchema {
            volume: dataset.to_string(),
            value: raw.schema,
        });
    }

    let replicate = raw
        .replicate
        .map(|r| validate_replicate(dataset, r))
        .transpose()?;

    Ok(Volume {
        mountpoint: raw.mountpoint,
        policy,
        snapshot: raw.snapshot,
        clean: raw.clean,
        schema: raw.schema,
        replicate,
    })
}

fn validate_replicate(dataset: &str, raw: RawReplicate) -> Result<ReplicationTarget, ConfigError> {
    if !DATASET_NAME.is_match(&raw.target) {
        return Err(ConfigError::InvalidTarget {
            volume: dataset.to_string(),
            value: raw.target,
        });
    }
    let endpoint = match raw.host {
        Some(host) => Endpoint::ssh(host, raw.port.unwrap_or(DEFAULT_SSH_PORT), raw.user),
        None => Endpoint::Local,
    };
    Ok(ReplicationTarget {
        endpoint,
        dataset: raw.target,
        direction: raw.direction,
        compression: raw.compression,
    })
}

fn parse_policy(value: &str) -> Option<TriggerPolicy> {
    if value == "trigger" {
        return Some(TriggerPolicy::TriggerFile);
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .ok()
        .map(TriggerPolicy::TimeOfDay)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
