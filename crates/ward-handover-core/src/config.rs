//! Runtime configuration.
//!
//! Resolved once at process startup and passed into the services, so request
//! handling never reads process-wide environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::Duration;
use thiserror::Error;

use crate::lifecycle::{DEFAULT_RETENTION_DAYS, DEFAULT_SWEEP_INTERVAL};

pub const ENV_DB_PATH: &str = "WARD_DB_PATH";
pub const ENV_RETENTION_DAYS: &str = "WARD_RETENTION_DAYS";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "WARD_SWEEP_INTERVAL_SECS";
pub const ENV_SESSION_TTL_HOURS: &str = "WARD_SESSION_TTL_HOURS";

const DEFAULT_DB_PATH: &str = "ward-handover.db";
const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

// Upper bounds keep timestamp arithmetic inside chrono's range
const MAX_DAYS: u64 = 36_500;
const MAX_HOURS: u64 = MAX_DAYS * 24;
const MAX_SECS: u64 = MAX_HOURS * 3600;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} must be a positive integer within range, got {value:?}")]
    NotPositive { key: &'static str, value: String },

    #[error("database path cannot be empty")]
    EmptyDatabasePath,
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: PathBuf,
    retention: Duration,
    sweep_interval: StdDuration,
    session_ttl: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }
}

impl CoreConfig {
    /// Read configuration from process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH) {
            config = config.with_database_path(path)?;
        }
        if let Some(days) = lookup(ENV_RETENTION_DAYS) {
            config.retention = Duration::days(positive(ENV_RETENTION_DAYS, &days, MAX_DAYS)? as i64);
        }
        if let Some(secs) = lookup(ENV_SWEEP_INTERVAL_SECS) {
            config.sweep_interval = StdDuration::from_secs(positive(ENV_SWEEP_INTERVAL_SECS, &secs, MAX_SECS)?);
        }
        if let Some(hours) = lookup(ENV_SESSION_TTL_HOURS) {
            config.session_ttl = Duration::hours(positive(ENV_SESSION_TTL_HOURS, &hours, MAX_HOURS)? as i64);
        }

        Ok(config)
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        self.database_path = path;
        Ok(self)
    }

    pub fn with_retention_days(mut self, days: u32) -> Result<Self, ConfigError> {
        if days == 0 || days as u64 > MAX_DAYS {
            return Err(ConfigError::NotPositive {
                key: ENV_RETENTION_DAYS,
                value: days.to_string(),
            });
        }
        self.retention = Duration::days(days as i64);
        Ok(self)
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// How long archived patients are kept before automatic purge.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn sweep_interval(&self) -> StdDuration {
        self.sweep_interval
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}

fn positive(key: &'static str, raw: &str, max: u64) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 && n <= max => Ok(n),
        _ => Err(ConfigError::NotPositive {
            key,
            value: raw.to_string(),
        }),
    }
}
