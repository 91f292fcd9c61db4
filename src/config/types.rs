use crate::config::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const MIB: u64 = 1024 * 1024;
pub const GIB: u64 = 1024 * MIB;

/// File retention windows, in hours
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Files are deleted this long after creation
    pub retention_hours: u32,
    /// Warning band starts this long before deletion
    pub warning_hours: u32,
    /// Critical band starts this long before deletion
    pub critical_hours: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            retention_hours: 72,
            warning_hours: 24,
            critical_hours: 6,
        }
    }
}

/// Storage quota and upload limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub capacity_bytes: u64,
    /// Usage assumed when nothing has been persisted yet
    pub baseline_used_bytes: u64,
    pub max_file_size_bytes: u64,
    pub max_batch_files: usize,
    pub max_batch_size_bytes: u64,
    /// Fraction of capacity at which status becomes Warning
    pub warning_threshold: f64,
    /// Fraction of capacity at which status becomes Critical
    pub critical_threshold: f64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: 50 * GIB,
            baseline_used_bytes: 0,
            max_file_size_bytes: 100 * MIB,
            max_batch_files: 10,
            max_batch_size_bytes: 100 * MIB,
            warning_threshold: 0.90,
            critical_threshold: 0.95,
        }
    }
}

/// Timing of the periodic expiration check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Delay before the first check, lets the host finish loading
    pub startup_delay_ms: u64,
    pub check_interval_secs: u64,
    /// How long the host should keep an alert on screen
    pub alert_duration_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: 500,
            check_interval_secs: 60 * 60,
            alert_duration_ms: 4_500,
        }
    }
}

impl SchedulerConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn alert_duration(&self) -> Duration {
        Duration::from_millis(self.alert_duration_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub retention: RetentionConfig,
    pub storage: StorageConfig,
    pub scheduler: SchedulerConfig,
}

impl EngineConfig {
    /// Load from a JSON file. Missing sections and fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by environment variables (and `.env`, if present)
    pub fn from_env() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides on top of the current values
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        override_from_env("RETENTION_HOURS", &mut self.retention.retention_hours)?;
        override_from_env("RETENTION_WARNING_HOURS", &mut self.retention.warning_hours)?;
        override_from_env("RETENTION_CRITICAL_HOURS", &mut self.retention.critical_hours)?;
        override_from_env("STORAGE_CAPACITY_BYTES", &mut self.storage.capacity_bytes)?;
        override_from_env("STORAGE_BASELINE_BYTES", &mut self.storage.baseline_used_bytes)?;
        override_from_env("MAX_FILE_SIZE_BYTES", &mut self.storage.max_file_size_bytes)?;
        override_from_env("MAX_BATCH_FILES", &mut self.storage.max_batch_files)?;
        override_from_env("MAX_BATCH_SIZE_BYTES", &mut self.storage.max_batch_size_bytes)?;
        override_from_env(
            "EXPIRY_CHECK_INTERVAL_SECS",
            &mut self.scheduler.check_interval_secs,
        )?;
        override_from_env(
            "EXPIRY_STARTUP_DELAY_MS",
            &mut self.scheduler.startup_delay_ms,
        )?;
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let r = &self.retention;
        if r.retention_hours == 0 {
            return Err(ConfigError::Invalid("retention_hours must be > 0".into()));
        }
        if r.warning_hours >= r.retention_hours {
            return Err(ConfigError::Invalid(format!(
                "warning_hours ({}) must be less than retention_hours ({})",
                r.warning_hours, r.retention_hours
            )));
        }
        if r.critical_hours > r.warning_hours {
            return Err(ConfigError::Invalid(format!(
                "critical_hours ({}) must not exceed warning_hours ({})",
                r.critical_hours, r.warning_hours
            )));
        }

        let s = &self.storage;
        if s.capacity_bytes == 0 {
            return Err(ConfigError::Invalid("capacity_bytes must be > 0".into()));
        }
        if s.max_file_size_bytes == 0 || s.max_batch_files == 0 || s.max_batch_size_bytes == 0 {
            return Err(ConfigError::Invalid("upload limits must be > 0".into()));
        }
        if !(0.0 < s.warning_threshold
            && s.warning_threshold <= s.critical_threshold
            && s.critical_threshold <= 1.0)
        {
            return Err(ConfigError::Invalid(format!(
                "thresholds must satisfy 0 < warning ({}) <= critical ({}) <= 1",
                s.warning_threshold, s.critical_threshold
            )));
        }

        if self.scheduler.check_interval_secs == 0 {
            return Err(ConfigError::Invalid("check_interval_secs must be > 0".into()));
        }

        Ok(())
    }
}

fn override_from_env<T: FromStr>(key: &str, target: &mut T) -> ConfigResult<()> {
    if let Ok(raw) = env::var(key) {
        *target = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
        })?;
    }
    Ok(())
}
