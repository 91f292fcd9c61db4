use crate::config::RetentionConfig;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Urgency band of a file, ordered from least to most severe
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExpirationStatus {
    Normal,
    Warning,
    Critical,
    Expired,
}

impl ExpirationStatus {
    /// Warning or Critical: the file is still there but should be acted on
    pub fn is_expiring(&self) -> bool {
        matches!(self, ExpirationStatus::Warning | ExpirationStatus::Critical)
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, ExpirationStatus::Expired)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpirationStatus::Normal => "normal",
            ExpirationStatus::Warning => "warning",
            ExpirationStatus::Critical => "critical",
            ExpirationStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for ExpirationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Retention durations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow {
    pub retention: Duration,
    pub warning: Duration,
    pub critical: Duration,
}

impl RetentionWindow {
    pub fn new(retention: Duration, warning: Duration, critical: Duration) -> Self {
        Self {
            retention,
            warning,
            critical,
        }
    }

    pub fn retention_hours(&self) -> i64 {
        self.retention.num_hours()
    }

    pub fn warning_hours(&self) -> i64 {
        self.warning.num_hours()
    }
}

impl Default for RetentionWindow {
    fn default() -> Self {
        Self::from(&RetentionConfig::default())
    }
}

impl From<&RetentionConfig> for RetentionWindow {
    fn from(config: &RetentionConfig) -> Self {
        Self {
            retention: Duration::hours(config.retention_hours as i64),
            warning: Duration::hours(config.warning_hours as i64),
            critical: Duration::hours(config.critical_hours as i64),
        }
    }
}
