use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StorageStatus {
    Normal,
    Warning,
    Critical,
    Full,
}

impl std::fmt::Display for StorageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StorageStatus::Normal => "normal",
            StorageStatus::Warning => "warning",
            StorageStatus::Critical => "critical",
            StorageStatus::Full => "full",
        };
        f.write_str(s)
    }
}

/// Bytes used against a fixed capacity. `used_bytes <= capacity_bytes` holds
/// for every value built through [`StorageUsageState::new`] or the mutators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageUsageState {
    pub used_bytes: u64,
    pub capacity_bytes: u64,
}

impl StorageUsageState {
    /// Build a state, clamping `used_bytes` to capacity
    pub fn new(used_bytes: u64, capacity_bytes: u64) -> Self {
        Self {
            used_bytes: used_bytes.min(capacity_bytes),
            capacity_bytes,
        }
    }

    pub fn can_admit(&self, size_bytes: u64) -> bool {
        self.used_bytes
            .checked_add(size_bytes)
            .map(|total| total <= self.capacity_bytes)
            .unwrap_or(false)
    }

    pub fn add(&mut self, size_bytes: u64) {
        self.used_bytes = self
            .used_bytes
            .saturating_add(size_bytes)
            .min(self.capacity_bytes);
    }

    pub fn remove(&mut self, size_bytes: u64) {
        self.used_bytes = self.used_bytes.saturating_sub(size_bytes);
    }

    pub fn set_used(&mut self, used_bytes: u64) {
        self.used_bytes = used_bytes.min(self.capacity_bytes);
    }

    pub fn remaining(&self) -> u64 {
        self.capacity_bytes.saturating_sub(self.used_bytes)
    }

    /// Fraction of capacity in use, 0.0..=1.0
    pub fn ratio(&self) -> f64 {
        if self.capacity_bytes == 0 {
            return 1.0;
        }
        self.used_bytes as f64 / self.capacity_bytes as f64
    }

    /// Rounded percentage, 0..=100
    pub fn percentage(&self) -> u8 {
        (self.ratio() * 100.0).round().clamp(0.0, 100.0) as u8
    }

    pub fn status(&self, warning_threshold: f64, critical_threshold: f64) -> StorageStatus {
        let ratio = self.ratio();
        if ratio >= 1.0 {
            StorageStatus::Full
        } else if ratio >= critical_threshold {
            StorageStatus::Critical
        } else if ratio >= warning_threshold {
            StorageStatus::Warning
        } else {
            StorageStatus::Normal
        }
    }
}

/// Previous persisted state, kept next to the counter so a capacity change
/// between runs can be detected
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub used_bytes: u64,
    pub capacity_bytes: u64,
    pub updated_at: DateTime<Utc>,
}

impl UsageSnapshot {
    pub fn from_state(state: &StorageUsageState) -> Self {
        Self {
            used_bytes: state.used_bytes,
            capacity_bytes: state.capacity_bytes,
            updated_at: Utc::now(),
        }
    }
}

/// A file the user wants to upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadCandidate {
    pub name: String,
    pub size_bytes: u64,
}

impl UploadCandidate {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
        }
    }
}

/// An accepted batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchAdmission {
    pub file_count: usize,
    pub total_bytes: u64,
}

/// Limits as shown to the user next to an upload control
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadLimitsInfo {
    pub max_file_size: String,
    pub max_batch_files: usize,
    pub max_batch_size: String,
    pub remaining_storage: String,
    pub plan_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps() {
        let state = StorageUsageState::new(150, 100);
        assert_eq!(state.used_bytes, 100);
    }

    #[test]
    fn test_can_admit_boundaries() {
        let state = StorageUsageState::new(90, 100);
        assert!(state.can_admit(0));
        assert!(state.can_admit(10));
        assert!(!state.can_admit(11));
        assert!(!state.can_admit(u64::MAX));
    }

    #[test]
    fn test_status_thresholds() {
        let status = |used| StorageUsageState::new(used, 100).status(0.90, 0.95);
        assert_eq!(status(0), StorageStatus::Normal);
        assert_eq!(status(89), StorageStatus::Normal);
        assert_eq!(status(90), StorageStatus::Warning);
        assert_eq!(status(95), StorageStatus::Critical);
        assert_eq!(status(99), StorageStatus::Critical);
        assert_eq!(status(100), StorageStatus::Full);
    }

    #[test]
    fn test_snapshot_timestamp_is_rfc3339() {
        let snapshot = UsageSnapshot::from_state(&StorageUsageState::new(10, 100));
        let json = serde_json::to_value(&snapshot).unwrap();

        let stamp = json["updated_at"].as_str().unwrap();
        let parsed = DateTime::parse_from_rfc3339(stamp).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), snapshot.updated_at);
        assert_eq!(json["capacity_bytes"], 100);
    }

    #[test]
    fn test_percentage_rounds() {
        assert_eq!(StorageUsageState::new(0, 1000).percentage(), 0);
        assert_eq!(StorageUsageState::new(264, 1000).percentage(), 26);
        assert_eq!(StorageUsageState::new(266, 1000).percentage(), 27);
        assert_eq!(StorageUsageState::new(1000, 1000).percentage(), 100);
    }
}
