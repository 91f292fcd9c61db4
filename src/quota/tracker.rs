use crate::config::StorageConfig;
use crate::metrics::recorder;
use crate::quota::format::{bytes_to_gb, format_bytes};
use crate::quota::types::{StorageStatus, StorageUsageState, UsageSnapshot};
use crate::store::{keys, KeyValueStore};
use std::sync::Arc;

/// Per-user storage usage backed by a durable store.
///
/// Every mutation is written through before it returns. Write failures are
/// logged and the in-memory value stays authoritative.
pub struct QuotaTracker {
    state: StorageUsageState,
    warning_threshold: f64,
    critical_threshold: f64,
    store: Arc<dyn KeyValueStore>,
}

impl QuotaTracker {
    /// Rehydrate from `store`, falling back to the configured baseline
    pub fn load(config: &StorageConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let capacity = config.capacity_bytes;

        let used = match store.get(keys::STORAGE_USAGE) {
            Ok(Some(raw)) => match parse_usage(&raw) {
                Some(used) => used,
                None => {
                    tracing::warn!(value = %raw, "Unreadable persisted storage usage, using baseline");
                    config.baseline_used_bytes
                }
            },
            Ok(None) => config.baseline_used_bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read storage usage, using baseline");
                config.baseline_used_bytes
            }
        };

        if let Ok(Some(raw)) = store.get(keys::STORAGE_USAGE_SNAPSHOT) {
            match serde_json::from_str::<UsageSnapshot>(&raw) {
                Ok(previous) if previous.capacity_bytes != capacity => {
                    tracing::info!(
                        previous_capacity = previous.capacity_bytes,
                        capacity,
                        used,
                        "Storage capacity changed since last run"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "Ignoring unreadable usage snapshot"),
            }
        }

        let state = StorageUsageState::new(used, capacity);
        if state.used_bytes != used {
            tracing::warn!(used, capacity, "Persisted usage above capacity, clamped");
        }

        let tracker = Self {
            state,
            warning_threshold: config.warning_threshold,
            critical_threshold: config.critical_threshold,
            store,
        };
        tracker.record_gauge();

        tracing::debug!(
            used_bytes = tracker.state.used_bytes,
            capacity_bytes = capacity,
            "Storage quota loaded"
        );

        tracker
    }

    pub fn state(&self) -> StorageUsageState {
        self.state
    }

    pub fn used_bytes(&self) -> u64 {
        self.state.used_bytes
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.state.capacity_bytes
    }

    pub fn remaining(&self) -> u64 {
        self.state.remaining()
    }

    pub fn can_admit(&self, size_bytes: u64) -> bool {
        self.state.can_admit(size_bytes)
    }

    /// Add usage after a successful upload. Clamps at capacity; callers are
    /// expected to have checked [`can_admit`](Self::can_admit).
    pub fn add(&mut self, size_bytes: u64) -> u64 {
        if !self.state.can_admit(size_bytes) {
            tracing::debug!(
                size_bytes,
                used_bytes = self.state.used_bytes,
                "Usage clamped at capacity"
            );
        }
        self.state.add(size_bytes);
        self.persist();
        self.state.used_bytes
    }

    /// Release usage after a delete
    pub fn remove(&mut self, size_bytes: u64) -> u64 {
        self.state.remove(size_bytes);
        self.persist();
        self.state.used_bytes
    }

    /// Replace the counter, e.g. with a value reported by the backend
    pub fn set_usage(&mut self, used_bytes: u64) -> u64 {
        self.state.set_used(used_bytes);
        self.persist();
        self.state.used_bytes
    }

    pub fn percentage(&self) -> u8 {
        self.state.percentage()
    }

    pub fn status(&self) -> StorageStatus {
        self.state
            .status(self.warning_threshold, self.critical_threshold)
    }

    /// "13.2 GB of 50 GB used"
    pub fn format_usage(&self) -> String {
        format!(
            "{} GB of {} GB used",
            bytes_to_gb(self.state.used_bytes),
            bytes_to_gb(self.state.capacity_bytes)
        )
    }

    /// "36.8 GB remaining"
    pub fn format_remaining(&self) -> String {
        format!("{} GB remaining", bytes_to_gb(self.remaining()))
    }

    pub fn format_remaining_bytes(&self) -> String {
        format_bytes(self.remaining())
    }

    /// Banner text once usage enters the warning or critical band
    pub fn storage_warning(&self) -> Option<String> {
        let ratio = self.state.ratio();
        let percent = (ratio * 100.0).round() as u64;

        if ratio >= self.critical_threshold {
            Some(format!(
                "Storage is {percent}% full. Please delete some files to free up space."
            ))
        } else if ratio >= self.warning_threshold {
            Some(format!(
                "Storage is {percent}% full. Consider cleaning up old files."
            ))
        } else {
            None
        }
    }

    pub fn plan_description(&self) -> String {
        format!(
            "Up to {} GB secure document storage per user",
            bytes_to_gb(self.state.capacity_bytes)
        )
    }

    fn persist(&self) {
        if let Err(e) = self
            .store
            .set(keys::STORAGE_USAGE, &self.state.used_bytes.to_string())
        {
            tracing::warn!(error = %e, "Failed to persist storage usage");
        }

        match serde_json::to_string(&UsageSnapshot::from_state(&self.state)) {
            Ok(json) => {
                if let Err(e) = self.store.set(keys::STORAGE_USAGE_SNAPSHOT, &json) {
                    tracing::warn!(error = %e, "Failed to persist usage snapshot");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode usage snapshot"),
        }

        self.record_gauge();
    }

    fn record_gauge(&self) {
        recorder::set_storage_used(self.state.used_bytes);
    }
}

/// Integer counters, or a non-negative decimal written by an older client
fn parse_usage(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<u64>() {
        return Some(value);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value.trunc() as u64),
        _ => None,
    }
}
