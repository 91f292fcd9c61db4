//! Metric names and recording helpers

use crate::notify::NotificationSummary;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Register metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    describe_counter!(
        "retention_expiry_alerts_total",
        "Expiry alerts shown to the user"
    );
    describe_counter!(
        "retention_files_skipped_total",
        "Files skipped because their creation time could not be read"
    );
    describe_counter!(
        "retention_store_degraded_total",
        "Stores that failed and fell back to memory"
    );

    describe_gauge!(
        "retention_storage_used_bytes",
        "Tracked storage usage in bytes"
    );
    describe_gauge!(
        "retention_files_expiring",
        "Files in each expiration band at the last check"
    );

    describe_histogram!(
        "retention_check_duration_seconds",
        "Time spent in one expiration check"
    );
}

pub fn record_alert_shown() {
    counter!("retention_expiry_alerts_total").increment(1);
}

pub fn record_file_skipped() {
    counter!("retention_files_skipped_total").increment(1);
}

pub fn record_store_degraded(store: &'static str) {
    counter!("retention_store_degraded_total", "store" => store).increment(1);
}

pub fn set_storage_used(bytes: u64) {
    gauge!("retention_storage_used_bytes").set(bytes as f64);
}

pub fn set_expiring_files(summary: &NotificationSummary) {
    gauge!("retention_files_expiring", "status" => "warning").set(summary.warning as f64);
    gauge!("retention_files_expiring", "status" => "critical").set(summary.critical as f64);
    gauge!("retention_files_expiring", "status" => "expired").set(summary.expired as f64);
}

/// Times one expiration check
pub struct CheckTimer {
    start_time: Instant,
}

impl CheckTimer {
    pub fn start() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    pub fn stop(self) {
        histogram!("retention_check_duration_seconds")
            .record(self.start_time.elapsed().as_secs_f64());
    }
}
