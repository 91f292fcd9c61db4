//! Storage quota tracking and upload admission
//!
//! The tracker owns the per-user byte counter, keeps it within
//! `0..=capacity`, and writes it to the durable store on every change.
//! The validator applies upload limits before consulting the tracker.

pub mod error;
pub mod format;
pub mod tracker;
pub mod types;
pub mod validation;

pub use error::{AdmissionError, AdmissionResult};
pub use format::{bytes_to_gb, format_bytes};
pub use tracker::QuotaTracker;
pub use types::{
    BatchAdmission, StorageStatus, StorageUsageState, UploadCandidate, UploadLimitsInfo,
    UsageSnapshot,
};
pub use validation::UploadValidator;
