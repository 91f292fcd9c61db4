use crate::config::{StorageConfig, MIB};
use crate::quota::error::{AdmissionError, AdmissionResult};
use crate::quota::format::format_bytes;
use crate::quota::tracker::QuotaTracker;
use crate::quota::types::{BatchAdmission, UploadCandidate, UploadLimitsInfo};

/// Upload limits checked before the quota.
///
/// Checks run in a fixed order and stop at the first failure, so the user
/// sees exactly one reason.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size_bytes: u64,
    max_batch_files: usize,
    max_batch_size_bytes: u64,
}

impl UploadValidator {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            max_file_size_bytes: config.max_file_size_bytes,
            max_batch_files: config.max_batch_files,
            max_batch_size_bytes: config.max_batch_size_bytes,
        }
    }

    /// Per-file size, then quota
    pub fn validate_file(
        &self,
        tracker: &QuotaTracker,
        candidate: &UploadCandidate,
    ) -> AdmissionResult<()> {
        self.check_file_size(candidate)
            .and_then(|_| Self::check_quota(tracker, candidate.size_bytes))
            .map_err(|e| {
                tracing::debug!(file = %candidate.name, reason = %e, "Upload rejected");
                e
            })
    }

    /// File count, per-file size, aggregate size, then quota.
    /// Any failure rejects the whole batch.
    pub fn validate_batch(
        &self,
        tracker: &QuotaTracker,
        candidates: &[UploadCandidate],
    ) -> AdmissionResult<BatchAdmission> {
        let result = self.check_batch(tracker, candidates);
        if let Err(ref e) = result {
            tracing::debug!(files = candidates.len(), reason = %e, "Batch rejected");
        }
        result
    }

    fn check_batch(
        &self,
        tracker: &QuotaTracker,
        candidates: &[UploadCandidate],
    ) -> AdmissionResult<BatchAdmission> {
        if candidates.len() > self.max_batch_files {
            return Err(AdmissionError::TooManyFiles {
                count: candidates.len(),
                max: self.max_batch_files,
            });
        }

        for candidate in candidates {
            self.check_file_size(candidate)?;
        }

        let total_bytes = candidates
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(c.size_bytes));
        if total_bytes > self.max_batch_size_bytes {
            return Err(AdmissionError::BatchTooLarge {
                total_bytes,
                max_bytes: self.max_batch_size_bytes,
            });
        }

        Self::check_quota(tracker, total_bytes)?;

        Ok(BatchAdmission {
            file_count: candidates.len(),
            total_bytes,
        })
    }

    /// Account for a finished upload and return the confirmation text
    pub fn record_upload(&self, tracker: &mut QuotaTracker, candidate: &UploadCandidate) -> String {
        tracker.add(candidate.size_bytes);
        tracing::info!(
            file = %candidate.name,
            size_bytes = candidate.size_bytes,
            used_bytes = tracker.used_bytes(),
            "Upload recorded"
        );
        format!(
            "{} ({}) uploaded successfully!",
            candidate.name,
            format_bytes(candidate.size_bytes)
        )
    }

    pub fn upload_limits(&self, tracker: &QuotaTracker) -> UploadLimitsInfo {
        UploadLimitsInfo {
            max_file_size: format!("{} MB", self.max_file_size_bytes / MIB),
            max_batch_files: self.max_batch_files,
            max_batch_size: format!("{} MB", self.max_batch_size_bytes / MIB),
            remaining_storage: tracker.format_remaining_bytes(),
            plan_description: tracker.plan_description(),
        }
    }

    fn check_file_size(&self, candidate: &UploadCandidate) -> AdmissionResult<()> {
        if candidate.size_bytes > self.max_file_size_bytes {
            return Err(AdmissionError::FileTooLarge {
                name: candidate.name.clone(),
                size_bytes: candidate.size_bytes,
                max_bytes: self.max_file_size_bytes,
            });
        }
        Ok(())
    }

    fn check_quota(tracker: &QuotaTracker, size_bytes: u64) -> AdmissionResult<()> {
        if !tracker.can_admit(size_bytes) {
            return Err(AdmissionError::InsufficientStorage {
                needed_bytes: size_bytes,
                remaining_bytes: tracker.remaining(),
            });
        }
        Ok(())
    }
}
