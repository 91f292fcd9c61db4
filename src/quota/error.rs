use crate::quota::format::bytes_to_gb;
use thiserror::Error;

/// Why an upload was refused. The display text is shown to the user as is.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdmissionError {
    #[error("{name} exceeds the {} MB file size limit.", mb(.max_bytes))]
    FileTooLarge {
        name: String,
        size_bytes: u64,
        max_bytes: u64,
    },

    #[error("Too many files selected. Maximum {max} files per batch.")]
    TooManyFiles { count: usize, max: usize },

    #[error("Batch size exceeds limit. Maximum batch size is {} MB.", mb(.max_bytes))]
    BatchTooLarge { total_bytes: u64, max_bytes: u64 },

    #[error(
        "Not enough storage space. You need {} GB but only have {} GB remaining.",
        gb(.needed_bytes),
        gb(.remaining_bytes)
    )]
    InsufficientStorage {
        needed_bytes: u64,
        remaining_bytes: u64,
    },
}

impl AdmissionError {
    /// Remaining quota when the refusal was due to quota, in bytes
    pub fn remaining_bytes(&self) -> Option<u64> {
        match self {
            AdmissionError::InsufficientStorage {
                remaining_bytes, ..
            } => Some(*remaining_bytes),
            _ => None,
        }
    }
}

fn mb(bytes: &u64) -> u64 {
    bytes / crate::config::MIB
}

fn gb(bytes: &u64) -> f64 {
    bytes_to_gb(*bytes)
}

pub type AdmissionResult<T> = Result<T, AdmissionError>;
