use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetentionError {
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}

pub type RetentionResult<T> = Result<T, RetentionError>;
