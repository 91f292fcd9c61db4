use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OnboardingError {
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

pub type OnboardingResult<T> = Result<T, OnboardingError>;
