use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("Store error: {0}")]
    StoreError(#[from] crate::store::StoreError),

    #[error("Upload rejected: {0}")]
    AdmissionError(#[from] crate::quota::AdmissionError),

    #[error("Onboarding error: {0}")]
    OnboardingError(#[from] crate::onboarding::OnboardingError),
}

pub type EngineResult<T> = Result<T, EngineError>;
