//! Client-side file retention and storage quota engine
//!
//! Classifies files by how close they are to automatic deletion, raises one
//! expiry alert per session, tracks storage usage against a fixed quota and
//! admits or rejects uploads before they start.

pub mod config;
pub mod engine;
pub mod metrics;
pub mod notify;
pub mod onboarding;
pub mod quota;
pub mod retention;
pub mod store;

pub use config::EngineConfig;
pub use engine::{EngineError, EngineResult, RetentionEngine};
pub use notify::{AlertRequest, AlertSink, FileDescriptor, Notification};
pub use quota::{AdmissionError, QuotaTracker, UploadCandidate};
pub use retention::{ExpirationStatus, RetentionPolicy};
