//! Engine configuration
//!
//! Defaults match the product's published policy: 72 hour retention, warnings
//! 24 hours before deletion, 50 GB per user, 100 MB per file, 10 files and
//! 100 MB per batch.

pub mod error;
pub mod types;

pub use error::{ConfigError, ConfigResult};
pub use types::{EngineConfig, RetentionConfig, SchedulerConfig, StorageConfig, GIB, MIB};
