//! Metrics for the retention engine
//!
//! Recording goes through the `metrics` facade, so nothing is exported
//! unless the host installs a recorder.

pub mod recorder;

pub use recorder::{init_metrics, CheckTimer};
