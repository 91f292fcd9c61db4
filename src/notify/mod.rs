//! Expiration notifications
//!
//! Classifies the host's file list on every check and decides whether the
//! once-per-session expiry alert should be shown. Session state (alert flag,
//! notified ids, last seen id list) lives in a session-scoped store.

pub mod driver;
pub mod notified;
pub mod scheduler;
pub mod types;

pub use driver::{spawn_scheduler, SchedulerHandle};
pub use notified::NotifiedSet;
pub use scheduler::ExpirationScheduler;
pub use types::{
    AlertRequest, AlertSeverity, AlertSink, Evaluation, FileDescriptor, Notification,
    NotificationRecord, NotificationSummary, TracingAlertSink,
};
