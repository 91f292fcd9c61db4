use crate::retention::{parse_created_at, ExpirationStatus, RetentionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A file as listed by the host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
    /// Raw creation timestamp, parsed on every evaluation
    #[serde(alias = "dateCreated")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl FileDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at: created_at.to_rfc3339(),
            size_bytes: None,
        }
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    pub fn created_at(&self) -> RetentionResult<DateTime<Utc>> {
        parse_created_at(&self.created_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub file_id: String,
    pub file_name: String,
    pub time_remaining: String,
    pub status: ExpirationStatus,
}

/// What was alerted for a file this session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationRecord {
    pub file_id: String,
    pub last_notified_status: ExpirationStatus,
}

impl NotificationRecord {
    pub fn new(file_id: impl Into<String>, status: ExpirationStatus) -> Self {
        Self {
            file_id: file_id.into(),
            last_notified_status: status,
        }
    }
}

impl From<&Notification> for NotificationRecord {
    fn from(n: &Notification) -> Self {
        Self::new(n.file_id.clone(), n.status)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
}

/// Content of a user-facing alert. Rendering is up to the [`AlertSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRequest {
    pub severity: AlertSeverity,
    pub message: String,
    pub description: Option<String>,
    pub action_label: Option<String>,
    pub auto_dismiss: Option<Duration>,
    /// Files the alert is about
    pub file_ids: Vec<String>,
}

/// Displays alerts. The engine and the background driver call `show` with
/// the scheduler unlocked; [`ExpirationScheduler::check`](crate::notify::ExpirationScheduler::check)
/// calls it while holding `&mut self`.
pub trait AlertSink: Send + Sync {
    fn show(&self, alert: &AlertRequest);
}

impl<F> AlertSink for F
where
    F: Fn(&AlertRequest) + Send + Sync,
{
    fn show(&self, alert: &AlertRequest) {
        self(alert)
    }
}

/// Writes alerts to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn show(&self, alert: &AlertRequest) {
        tracing::warn!(
            severity = ?alert.severity,
            files = alert.file_ids.len(),
            description = alert.description.as_deref().unwrap_or(""),
            "{}",
            alert.message
        );
    }
}

/// Result of one pass over the file list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Warning, Critical and Expired files in input order
    pub notifications: Vec<Notification>,
    pub should_alert: bool,
    /// Set iff `should_alert`
    pub alert: Option<AlertRequest>,
    /// Ids of files whose creation time could not be parsed
    pub skipped: Vec<String>,
    pub evaluated_at: DateTime<Utc>,
}

impl Evaluation {
    /// Files still present but inside the warning window
    pub fn candidates(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().filter(|n| n.status.is_expiring())
    }

    pub fn summary(&self) -> NotificationSummary {
        NotificationSummary::from_notifications(&self.notifications)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationSummary {
    pub total: usize,
    pub warning: usize,
    pub critical: usize,
    pub expired: usize,
    pub has_any: bool,
    /// Any Warning or Critical file
    pub has_expiring: bool,
}

impl NotificationSummary {
    pub fn from_notifications(notifications: &[Notification]) -> Self {
        let count = |status| notifications.iter().filter(|n| n.status == status).count();
        let warning = count(ExpirationStatus::Warning);
        let critical = count(ExpirationStatus::Critical);
        let expired = count(ExpirationStatus::Expired);

        Self {
            total: notifications.len(),
            warning,
            critical,
            expired,
            has_any: !notifications.is_empty(),
            has_expiring: warning + critical > 0,
        }
    }
}
