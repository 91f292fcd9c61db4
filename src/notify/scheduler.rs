use crate::config::SchedulerConfig;
use crate::metrics::recorder::{self, CheckTimer};
use crate::notify::notified::NotifiedSet;
use crate::notify::types::{
    AlertRequest, AlertSeverity, AlertSink, Evaluation, FileDescriptor, Notification,
    NotificationRecord, NotificationSummary,
};
use crate::retention::{ExpirationStatus, RetentionPolicy};
use crate::store::{keys, KeyValueStore};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Decides when to show the once-per-session expiry alert.
///
/// [`evaluate`](Self::evaluate) is pure; session state only changes through
/// [`record_alert_shown`](Self::record_alert_shown),
/// [`sync_file_list`](Self::sync_file_list) and [`reset`](Self::reset).
/// [`check`](Self::check) runs the whole cycle.
pub struct ExpirationScheduler {
    policy: RetentionPolicy,
    session: Arc<dyn KeyValueStore>,
    alert_duration: Duration,

    alert_shown: bool,
    notified: NotifiedSet,
    last_file_ids: Option<Vec<String>>,

    last_notifications: Vec<Notification>,
    last_check: Option<DateTime<Utc>>,
}

impl ExpirationScheduler {
    /// Restore session state from `session`
    pub fn new(
        policy: RetentionPolicy,
        config: &SchedulerConfig,
        session: Arc<dyn KeyValueStore>,
    ) -> Self {
        let alert_shown = match session.get(keys::SHOWN_EXPIRY_ALERT) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session alert flag");
                false
            }
        };

        let notified = match session.get(keys::NOTIFIED_FILE_IDS) {
            Ok(Some(raw)) => NotifiedSet::from_json(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Discarding unreadable notified-file list");
                NotifiedSet::new()
            }),
            Ok(None) => NotifiedSet::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read notified-file list");
                NotifiedSet::new()
            }
        };

        let last_file_ids = match session.get(keys::LAST_FILE_IDS) {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            _ => None,
        };

        Self {
            policy,
            session,
            alert_duration: config.alert_duration(),
            alert_shown,
            notified,
            last_file_ids,
            last_notifications: Vec::new(),
            last_check: None,
        }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    pub fn alert_shown(&self) -> bool {
        self.alert_shown
    }

    pub fn notified(&self) -> &NotifiedSet {
        &self.notified
    }

    /// Notifications from the last [`check`](Self::check)
    pub fn notifications(&self) -> &[Notification] {
        &self.last_notifications
    }

    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.last_check
    }

    pub fn summary(&self) -> NotificationSummary {
        NotificationSummary::from_notifications(&self.last_notifications)
    }

    /// Classify `files` at `now` without touching session state
    pub fn evaluate(&self, files: &[FileDescriptor], now: DateTime<Utc>) -> Evaluation {
        let mut notifications = Vec::new();
        let mut skipped = Vec::new();

        for file in files {
            let created_at = match file.created_at() {
                Ok(ts) => ts,
                Err(e) => {
                    tracing::warn!(file_id = %file.id, error = %e, "Skipping file with unreadable creation time");
                    recorder::record_file_skipped();
                    skipped.push(file.id.clone());
                    continue;
                }
            };

            let status = self.policy.status(created_at, now);
            if status == ExpirationStatus::Normal {
                continue;
            }

            notifications.push(Notification {
                file_id: file.id.clone(),
                file_name: file.name.clone(),
                time_remaining: self.policy.format_remaining(created_at, now),
                status,
            });
        }

        let candidate_ids: Vec<String> = notifications
            .iter()
            .filter(|n| n.status.is_expiring())
            .map(|n| n.file_id.clone())
            .collect();

        let has_new = candidate_ids.iter().any(|id| !self.notified.contains(id));
        let should_alert = !self.alert_shown && has_new;
        let alert = should_alert.then(|| self.build_alert(candidate_ids));

        Evaluation {
            notifications,
            should_alert,
            alert,
            skipped,
            evaluated_at: now,
        }
    }

    /// Mark the session alert as shown and remember which files it covered
    pub fn record_alert_shown<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = NotificationRecord>,
    {
        for record in records {
            self.notified.merge(record);
        }
        self.alert_shown = true;

        self.write(keys::SHOWN_EXPIRY_ALERT, "true");
        self.persist_notified();
    }

    /// Forget this session's alert and notified files
    pub fn reset(&mut self) {
        self.alert_shown = false;
        self.notified.clear();

        for key in [keys::SHOWN_EXPIRY_ALERT, keys::NOTIFIED_FILE_IDS] {
            if let Err(e) = self.session.remove(key) {
                tracing::warn!(key, error = %e, "Failed to clear session key");
            }
        }
        tracing::debug!("Expiry alert session state reset");
    }

    /// Record the current id list. When it differs from the previous one,
    /// notified ids no longer in the list are dropped. Returns how many.
    pub fn sync_file_list(&mut self, files: &[FileDescriptor]) -> usize {
        let mut ids: Vec<String> = files.iter().map(|f| f.id.clone()).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut pruned = 0;
        if let Some(ref previous) = self.last_file_ids {
            if *previous != ids {
                let current: HashSet<&str> = ids.iter().map(String::as_str).collect();
                pruned = self.notified.prune(&current);
                if pruned > 0 {
                    tracing::debug!(pruned, remaining = self.notified.len(), "Pruned notified files");
                    self.persist_notified();
                }
            }
        }

        if self.last_file_ids.as_ref() != Some(&ids) {
            match serde_json::to_string(&ids) {
                Ok(json) => self.write(keys::LAST_FILE_IDS, &json),
                Err(e) => tracing::warn!(error = %e, "Failed to encode file id list"),
            }
            self.last_file_ids = Some(ids);
        }

        pruned
    }

    /// Sync, evaluate, and show the alert through `sink` if it is due
    pub fn check(
        &mut self,
        files: &[FileDescriptor],
        now: DateTime<Utc>,
        sink: &dyn AlertSink,
    ) -> Evaluation {
        let evaluation = self.record_check(files, now);
        if let Some(ref alert) = evaluation.alert {
            sink.show(alert);
        }
        evaluation
    }

    /// [`check`](Self::check) without showing anything. The alert, if due,
    /// is already recorded as shown and is returned in `Evaluation::alert`
    /// for the caller to display. Lets a shared scheduler be unlocked
    /// before the sink runs.
    pub fn record_check(&mut self, files: &[FileDescriptor], now: DateTime<Utc>) -> Evaluation {
        let timer = CheckTimer::start();
        self.sync_file_list(files);
        let evaluation = self.evaluate(files, now);

        if let Some(ref alert) = evaluation.alert {
            let records: Vec<NotificationRecord> =
                evaluation.candidates().map(NotificationRecord::from).collect();
            self.record_alert_shown(records);

            recorder::record_alert_shown();
            tracing::info!(files = alert.file_ids.len(), "Expiry alert due");
        }

        let summary = evaluation.summary();
        recorder::set_expiring_files(&summary);

        tracing::debug!(
            files = files.len(),
            warning = summary.warning,
            critical = summary.critical,
            expired = summary.expired,
            skipped = evaluation.skipped.len(),
            "Expiration check complete"
        );

        self.last_notifications = evaluation.notifications.clone();
        self.last_check = Some(now);
        timer.stop();
        evaluation
    }

    fn build_alert(&self, file_ids: Vec<String>) -> AlertRequest {
        let warning = self.policy.warning_display();
        let message = if file_ids.len() == 1 {
            format!(
                "Heads up: One of your files will be automatically deleted in less than {warning}"
            )
        } else {
            format!(
                "Heads up: {} of your files will be automatically deleted in less than {warning}",
                file_ids.len()
            )
        };

        AlertRequest {
            severity: AlertSeverity::Warning,
            message,
            description: Some(format!(
                "Files are automatically deleted after {} for your security.",
                self.policy.retention_display()
            )),
            action_label: Some("View Files".to_string()),
            auto_dismiss: Some(self.alert_duration),
            file_ids,
        }
    }

    fn persist_notified(&self) {
        match self.notified.to_json() {
            Ok(json) => self.write(keys::NOTIFIED_FILE_IDS, &json),
            Err(e) => tracing::warn!(error = %e, "Failed to encode notified-file list"),
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.session.set(key, value) {
            tracing::warn!(key, error = %e, "Failed to write session state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        alerts: Mutex<Vec<AlertRequest>>,
    }

    impl AlertSink for RecordingSink {
        fn show(&self, alert: &AlertRequest) {
            self.alerts.lock().push(alert.clone());
        }
    }

    impl RecordingSink {
        fn count(&self) -> usize {
            self.alerts.lock().len()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn file(id: &str, hours_ago: i64) -> FileDescriptor {
        FileDescriptor::new(id, format!("{id}.pdf"), now() - ChronoDuration::hours(hours_ago))
    }

    fn scheduler(session: Arc<MemoryStore>) -> ExpirationScheduler {
        ExpirationScheduler::new(RetentionPolicy::default(), &SchedulerConfig::default(), session)
    }

    #[test]
    fn test_evaluate_classifies() {
        let s = scheduler(Arc::new(MemoryStore::new()));
        let files = vec![
            file("fresh", 1),
            file("warn", 50),
            file("crit", 70),
            file("gone", 80),
        ];

        let eval = s.evaluate(&files, now());
        let statuses: Vec<_> = eval
            .notifications
            .iter()
            .map(|n| (n.file_id.as_str(), n.status, n.time_remaining.as_str()))
            .collect();

        assert_eq!(
            statuses,
            vec![
                ("warn", ExpirationStatus::Warning, "22 hours"),
                ("crit", ExpirationStatus::Critical, "2 hours"),
                ("gone", ExpirationStatus::Expired, "Expired"),
            ]
        );
        assert!(eval.should_alert);
        assert_eq!(eval.alert.unwrap().file_ids, vec!["warn", "crit"]);
    }

    #[test]
    fn test_expired_only_does_not_alert() {
        let s = scheduler(Arc::new(MemoryStore::new()));
        let eval = s.evaluate(&[file("gone", 100)], now());
        assert_eq!(eval.notifications.len(), 1);
        assert!(!eval.should_alert);
        assert!(eval.alert.is_none());
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let s = scheduler(Arc::new(MemoryStore::new()));
        let files = vec![file("a", 70)];
        assert_eq!(s.evaluate(&files, now()), s.evaluate(&files, now()));
    }

    #[test]
    fn test_one_alert_per_session() {
        let sink = RecordingSink::default();
        let mut s = scheduler(Arc::new(MemoryStore::new()));
        let files = vec![file("a", 70)];

        let first = s.check(&files, now(), &sink);
        assert!(first.should_alert);
        assert_eq!(sink.count(), 1);

        let second = s.check(&files, now(), &sink);
        assert!(!second.should_alert);
        assert_eq!(sink.count(), 1);

        // A new expiring file later in the same session still stays quiet
        let more = vec![file("a", 70), file("b", 60)];
        let third = s.check(&more, now(), &sink);
        assert!(!third.should_alert);
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_alert_message_wording() {
        let s = scheduler(Arc::new(MemoryStore::new()));

        let one = s.evaluate(&[file("a", 70)], now()).alert.unwrap();
        assert_eq!(
            one.message,
            "Heads up: One of your files will be automatically deleted in less than 24 hours"
        );
        assert_eq!(
            one.description.as_deref(),
            Some("Files are automatically deleted after 72 hours for your security.")
        );
        assert_eq!(one.action_label.as_deref(), Some("View Files"));
        assert_eq!(one.auto_dismiss, Some(Duration::from_millis(4500)));
        assert_eq!(one.severity, AlertSeverity::Warning);

        let many = s
            .evaluate(&[file("a", 70), file("b", 55), file("c", 49)], now())
            .alert
            .unwrap();
        assert!(many.message.starts_with("Heads up: 3 of your files"));
    }

    #[test]
    fn test_session_state_restored() {
        let session = Arc::new(MemoryStore::new());
        let sink = RecordingSink::default();

        let mut s = scheduler(session.clone());
        s.check(&[file("a", 70)], now(), &sink);

        // Same session, fresh scheduler instance
        let restored = scheduler(session);
        assert!(restored.alert_shown());
        assert!(restored.notified().contains("a"));
        assert!(!restored.evaluate(&[file("a", 70)], now()).should_alert);
    }

    #[test]
    fn test_already_notified_files_do_not_alert() {
        let mut s = scheduler(Arc::new(MemoryStore::new()));
        s.record_alert_shown([NotificationRecord::new("a", ExpirationStatus::Warning)]);
        s.alert_shown = false;

        assert!(!s.evaluate(&[file("a", 70)], now()).should_alert);
        assert!(s.evaluate(&[file("a", 70), file("b", 70)], now()).should_alert);
    }

    #[test]
    fn test_reset() {
        let session = Arc::new(MemoryStore::new());
        let sink = RecordingSink::default();
        let mut s = scheduler(session.clone());

        s.check(&[file("a", 70)], now(), &sink);
        s.reset();

        assert!(!s.alert_shown());
        assert!(s.notified().is_empty());
        assert!(session.get(keys::SHOWN_EXPIRY_ALERT).unwrap().is_none());

        s.check(&[file("a", 70)], now(), &sink);
        assert_eq!(sink.count(), 2);
    }

    #[test]
    fn test_prune_on_list_change() {
        let session = Arc::new(MemoryStore::new());
        let mut s = scheduler(session.clone());

        assert_eq!(s.sync_file_list(&[file("a", 70), file("b", 70)]), 0);
        s.record_alert_shown([
            NotificationRecord::new("a", ExpirationStatus::Critical),
            NotificationRecord::new("b", ExpirationStatus::Critical),
        ]);

        // Same set, different order: no change
        assert_eq!(s.sync_file_list(&[file("b", 70), file("a", 70)]), 0);
        assert_eq!(s.notified().len(), 2);

        assert_eq!(s.sync_file_list(&[file("b", 70), file("c", 1)]), 1);
        assert!(!s.notified().contains("a"));
        assert!(s.notified().contains("b"));

        let persisted = NotifiedSet::from_json(&session.get(keys::NOTIFIED_FILE_IDS).unwrap().unwrap()).unwrap();
        assert_eq!(persisted.len(), 1);
    }

    #[test]
    fn test_first_sync_does_not_prune() {
        let session = Arc::new(MemoryStore::new());
        session
            .set(keys::NOTIFIED_FILE_IDS, r#"["old"]"#)
            .unwrap();

        let mut s = scheduler(session);
        assert_eq!(s.sync_file_list(&[file("new", 1)]), 0);
        assert!(s.notified().contains("old"));
    }

    #[test]
    fn test_malformed_timestamp_skipped() {
        let s = scheduler(Arc::new(MemoryStore::new()));
        let mut broken = file("bad", 70);
        broken.created_at = "not a date".into();

        let eval = s.evaluate(&[broken, file("ok", 70)], now());
        assert_eq!(eval.skipped, vec!["bad"]);
        assert_eq!(eval.notifications.len(), 1);
        assert_eq!(eval.notifications[0].file_id, "ok");
    }

    #[test]
    fn test_unrepresentable_timestamp_skipped() {
        let s = scheduler(Arc::new(MemoryStore::new()));
        let mut far = file("far", 0);
        far.created_at = DateTime::<Utc>::MAX_UTC.timestamp_millis().to_string();
        let mut huge = file("huge", 0);
        huge.created_at = "8210266876799999".into();

        let eval = s.evaluate(&[far, huge, file("ok", 70)], now());
        assert_eq!(eval.skipped, vec!["far", "huge"]);
        assert_eq!(eval.notifications.len(), 1);
        assert!(eval.should_alert);
    }

    #[test]
    fn test_record_check_leaves_showing_to_caller() {
        let mut s = scheduler(Arc::new(MemoryStore::new()));
        let files = vec![file("a", 70)];

        let first = s.record_check(&files, now());
        assert!(first.alert.is_some());
        assert!(s.alert_shown());
        assert!(s.notified().contains("a"));

        assert!(s.record_check(&files, now()).alert.is_none());
    }

    #[test]
    fn test_summary_and_last_check() {
        let sink = RecordingSink::default();
        let mut s = scheduler(Arc::new(MemoryStore::new()));
        assert!(s.last_check().is_none());

        s.check(&[file("a", 50), file("b", 70), file("c", 90)], now(), &sink);
        let summary = s.summary();
        assert_eq!(summary.warning, 1);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.expired, 1);
        assert_eq!(s.last_check(), Some(now()));
    }
}
