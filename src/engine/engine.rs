use crate::config::EngineConfig;
use crate::engine::error::EngineResult;
use crate::notify::{
    spawn_scheduler, AlertSink, Evaluation, ExpirationScheduler, FileDescriptor, SchedulerHandle,
};
use crate::onboarding::{TutorialEvent, TutorialState, TutorialStateMachine};
use crate::quota::{
    AdmissionResult, BatchAdmission, QuotaTracker, UploadCandidate, UploadLimitsInfo,
    UploadValidator,
};
use crate::retention::{RetentionPolicy, RetentionWindow};
use crate::store::{FallbackStore, FileStore, KeyValueStore, MemoryStore};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

const DURABLE_FILE: &str = "durable.bin";

/// Single owner of the retention, quota and onboarding state for one user.
///
/// Both stores are wrapped in [`FallbackStore`], so a storage outage turns
/// into memory-only operation instead of an error.
pub struct RetentionEngine {
    config: EngineConfig,
    policy: RetentionPolicy,
    durable: Arc<FallbackStore>,
    session: Arc<FallbackStore>,
    quota: QuotaTracker,
    validator: UploadValidator,
    scheduler: Arc<Mutex<ExpirationScheduler>>,
    tutorial: TutorialStateMachine,
}

impl RetentionEngine {
    pub fn new(
        config: EngineConfig,
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
    ) -> EngineResult<Self> {
        config.validate()?;

        let durable = Arc::new(FallbackStore::new("durable", durable));
        let session = Arc::new(FallbackStore::new("session", session));

        let policy = RetentionPolicy::new(RetentionWindow::from(&config.retention));
        let quota = QuotaTracker::load(&config.storage, durable.clone());
        let validator = UploadValidator::new(&config.storage);
        let scheduler = ExpirationScheduler::new(policy, &config.scheduler, session.clone());
        let tutorial = TutorialStateMachine::load(durable.clone());

        tracing::info!(
            retention_hours = config.retention.retention_hours,
            capacity_bytes = config.storage.capacity_bytes,
            used_bytes = quota.used_bytes(),
            tutorial = ?tutorial.current_state(),
            "Retention engine ready"
        );

        Ok(Self {
            config,
            policy,
            durable,
            session,
            quota,
            validator,
            scheduler: Arc::new(Mutex::new(scheduler)),
            tutorial,
        })
    }

    /// Durable state in `state_dir`, session state in memory
    pub fn open(config: EngineConfig, state_dir: impl AsRef<Path>) -> EngineResult<Self> {
        let durable = FileStore::open(state_dir.as_ref().join(DURABLE_FILE))?;
        Self::new(config, Arc::new(durable), Arc::new(MemoryStore::new()))
    }

    /// Everything in memory
    pub fn in_memory(config: EngineConfig) -> EngineResult<Self> {
        Self::new(config, Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    pub fn quota_mut(&mut self) -> &mut QuotaTracker {
        &mut self.quota
    }

    pub fn validator(&self) -> &UploadValidator {
        &self.validator
    }

    /// Shared handle for hosts that call `reset`/`summary` while the
    /// background checks run
    pub fn scheduler(&self) -> Arc<Mutex<ExpirationScheduler>> {
        self.scheduler.clone()
    }

    /// True if either store has failed and the engine runs from memory
    pub fn is_degraded(&self) -> bool {
        self.durable.is_degraded() || self.session.is_degraded()
    }

    pub fn admit_upload(&self, candidate: &UploadCandidate) -> AdmissionResult<()> {
        self.validator.validate_file(&self.quota, candidate)
    }

    pub fn admit_batch(&self, candidates: &[UploadCandidate]) -> AdmissionResult<BatchAdmission> {
        self.validator.validate_batch(&self.quota, candidates)
    }

    /// Account for a finished upload, returning the confirmation text
    pub fn record_upload(&mut self, candidate: &UploadCandidate) -> String {
        self.validator.record_upload(&mut self.quota, candidate)
    }

    pub fn upload_limits(&self) -> UploadLimitsInfo {
        self.validator.upload_limits(&self.quota)
    }

    /// Release usage for a deleted file
    pub fn record_delete(&mut self, size_bytes: u64) -> u64 {
        self.quota.remove(size_bytes)
    }

    /// Run one expiration check now. `sink` runs after the scheduler lock
    /// is released, so it may use [`scheduler`](Self::scheduler).
    pub fn check_expirations(
        &self,
        files: &[FileDescriptor],
        now: DateTime<Utc>,
        sink: &dyn AlertSink,
    ) -> Evaluation {
        let evaluation = self.scheduler.lock().record_check(files, now);
        if let Some(ref alert) = evaluation.alert {
            sink.show(alert);
        }
        evaluation
    }

    /// Start timer-driven checks against the host's file list
    pub fn spawn_expiration_checks(
        &self,
        files: watch::Receiver<Vec<FileDescriptor>>,
        sink: Arc<dyn AlertSink>,
    ) -> SchedulerHandle {
        spawn_scheduler(self.scheduler.clone(), files, sink, &self.config.scheduler)
    }

    pub fn tutorial_state(&self) -> TutorialState {
        self.tutorial.current_state()
    }

    pub fn should_show_tutorial(&self) -> bool {
        self.tutorial.should_show()
    }

    pub fn tutorial_event(&mut self, event: TutorialEvent) -> EngineResult<TutorialState> {
        Ok(self.tutorial.transition(event)?)
    }
}
