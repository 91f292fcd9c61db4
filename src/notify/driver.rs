//! Timer-driven expiration checks
//!
//! One check after a short startup delay, then one per interval, plus one
//! whenever the host publishes a new file list.

use crate::config::SchedulerConfig;
use crate::notify::scheduler::ExpirationScheduler;
use crate::notify::types::{AlertSink, FileDescriptor};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Owns the background check task. Dropping the handle aborts the task.
pub struct SchedulerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop the task and wait for it to exit
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "Expiration check task ended abnormally");
                }
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Start periodic checks. Must be called inside a tokio runtime.
pub fn spawn_scheduler(
    scheduler: Arc<Mutex<ExpirationScheduler>>,
    mut files: watch::Receiver<Vec<FileDescriptor>>,
    sink: Arc<dyn AlertSink>,
    config: &SchedulerConfig,
) -> SchedulerHandle {
    let startup_delay = config.startup_delay();
    let period = config.check_interval();
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        tokio::select! {
            _ = time::sleep(startup_delay) => {}
            _ = &mut shutdown_rx => {
                tracing::debug!("Expiration checks stopped before first run");
                return;
            }
        }

        run_check(&scheduler, &mut files, sink.as_ref());

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut watching = true;

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => run_check(&scheduler, &mut files, sink.as_ref()),
                changed = files.changed(), if watching => match changed {
                    Ok(()) => run_check(&scheduler, &mut files, sink.as_ref()),
                    Err(_) => {
                        // Host dropped the sender; keep the last list and the timer
                        tracing::debug!("File list publisher closed");
                        watching = false;
                    }
                },
            }
        }

        tracing::debug!("Expiration checks stopped");
    });

    SchedulerHandle {
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    }
}

fn run_check(
    scheduler: &Mutex<ExpirationScheduler>,
    files: &mut watch::Receiver<Vec<FileDescriptor>>,
    sink: &dyn AlertSink,
) {
    let snapshot = files.borrow_and_update().clone();
    let evaluation = scheduler.lock().record_check(&snapshot, chrono::Utc::now());
    // Lock released; the sink may call back into the scheduler
    if let Some(ref alert) = evaluation.alert {
        sink.show(alert);
    }
}
