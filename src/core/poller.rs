//! Generation job lifecycle state machine.
//!
//! Owns one job at a time: `Idle -> Generating -> Polling -> {Completed |
//! Error}`, with `reset()` returning to `Idle` from any state. A single
//! spawned task drives every timer (status poll, progress estimate, hard
//! ceiling) inside one `select!` loop, so one cancellation signal tears all
//! of them down together.
//!
//! The remote API reports no fractional completion, so progress is a
//! wall-clock estimate against an assumed job length, capped at 99 until a
//! terminal status arrives. Cancellation is cooperative: it stops future
//! ticks but cannot abort a request already in flight, and a snapshot write
//! racing a cancellation is suppressed by a per-job flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tracing::{debug, info, warn};

use crate::core::client::GenerationClient;
use crate::core::models::{GenerationParams, GenerationResult, JobSnapshot, JobStatus};

/// Progress reported immediately after a job is accepted.
const INITIAL_PROGRESS: u8 = 5;

/// Progress ceiling while no terminal status has been observed.
const PROGRESS_CAP: u8 = 99;

/// Timing knobs for the poll loop. Production uses [`PollerConfig::default`];
/// tests shrink the durations.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Interval between status checks.
    pub poll_interval: Duration,
    /// Interval between progress-estimate recomputations.
    pub progress_interval: Duration,
    /// Assumed job length used to convert elapsed time into progress.
    pub estimated_duration: Duration,
    /// Hard ceiling: a job with no terminal status by this point fails.
    pub max_wait: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            progress_interval: Duration::from_secs(1),
            estimated_duration: Duration::from_secs(300),
            max_wait: Duration::from_secs(480),
        }
    }
}

struct ActiveJob {
    cancelled: Arc<AtomicBool>,
    cancel: Arc<Notify>,
    task: JoinHandle<()>,
}

/// Drives one generation job at a time and publishes [`JobSnapshot`]s
/// through a watch channel.
pub struct GenerationPoller {
    client: Arc<GenerationClient>,
    config: PollerConfig,
    tx: Arc<watch::Sender<JobSnapshot>>,
    active: Option<ActiveJob>,
}

impl GenerationPoller {
    /// Create an idle poller.
    #[must_use]
    pub fn new(client: Arc<GenerationClient>, config: PollerConfig) -> Self {
        let (tx, _rx) = watch::channel(JobSnapshot::default());
        Self {
            client,
            config,
            tx: Arc::new(tx),
            active: None,
        }
    }

    /// Current view of the job.
    #[must_use]
    pub fn snapshot(&self) -> JobSnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.tx.subscribe()
    }

    /// Submit a job and begin polling. Any previous job is reset first.
    pub fn start(&mut self, params: GenerationParams) {
        self.reset();

        let cancelled = Arc::new(AtomicBool::new(false));
        let cancel = Arc::new(Notify::new());
        let task = tokio::spawn(run_job(
            Arc::clone(&self.client),
            params,
            self.config.clone(),
            Arc::clone(&self.tx),
            Arc::clone(&cancelled),
            Arc::clone(&cancel),
        ));
        self.active = Some(ActiveJob {
            cancelled,
            cancel,
            task,
        });
    }

    /// Stop all timers and clear the job. Idempotent and safe in any state;
    /// an in-flight request is not aborted but its outcome is discarded.
    pub fn reset(&mut self) {
        if let Some(job) = self.active.take() {
            job.cancelled.store(true, Ordering::SeqCst);
            job.cancel.notify_one();
            drop(job.task);
        }
        self.tx.send_replace(JobSnapshot::default());
    }

    /// Wait until the current job reaches a terminal state and return the
    /// final snapshot. Returns immediately when already terminal.
    pub async fn wait_terminal(&self) -> JobSnapshot {
        let mut rx = self.tx.subscribe();
        loop {
            let snap = rx.borrow_and_update().clone();
            if snap.status.is_terminal() {
                return snap;
            }
            if rx.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }
}

impl Drop for GenerationPoller {
    fn drop(&mut self) {
        if let Some(job) = &self.active {
            job.cancelled.store(true, Ordering::SeqCst);
            job.cancel.notify_one();
        }
    }
}

/// Publish a snapshot mutation unless the job has been cancelled.
///
/// The flag check runs inside the channel's mutation closure, under the
/// same lock as `reset()`'s `send_replace`, so a write racing a reset can
/// never land after the snapshot was cleared.
fn publish(
    tx: &watch::Sender<JobSnapshot>,
    cancelled: &AtomicBool,
    f: impl FnOnce(&mut JobSnapshot),
) {
    tx.send_if_modified(|s| {
        if cancelled.load(Ordering::SeqCst) {
            return false;
        }
        f(s);
        true
    });
}

fn fail(tx: &watch::Sender<JobSnapshot>, cancelled: &AtomicBool, message: String) {
    warn!(message = message.as_str(), "job entered error state");
    publish(tx, cancelled, |s| {
        s.status = JobStatus::Error;
        s.error_message = Some(message);
    });
}

/// Recompute the synthetic progress estimate. Published only when it beats
/// the last value by at least one point, and never above the cap before a
/// terminal status.
fn update_progress(
    tx: &watch::Sender<JobSnapshot>,
    cancelled: &AtomicBool,
    started: Instant,
    estimated: Duration,
) {
    let elapsed = started.elapsed().as_secs_f64();
    let ratio = elapsed / estimated.as_secs_f64().max(f64::EPSILON);
    let pct = (ratio * 100.0).min(f64::from(PROGRESS_CAP)) as u8;
    tx.send_if_modified(|s| {
        if cancelled.load(Ordering::SeqCst) || pct <= s.progress_percent {
            return false;
        }
        s.progress_percent = pct;
        true
    });
}

#[allow(clippy::too_many_lines)]
async fn run_job(
    client: Arc<GenerationClient>,
    params: GenerationParams,
    config: PollerConfig,
    tx: Arc<watch::Sender<JobSnapshot>>,
    cancelled: Arc<AtomicBool>,
    cancel: Arc<Notify>,
) {
    let started = Instant::now();
    publish(&tx, &cancelled, |s| {
        *s = JobSnapshot {
            status: JobStatus::Generating,
            started_at: Some(Utc::now()),
            ..JobSnapshot::default()
        };
    });

    let task_id = tokio::select! {
        () = cancel.notified() => return,
        result = client.start_generation(&params) => match result {
            Ok(id) => id,
            Err(e) => {
                fail(&tx, &cancelled, e.to_string());
                return;
            }
        },
    };

    info!(task_id = task_id.as_str(), "polling for completion");
    publish(&tx, &cancelled, |s| {
        s.job_id = Some(task_id.clone());
        s.status = JobStatus::Polling;
        s.progress_percent = INITIAL_PROGRESS;
    });

    let mut poll_tick = interval_at(Instant::now() + config.poll_interval, config.poll_interval);
    poll_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut progress_tick = interval_at(
        Instant::now() + config.progress_interval,
        config.progress_interval,
    );
    progress_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let deadline = sleep_until(started + config.max_wait);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = cancel.notified() => return,
            () = &mut deadline => {
                warn!(task_id = task_id.as_str(), "hard ceiling reached");
                publish(&tx, &cancelled, |s| {
                    s.status = JobStatus::Error;
                    s.timed_out = true;
                    s.error_message = Some(format!(
                        "generation timed out after {}s without a terminal status",
                        config.max_wait.as_secs()
                    ));
                });
                return;
            }
            _ = poll_tick.tick() => {
                match client.poll_status(&task_id).await {
                    Ok(payload) if payload.is_completed() => {
                        let result = GenerationResult::from_payload(&task_id, &payload, &params);
                        info!(task_id = task_id.as_str(), "job completed");
                        publish(&tx, &cancelled, |s| {
                            s.status = JobStatus::Completed;
                            s.progress_percent = 100;
                            s.result = Some(result);
                        });
                        return;
                    }
                    Ok(payload) if payload.is_error() => {
                        let message = payload
                            .message
                            .unwrap_or_else(|| "generation failed remotely".to_string());
                        fail(&tx, &cancelled, message);
                        return;
                    }
                    Ok(payload) => {
                        debug!(
                            task_id = task_id.as_str(),
                            status = payload.status.as_str(),
                            "job still running"
                        );
                        // Status first, then progress, within the same tick.
                        update_progress(&tx, &cancelled, started, config.estimated_duration);
                    }
                    Err(e) => {
                        fail(&tx, &cancelled, e.to_string());
                        return;
                    }
                }
            }
            _ = progress_tick.tick() => {
                update_progress(&tx, &cancelled, started, config.estimated_duration);
            }
        }
    }
}
