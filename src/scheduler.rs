//! Repeating-timer scheduling.
//!
//! The attack state machine only needs "run this job every interval, give me
//! a handle I can cancel". [`TokioScheduler`] backs that with a spawned task
//! per timer; [`ManualScheduler`] fires ticks on demand for deterministic
//! tests and headless simulation. Panics inside a job are caught at the
//! callback boundary so one broken attack can never stop the others.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::error;

/// A repeating unit of work.
pub type Job = Box<dyn FnMut() + Send>;

/// Schedules repeating jobs and returns cancel handles.
pub trait Scheduler: Send + Sync {
    /// Schedules `job` to run every `interval`, starting one interval from
    /// now. The job keeps running until the returned handle is canceled or
    /// dropped.
    fn schedule_repeating(&self, interval: Duration, job: Job) -> TimerHandle;
}

/// Cancel handle for a scheduled repeating job.
///
/// Canceling is idempotent, and dropping the handle cancels the job too, so
/// a timer can never outlive the record holding its handle.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    /// Wraps a cancellation closure.
    #[must_use]
    pub fn from_cancel_fn(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stops the job. Safe to call on an already-canceled handle.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Runs one job invocation, trapping panics at the callback boundary.
fn run_guarded(job: &mut Job) {
    if catch_unwind(AssertUnwindSafe(|| job())).is_err() {
        error!("timer job panicked; suppressing so other timers keep running");
    }
}

// ---------------------------------------------------------------------------
// Tokio scheduler
// ---------------------------------------------------------------------------

/// Scheduler backed by the ambient tokio runtime.
///
/// Must be used from within a runtime; each timer is one spawned task
/// driving a [`tokio::time::interval`]. Missed ticks are skipped rather than
/// bursted, matching the cooperative single-lane model.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, interval: Duration, mut job: Job) -> TimerHandle {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of a tokio interval completes immediately;
            // consume it so the job first fires one interval from now.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                run_guarded(&mut job);
            }
        });
        TimerHandle::from_cancel_fn(move || handle.abort())
    }
}

// ---------------------------------------------------------------------------
// Manual scheduler
// ---------------------------------------------------------------------------

struct JobSlot {
    canceled: AtomicBool,
    job: Mutex<Job>,
}

/// Scheduler whose clock only advances when told to.
///
/// `tick()` runs every live job exactly once. Jobs scheduled or canceled
/// from within a running job are honored: new jobs join the next tick, and
/// a cancellation takes effect before the slot would next fire.
#[derive(Default)]
pub struct ManualScheduler {
    slots: Mutex<Vec<Arc<JobSlot>>>,
}

impl ManualScheduler {
    /// Creates an empty manual scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires one tick: every job that is still live runs once.
    pub fn tick(&self) {
        // Snapshot first — a job may register or cancel timers while running,
        // and that must not deadlock against the slot list.
        let slots: Vec<Arc<JobSlot>> = self
            .slots
            .lock()
            .expect("scheduler slot list poisoned")
            .iter()
            .cloned()
            .collect();
        for slot in slots {
            if slot.canceled.load(Ordering::SeqCst) {
                continue;
            }
            let mut job = slot.job.lock().expect("scheduler job poisoned");
            run_guarded(&mut job);
        }
        self.slots
            .lock()
            .expect("scheduler slot list poisoned")
            .retain(|slot| !slot.canceled.load(Ordering::SeqCst));
    }

    /// Fires `n` ticks.
    pub fn tick_n(&self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Number of jobs that have not been canceled.
    #[must_use]
    pub fn active_jobs(&self) -> usize {
        self.slots
            .lock()
            .expect("scheduler slot list poisoned")
            .iter()
            .filter(|slot| !slot.canceled.load(Ordering::SeqCst))
            .count()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, _interval: Duration, job: Job) -> TimerHandle {
        let slot = Arc::new(JobSlot {
            canceled: AtomicBool::new(false),
            job: Mutex::new(job),
        });
        self.slots
            .lock()
            .expect("scheduler slot list poisoned")
            .push(Arc::clone(&slot));
        TimerHandle::from_cancel_fn(move || slot.canceled.store(true, Ordering::SeqCst))
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("active_jobs", &self.active_jobs())
            .finish()
    }
}
