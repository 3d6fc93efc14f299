//! Periodic driver for a shared [`VirtualQueue`].
//!
//! The poller runs on the tokio runtime and ticks the queue once per
//! interval. It exits on its own when the check-in is cancelled or the
//! patient enters consultation; otherwise it runs until the handle is
//! stopped or dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::{CheckIn, VirtualQueue};
use crate::models::QueueState;

pub struct QueuePoller {
    queue: Arc<Mutex<VirtualQueue>>,
    interval: Duration,
}

/// Handle for a running poller. Stops the task on `stop()` or on `Drop`.
pub struct PollerHandle {
    task: Option<JoinHandle<()>>,
    finished: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
}

enum TickOutcome {
    Continue,
    Done(&'static str),
}

impl QueuePoller {
    pub fn new(queue: Arc<Mutex<VirtualQueue>>, interval: Duration) -> Self {
        Self { queue, interval }
    }

    /// Start ticking. Must be called from within a tokio runtime.
    pub fn spawn(self) -> PollerHandle {
        let finished = Arc::new(AtomicBool::new(false));
        let ticks = Arc::new(AtomicU64::new(0));
        let done_flag = finished.clone();
        let tick_count = ticks.clone();

        let task = tokio::spawn(async move {
            tracing::debug!(interval_ms = self.interval.as_millis() as u64, "Queue poller started");
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                match tick_once(&self.queue) {
                    TickOutcome::Continue => {
                        tick_count.fetch_add(1, Ordering::Relaxed);
                    }
                    TickOutcome::Done(reason) => {
                        tracing::debug!(reason, "Queue poller exiting");
                        break;
                    }
                }
            }
            done_flag.store(true, Ordering::Relaxed);
        });

        PollerHandle {
            task: Some(task),
            finished,
            ticks,
        }
    }
}

fn tick_once(queue: &Mutex<VirtualQueue>) -> TickOutcome {
    let Ok(mut queue) = queue.lock() else {
        tracing::warn!("Queue lock poisoned, stopping poller");
        return TickOutcome::Done("lock poisoned");
    };
    match queue.state() {
        CheckIn::NotCheckedIn => return TickOutcome::Done("check-in cancelled"),
        CheckIn::Active(status) if status.status == QueueState::InConsultation => {
            return TickOutcome::Done("in consultation")
        }
        _ => {}
    }
    queue.tick();
    TickOutcome::Continue
}

impl PollerHandle {
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.finished.store(true, Ordering::Relaxed);
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some() && !self.finished.load(Ordering::Relaxed)
    }

    /// Ticks applied so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
