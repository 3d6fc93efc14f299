//! Virtual queue check-in simulation.
//!
//! `NotCheckedIn → CheckingIn → Active(WAITING) → Active(CALLED) →
//! Active(IN_CONSULTATION)`. Cancel from any state returns to
//! `NotCheckedIn`. At most one check-in is active at a time.
//!
//! Position and wait only ever go down. Each tick removes 0 or 1 from the
//! position (floor 1) and 1..=5 minutes from the wait (floor 5). The
//! patient is CALLED once the position reaches 2.

mod poller;
mod random;

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::activity::ActivityRecorder;
use crate::i18n::{interpolate, queue_state_key, translate};
use crate::models::{ActivityKind, Language, QueueState, QueueStatus};

pub use poller::{PollerHandle, QueuePoller};
pub use random::{RandomSource, SequenceRandom, ThreadRandom};

pub const INITIAL_POSITION: (u32, u32) = (3, 10);
pub const INITIAL_WAIT_MINUTES: (u32, u32) = (15, 60);
pub const POSITION_STEP: (u32, u32) = (0, 1);
pub const WAIT_STEP_MINUTES: (u32, u32) = (1, 5);
pub const MIN_POSITION: u32 = 1;
pub const MIN_WAIT_MINUTES: u32 = 5;
/// Positions at or below this are called in.
pub const CALLED_AT_POSITION: u32 = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Already checked in for appointment {0}")]
    AlreadyCheckedIn(String),

    #[error("No check-in in progress")]
    NotCheckedIn,

    #[error("Patient has not been called yet")]
    NotCalled,

    #[error("Queue lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckIn {
    NotCheckedIn,
    CheckingIn { appointment_id: String },
    Active(QueueStatus),
}

pub struct VirtualQueue {
    state: CheckIn,
    rng: Box<dyn RandomSource>,
}

impl VirtualQueue {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self {
            state: CheckIn::NotCheckedIn,
            rng,
        }
    }

    pub fn with_thread_random() -> Self {
        Self::new(Box::new(ThreadRandom::new()))
    }

    pub fn state(&self) -> &CheckIn {
        &self.state
    }

    pub fn status(&self) -> Option<&QueueStatus> {
        match &self.state {
            CheckIn::Active(status) => Some(status),
            _ => None,
        }
    }

    pub fn is_checked_in(&self) -> bool {
        !matches!(self.state, CheckIn::NotCheckedIn)
    }

    /// Appointment being checked in or waited on.
    pub fn active_appointment(&self) -> Option<&str> {
        match &self.state {
            CheckIn::NotCheckedIn => None,
            CheckIn::CheckingIn { appointment_id } => Some(appointment_id),
            CheckIn::Active(status) => Some(&status.appointment_id),
        }
    }

    pub fn begin_check_in(&mut self, appointment_id: &str) -> Result<(), QueueError> {
        if let Some(existing) = self.active_appointment() {
            return Err(QueueError::AlreadyCheckedIn(existing.to_string()));
        }
        self.state = CheckIn::CheckingIn {
            appointment_id: appointment_id.to_string(),
        };
        Ok(())
    }

    /// Draw the initial position and wait. Fails if the check-in was
    /// cancelled (or replaced) while pending.
    pub fn complete_check_in(&mut self, appointment_id: &str) -> Result<QueueStatus, QueueError> {
        match &self.state {
            CheckIn::CheckingIn { appointment_id: pending } if pending == appointment_id => {}
            _ => return Err(QueueError::NotCheckedIn),
        }

        let position = self.rng.range_inclusive(INITIAL_POSITION.0, INITIAL_POSITION.1);
        let wait = self
            .rng
            .range_inclusive(INITIAL_WAIT_MINUTES.0, INITIAL_WAIT_MINUTES.1);
        let status = QueueStatus {
            appointment_id: appointment_id.to_string(),
            position,
            estimated_wait_minutes: wait,
            status: state_for(position),
        };
        tracing::info!(
            appointment_id,
            position,
            wait_minutes = wait,
            "Checked in to virtual queue"
        );
        self.state = CheckIn::Active(status.clone());
        Ok(status)
    }

    /// Advance the simulation one step. No-op unless waiting or called.
    pub fn tick(&mut self) -> Option<QueueStatus> {
        let CheckIn::Active(status) = &mut self.state else {
            return None;
        };
        if status.status == QueueState::InConsultation {
            return None;
        }

        let step = self.rng.range_inclusive(POSITION_STEP.0, POSITION_STEP.1);
        let wait_step = self
            .rng
            .range_inclusive(WAIT_STEP_MINUTES.0, WAIT_STEP_MINUTES.1);

        let previous = status.status;
        status.position = status.position.saturating_sub(step).max(MIN_POSITION);
        status.estimated_wait_minutes = status
            .estimated_wait_minutes
            .saturating_sub(wait_step)
            .max(MIN_WAIT_MINUTES);
        status.status = state_for(status.position);

        if previous != status.status {
            tracing::info!(
                appointment_id = %status.appointment_id,
                position = status.position,
                "Patient called"
            );
        } else {
            tracing::debug!(
                position = status.position,
                wait_minutes = status.estimated_wait_minutes,
                "Queue tick"
            );
        }
        Some(status.clone())
    }

    /// Called → in consultation.
    pub fn admit(&mut self) -> Result<QueueStatus, QueueError> {
        match &mut self.state {
            CheckIn::Active(status) if status.status == QueueState::Called => {
                status.status = QueueState::InConsultation;
                Ok(status.clone())
            }
            CheckIn::Active(_) => Err(QueueError::NotCalled),
            _ => Err(QueueError::NotCheckedIn),
        }
    }

    /// Discard any check-in. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        let had = self.is_checked_in();
        if had {
            tracing::info!("Virtual queue check-in cancelled");
        }
        self.state = CheckIn::NotCheckedIn;
        had
    }
}

fn state_for(position: u32) -> QueueState {
    if position <= CALLED_AT_POSITION {
        QueueState::Called
    } else {
        QueueState::Waiting
    }
}

fn lock(queue: &Mutex<VirtualQueue>) -> Result<MutexGuard<'_, VirtualQueue>, QueueError> {
    queue.lock().map_err(|_| QueueError::LockPoisoned)
}

/// Check in on a shared queue: reserve the slot, wait the simulated
/// latency without holding the lock, then draw the initial status.
pub async fn check_in(
    queue: &Mutex<VirtualQueue>,
    appointment_id: &str,
    latency: Duration,
    activity: &dyn ActivityRecorder,
) -> Result<QueueStatus, QueueError> {
    lock(queue)?.begin_check_in(appointment_id)?;
    tokio::time::sleep(latency).await;
    let status = lock(queue)?.complete_check_in(appointment_id)?;
    activity.record(
        ActivityKind::QueueCheckedIn,
        Some(json!({
            "appointment_id": status.appointment_id,
            "position": status.position,
            "estimated_wait_minutes": status.estimated_wait_minutes,
        })),
    );
    Ok(status)
}

/// Status line for the queue screen.
pub fn queue_message(state: &CheckIn, language: Language) -> String {
    let text = |key: &'static str| translate(language, key).unwrap_or(key);
    match state {
        CheckIn::NotCheckedIn => text("queue.not_checked_in").to_string(),
        CheckIn::CheckingIn { .. } => text("queue.checking_in").to_string(),
        CheckIn::Active(status) => {
            let position = status.position.to_string();
            let minutes = status.estimated_wait_minutes.to_string();
            interpolate(
                text(queue_state_key(status.status)),
                &[("position", position.as_str()), ("minutes", minutes.as_str())],
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::MemoryActivityRecorder;

    fn scripted(values: &[u32]) -> VirtualQueue {
        VirtualQueue::new(Box::new(SequenceRandom::new(values.to_vec())))
    }

    fn checked_in(queue: &mut VirtualQueue) -> QueueStatus {
        queue.begin_check_in("a-001").unwrap();
        queue.complete_check_in("a-001").unwrap()
    }

    #[test]
    fn initial_status_within_bounds() {
        for _ in 0..200 {
            let mut queue = VirtualQueue::with_thread_random();
            let status = checked_in(&mut queue);
            assert!((3..=10).contains(&status.position), "{}", status.position);
            assert!((15..=60).contains(&status.estimated_wait_minutes));
            assert_eq!(status.status, QueueState::Waiting);
        }
    }

    #[test]
    fn ticks_never_increase_and_respect_floors() {
        let mut queue = VirtualQueue::with_thread_random();
        let mut last = checked_in(&mut queue);
        for _ in 0..100 {
            let next = queue.tick().unwrap();
            assert!(next.position <= last.position);
            assert!(next.position >= MIN_POSITION);
            assert!(next.estimated_wait_minutes <= last.estimated_wait_minutes);
            assert!(next.estimated_wait_minutes >= MIN_WAIT_MINUTES);
            assert_eq!(next.status == QueueState::Called, next.position <= 2);
            last = next;
        }
        assert_eq!(last.position, MIN_POSITION);
        assert_eq!(last.estimated_wait_minutes, MIN_WAIT_MINUTES);
    }

    #[test]
    fn scripted_walk_reaches_called() {
        // position 4, wait 20; then (step, wait_step) pairs
        let mut queue = scripted(&[4, 20, 1, 5, 0, 3, 1, 5, 1, 5]);
        checked_in(&mut queue);

        let s = queue.tick().unwrap();
        assert_eq!((s.position, s.estimated_wait_minutes, s.status), (3, 15, QueueState::Waiting));
        let s = queue.tick().unwrap();
        assert_eq!((s.position, s.estimated_wait_minutes, s.status), (3, 12, QueueState::Waiting));
        let s = queue.tick().unwrap();
        assert_eq!((s.position, s.estimated_wait_minutes, s.status), (2, 7, QueueState::Called));
        let s = queue.tick().unwrap();
        assert_eq!((s.position, s.estimated_wait_minutes, s.status), (1, 5, QueueState::Called));
    }

    #[test]
    fn second_check_in_rejected() {
        let mut queue = VirtualQueue::with_thread_random();
        queue.begin_check_in("a-001").unwrap();
        assert_eq!(
            queue.begin_check_in("a-002").unwrap_err(),
            QueueError::AlreadyCheckedIn("a-001".into())
        );
        queue.complete_check_in("a-001").unwrap();
        assert!(queue.begin_check_in("a-001").is_err());
    }

    #[test]
    fn cancel_discards_status() {
        let mut queue = VirtualQueue::with_thread_random();
        assert!(!queue.cancel());
        checked_in(&mut queue);
        assert!(queue.cancel());
        assert_eq!(queue.state(), &CheckIn::NotCheckedIn);
        assert!(queue.tick().is_none());
        assert!(queue.begin_check_in("a-002").is_ok());
    }

    #[test]
    fn completion_after_cancel_fails() {
        let mut queue = VirtualQueue::with_thread_random();
        queue.begin_check_in("a-001").unwrap();
        queue.cancel();
        assert_eq!(queue.complete_check_in("a-001").unwrap_err(), QueueError::NotCheckedIn);
    }

    #[test]
    fn admit_only_when_called() {
        let mut queue = scripted(&[3, 15, 1, 1]);
        assert_eq!(queue.admit().unwrap_err(), QueueError::NotCheckedIn);
        checked_in(&mut queue);
        assert_eq!(queue.admit().unwrap_err(), QueueError::NotCalled);
        queue.tick();
        let status = queue.admit().unwrap();
        assert_eq!(status.status, QueueState::InConsultation);
        assert!(queue.tick().is_none());
    }

    #[test]
    fn messages_follow_state_and_language() {
        let mut queue = scripted(&[5, 30]);
        assert_eq!(
            queue_message(queue.state(), Language::Es),
            "Aún no ha hecho check-in"
        );
        checked_in(&mut queue);
        assert_eq!(
            queue_message(queue.state(), Language::En),
            "Your position in line is 5. Estimated wait: 30 min"
        );
    }

    #[tokio::test]
    async fn async_check_in_records_activity() {
        let queue = Mutex::new(scripted(&[6, 40]));
        let recorder = MemoryActivityRecorder::new();
        let status = check_in(&queue, "a-002", Duration::ZERO, &recorder).await.unwrap();
        assert_eq!(status.position, 6);
        assert_eq!(recorder.count(ActivityKind::QueueCheckedIn), 1);

        let err = check_in(&queue, "a-003", Duration::ZERO, &recorder).await.unwrap_err();
        assert_eq!(err, QueueError::AlreadyCheckedIn("a-002".into()));
        assert_eq!(recorder.count(ActivityKind::QueueCheckedIn), 1);
    }
}
