//! Outbound collaborators: the activity recorder that feeds the health
//! index, and the notification surface (toasts).
//!
//! Both are fire-and-forget. The core never reads anything back from them.

use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value;

use crate::models::{ActivityKind, Severity};

pub trait ActivityRecorder: Send + Sync {
    fn record(&self, kind: ActivityKind, payload: Option<Value>);
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Default recorder: structured log line per activity.
#[derive(Debug, Default)]
pub struct TracingActivityRecorder;

impl ActivityRecorder for TracingActivityRecorder {
    fn record(&self, kind: ActivityKind, payload: Option<Value>) {
        match payload {
            Some(p) => tracing::info!(activity = kind.as_str(), payload = %p, "Activity recorded"),
            None => tracing::info!(activity = kind.as_str(), "Activity recorded"),
        }
    }
}

/// Default notifier: logs at a level matching the severity.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => tracing::warn!(severity = severity.as_str(), "{message}"),
            _ => tracing::info!(severity = severity.as_str(), "{message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedActivity {
    pub kind: ActivityKind,
    pub payload: Option<Value>,
}

/// Keeps every activity in memory, in order.
#[derive(Debug, Default)]
pub struct MemoryActivityRecorder {
    entries: Mutex<Vec<RecordedActivity>>,
}

impl MemoryActivityRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RecordedActivity> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self, kind: ActivityKind) -> usize {
        self.entries
            .lock()
            .map(|e| e.iter().filter(|a| a.kind == kind).count())
            .unwrap_or(0)
    }
}

impl ActivityRecorder for MemoryActivityRecorder {
    fn record(&self, kind: ActivityKind, payload: Option<Value>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(RecordedActivity { kind, payload });
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notification> {
        self.sent.lock().ok().and_then(|s| s.last().cloned())
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(Notification {
                message: message.to_string(),
                severity,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_recorder_keeps_order_and_payload() {
        let recorder = MemoryActivityRecorder::new();
        recorder.record(ActivityKind::HistoryViewed, None);
        recorder.record(
            ActivityKind::AppointmentBooked,
            Some(json!({ "specialty": "Cardiología" })),
        );

        let entries = recorder.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, ActivityKind::HistoryViewed);
        assert_eq!(entries[1].payload.as_ref().unwrap()["specialty"], "Cardiología");
        assert_eq!(recorder.count(ActivityKind::AppointmentBooked), 1);
    }

    #[test]
    fn memory_notifier_tracks_last() {
        let notifier = MemoryNotifier::new();
        assert!(notifier.last().is_none());
        notifier.notify("Bienvenida", Severity::Success);
        notifier.notify("Credenciales inválidas", Severity::Error);
        assert_eq!(notifier.sent().len(), 2);
        assert_eq!(notifier.last().unwrap().severity, Severity::Error);
    }

    #[test]
    fn tracing_defaults_do_not_panic_without_subscriber() {
        TracingActivityRecorder.record(ActivityKind::QueueCheckedIn, Some(json!({ "position": 4 })));
        TracingNotifier.notify("ok", Severity::Info);
    }
}
