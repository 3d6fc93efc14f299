//! Dashboard: the landing screen after sign-in.
//!
//! Pure assembly over the appointment book, the history and the queue.

use chrono::NaiveDate;
use serde::Serialize;

use crate::appointment::{AppointmentBook, AppointmentView};
use crate::history::MedicalHistory;
use crate::i18n::{interpolate, translate};
use crate::models::{Language, QueueStatus, RecordType, User};

/// Records shown under "recent records".
pub const RECENT_RECORDS_LIMIT: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct RecordCard {
    pub id: String,
    pub date: NaiveDate,
    pub record_type: RecordType,
    pub diagnosis: String,
    pub doctor: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub greeting: String,
    pub next_appointment: Option<AppointmentView>,
    pub upcoming_count: usize,
    pub recent_records: Vec<RecordCard>,
    pub allergy_count: usize,
    pub queue: Option<QueueStatus>,
}

/// First word of the full name; the whole name if it has one word.
pub fn first_name(full_name: &str) -> &str {
    full_name.split_whitespace().next().unwrap_or(full_name)
}

pub fn build_dashboard(
    user: &User,
    book: &AppointmentBook,
    history: &MedicalHistory,
    queue: Option<QueueStatus>,
    language: Language,
    today: NaiveDate,
) -> DashboardSummary {
    let template = translate(language, "dashboard.greeting").unwrap_or("{name}");
    let recent_records = history
        .recent(RECENT_RECORDS_LIMIT)
        .into_iter()
        .map(|r| RecordCard {
            id: r.id.clone(),
            date: r.date,
            record_type: r.record_type,
            diagnosis: r.diagnosis.clone(),
            doctor: r.doctor.clone(),
        })
        .collect();

    DashboardSummary {
        greeting: interpolate(template, &[("name", first_name(&user.name))]),
        next_appointment: book.next_upcoming(today),
        upcoming_count: book.counts(today).upcoming,
        recent_records,
        allergy_count: user.allergies.len(),
        queue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::catalog::{Catalog, DEMO_PATIENT_ID};
    use crate::models::QueueState;

    fn fixture() -> (User, AppointmentBook, MedicalHistory) {
        let catalog = Arc::new(Catalog::mock());
        let user = catalog
            .find_account("maria.gonzalez@email.com")
            .unwrap()
            .user
            .clone();
        let history = MedicalHistory::from_catalog(&catalog);
        let book = AppointmentBook::for_patient(catalog, DEMO_PATIENT_ID);
        (user, book, history)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn summary_for_demo_patient() {
        let (user, book, history) = fixture();
        let summary = build_dashboard(&user, &book, &history, None, Language::Es, today());

        assert_eq!(summary.greeting, "Hola, María");
        assert_eq!(summary.upcoming_count, 3);
        let next = summary.next_appointment.unwrap();
        assert_eq!(next.appointment.id, "a-001");
        assert_eq!(next.hospital_name, "Hospital Vivian Pellas");
        assert_eq!(summary.recent_records.len(), RECENT_RECORDS_LIMIT);
        assert_eq!(summary.recent_records[0].id, "r-001");
        assert_eq!(summary.allergy_count, 2);
        assert!(summary.queue.is_none());
    }

    #[test]
    fn greeting_follows_language_and_queue_passes_through() {
        let (user, book, history) = fixture();
        let queue = QueueStatus {
            appointment_id: "a-001".into(),
            position: 4,
            estimated_wait_minutes: 20,
            status: QueueState::Waiting,
        };
        let summary = build_dashboard(&user, &book, &history, Some(queue.clone()), Language::En, today());
        assert_eq!(summary.greeting, "Hello, María");
        assert_eq!(summary.queue, Some(queue));
    }

    #[test]
    fn nothing_upcoming_after_last_appointment() {
        let (user, book, history) = fixture();
        let later = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let summary = build_dashboard(&user, &book, &history, None, Language::Es, later);
        assert!(summary.next_appointment.is_none());
        assert_eq!(summary.upcoming_count, 0);
    }

    #[test]
    fn first_name_handles_single_word() {
        assert_eq!(first_name("María José González"), "María");
        assert_eq!(first_name("Cher"), "Cher");
        assert_eq!(first_name(""), "");
    }
}
