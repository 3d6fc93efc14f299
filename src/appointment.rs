//! "My appointments": tabbed listing, search, cancel and reschedule.
//!
//! The book owns the signed-in patient's appointments. Entries are never
//! removed; cancel and reschedule only transition the status.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::activity::ActivityRecorder;
use crate::booking::{check_time_slot, BookingError, BookingWindow};
use crate::catalog::Catalog;
use crate::models::{
    matches_search, ActivityKind, Appointment, AppointmentFilter, AppointmentStatus,
    AppointmentTab,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppointmentError {
    #[error("Appointment not found: {0}")]
    NotFound(String),

    #[error("Appointment {id} cannot change from status {status}")]
    InvalidTransition {
        id: String,
        status: AppointmentStatus,
    },

    #[error(transparent)]
    Schedule(#[from] BookingError),
}

/// Appointment joined with the display names the list shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentView {
    pub appointment: Appointment,
    pub doctor_name: String,
    pub hospital_name: String,
    pub tab: AppointmentTab,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabCounts {
    pub upcoming: usize,
    pub past: usize,
    pub cancelled: usize,
}

/// Which tab an appointment appears under on `today`.
///
/// EN_CURSO counts as upcoming on its own day and as past afterwards.
pub fn tab_for(appointment: &Appointment, today: NaiveDate) -> AppointmentTab {
    match appointment.status {
        AppointmentStatus::Cancelada => AppointmentTab::Cancelled,
        AppointmentStatus::Completada => AppointmentTab::Past,
        _ if appointment.date < today => AppointmentTab::Past,
        _ => AppointmentTab::Upcoming,
    }
}

pub struct AppointmentBook {
    catalog: Arc<Catalog>,
    appointments: Vec<Appointment>,
}

impl AppointmentBook {
    pub fn new(catalog: Arc<Catalog>, appointments: Vec<Appointment>) -> Self {
        Self {
            catalog,
            appointments,
        }
    }

    /// Seeded with the catalog's appointments for `patient_id`.
    pub fn for_patient(catalog: Arc<Catalog>, patient_id: &str) -> Self {
        let appointments = catalog.appointments_for(patient_id);
        Self::new(catalog, appointments)
    }

    pub fn all(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn get(&self, id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    /// Append a newly booked appointment.
    pub fn add(&mut self, appointment: Appointment) {
        tracing::debug!(appointment_id = %appointment.id, "Appointment added to book");
        self.appointments.push(appointment);
    }

    fn view(&self, appointment: &Appointment, today: NaiveDate) -> AppointmentView {
        let doctor_name = self
            .catalog
            .doctor(&appointment.doctor_id)
            .map(|d| d.name.clone())
            .unwrap_or_default();
        let hospital_name = self
            .catalog
            .hospital(&appointment.hospital_id)
            .map(|h| h.name.clone())
            .unwrap_or_default();
        AppointmentView {
            appointment: appointment.clone(),
            doctor_name,
            hospital_name,
            tab: tab_for(appointment, today),
        }
    }

    /// Appointments in the filter's tab, matching the specialty and free
    /// text, newest first.
    pub fn list(&self, filter: &AppointmentFilter, today: NaiveDate) -> Vec<AppointmentView> {
        let mut views: Vec<AppointmentView> = self
            .appointments
            .iter()
            .filter(|a| tab_for(a, today) == filter.tab)
            .filter(|a| {
                filter
                    .specialty
                    .as_deref()
                    .map_or(true, |s| a.specialty == s)
            })
            .map(|a| self.view(a, today))
            .filter(|v| {
                matches_search(
                    filter.search.as_deref(),
                    &[
                        &v.doctor_name,
                        &v.hospital_name,
                        &v.appointment.specialty,
                        &v.appointment.reason,
                    ],
                )
            })
            .collect();
        views.sort_by(|a, b| b.appointment.sort_key().cmp(&a.appointment.sort_key()));
        views
    }

    pub fn counts(&self, today: NaiveDate) -> TabCounts {
        self.appointments
            .iter()
            .fold(TabCounts::default(), |mut counts, a| {
                match tab_for(a, today) {
                    AppointmentTab::Upcoming => counts.upcoming += 1,
                    AppointmentTab::Past => counts.past += 1,
                    AppointmentTab::Cancelled => counts.cancelled += 1,
                }
                counts
            })
    }

    /// Soonest upcoming appointment.
    pub fn next_upcoming(&self, today: NaiveDate) -> Option<AppointmentView> {
        self.appointments
            .iter()
            .filter(|a| tab_for(a, today) == AppointmentTab::Upcoming)
            .min_by_key(|a| a.sort_key())
            .map(|a| self.view(a, today))
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Appointment, AppointmentError> {
        self.appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppointmentError::NotFound(id.to_string()))
    }

    /// PROGRAMADA / CONFIRMADA / REAGENDADA → CANCELADA.
    pub fn cancel(
        &mut self,
        id: &str,
        activity: &dyn ActivityRecorder,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.find_mut(id)?;
        if !appointment.status.is_active() {
            return Err(AppointmentError::InvalidTransition {
                id: id.to_string(),
                status: appointment.status,
            });
        }
        let previous = appointment.status;
        appointment.status = AppointmentStatus::Cancelada;
        let cancelled = appointment.clone();

        activity.record(
            ActivityKind::AppointmentCancelled,
            Some(json!({
                "appointment_id": cancelled.id,
                "specialty": cancelled.specialty,
            })),
        );
        tracing::info!(appointment_id = id, from = %previous, "Appointment cancelled");
        Ok(cancelled)
    }

    /// Move an active appointment to a new bookable date and slot.
    pub fn reschedule(
        &mut self,
        id: &str,
        date: NaiveDate,
        time: &str,
        window: &BookingWindow,
        activity: &dyn ActivityRecorder,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.find_mut(id)?;
        if !appointment.status.is_active() {
            return Err(AppointmentError::InvalidTransition {
                id: id.to_string(),
                status: appointment.status,
            });
        }
        window.check(date)?;
        check_time_slot(time)?;

        let previous_date = appointment.date;
        appointment.date = date;
        appointment.time = time.to_string();
        appointment.status = AppointmentStatus::Reagendada;
        let rescheduled = appointment.clone();

        activity.record(
            ActivityKind::AppointmentRescheduled,
            Some(json!({
                "appointment_id": rescheduled.id,
                "from": previous_date.to_string(),
                "to": date.to_string(),
                "time": time,
            })),
        );
        tracing::info!(appointment_id = id, %previous_date, %date, time, "Appointment rescheduled");
        Ok(rescheduled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::MemoryActivityRecorder;
    use crate::catalog::DEMO_PATIENT_ID;
    use crate::config::PortalConfig;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn book() -> AppointmentBook {
        AppointmentBook::for_patient(Arc::new(Catalog::mock()), DEMO_PATIENT_ID)
    }

    fn tab(tab: AppointmentTab) -> AppointmentFilter {
        AppointmentFilter {
            tab,
            ..Default::default()
        }
    }

    fn ids(views: &[AppointmentView]) -> Vec<&str> {
        views.iter().map(|v| v.appointment.id.as_str()).collect()
    }

    #[test]
    fn tabs_partition_seed_data() {
        let book = book();
        assert_eq!(ids(&book.list(&tab(AppointmentTab::Upcoming), today())), vec!["a-003", "a-002", "a-001"]);
        assert_eq!(ids(&book.list(&tab(AppointmentTab::Past), today())), vec!["a-004", "a-005"]);
        assert_eq!(ids(&book.list(&tab(AppointmentTab::Cancelled), today())), vec!["a-006"]);
        assert_eq!(
            book.counts(today()),
            TabCounts { upcoming: 3, past: 2, cancelled: 1 }
        );
    }

    #[test]
    fn active_appointment_in_the_past_lands_in_past_tab() {
        let book = book();
        let later = NaiveDate::from_ymd_opt(2026, 11, 10).unwrap();
        let past = ids(&book.list(&tab(AppointmentTab::Past), later)).join(",");
        assert_eq!(past, "a-001,a-004,a-005");
    }

    #[test]
    fn en_curso_is_upcoming_on_its_day() {
        let mut appt = book().get("a-001").unwrap().clone();
        appt.status = AppointmentStatus::EnCurso;
        assert_eq!(tab_for(&appt, appt.date), AppointmentTab::Upcoming);
        assert_eq!(tab_for(&appt, appt.date.succ_opt().unwrap()), AppointmentTab::Past);
    }

    #[test]
    fn search_matches_names_case_insensitively() {
        let book = book();
        let filter = AppointmentFilter {
            tab: AppointmentTab::Upcoming,
            search: Some("VIVIAN".into()),
            specialty: None,
        };
        let views = book.list(&filter, today());
        assert_eq!(ids(&views), vec!["a-001"]);
        assert_eq!(views[0].doctor_name, "Dra. Ana Lucía Martínez");

        let filter = AppointmentFilter {
            search: Some("lunar".into()),
            ..tab(AppointmentTab::Upcoming)
        };
        assert_eq!(ids(&book.list(&filter, today())), vec!["a-003"]);
    }

    #[test]
    fn specialty_filter_is_exact() {
        let book = book();
        let filter = AppointmentFilter {
            specialty: Some("Neurología".into()),
            ..tab(AppointmentTab::Past)
        };
        assert_eq!(ids(&book.list(&filter, today())), vec!["a-005"]);
        let filter = AppointmentFilter {
            specialty: Some("Neuro".into()),
            ..tab(AppointmentTab::Past)
        };
        assert!(book.list(&filter, today()).is_empty());
    }

    #[test]
    fn cancelling_confirmed_leaves_upcoming() {
        let mut book = book();
        let recorder = MemoryActivityRecorder::new();
        let cancelled = book.cancel("a-001", &recorder).unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelada);

        let upcoming = book.list(&tab(AppointmentTab::Upcoming), today());
        assert!(!ids(&upcoming).contains(&"a-001"));
        assert!(ids(&book.list(&tab(AppointmentTab::Cancelled), today())).contains(&"a-001"));
        assert_eq!(book.all().len(), 6);
        assert_eq!(recorder.count(ActivityKind::AppointmentCancelled), 1);
    }

    #[test]
    fn cannot_cancel_completed_or_cancelled() {
        let mut book = book();
        let recorder = MemoryActivityRecorder::new();
        assert!(matches!(
            book.cancel("a-004", &recorder),
            Err(AppointmentError::InvalidTransition { status: AppointmentStatus::Completada, .. })
        ));
        assert!(book.cancel("a-006", &recorder).is_err());
        assert_eq!(
            book.cancel("a-999", &recorder).unwrap_err(),
            AppointmentError::NotFound("a-999".into())
        );
        assert!(recorder.entries().is_empty());
    }

    #[test]
    fn reschedule_validates_window_and_slot() {
        let mut book = book();
        let recorder = MemoryActivityRecorder::new();
        let window = BookingWindow::from_today(today(), &PortalConfig::default());
        let new_date = NaiveDate::from_ymd_opt(2026, 12, 15).unwrap();

        let err = book
            .reschedule("a-002", today().pred_opt().unwrap(), "09:00", &window, &recorder)
            .unwrap_err();
        assert!(matches!(err, AppointmentError::Schedule(BookingError::DateOutsideWindow { .. })));
        let err = book.reschedule("a-002", new_date, "12:00", &window, &recorder).unwrap_err();
        assert_eq!(err, AppointmentError::Schedule(BookingError::InvalidTimeSlot("12:00".into())));
        assert_eq!(book.get("a-002").unwrap().status, AppointmentStatus::Programada);

        let moved = book.reschedule("a-002", new_date, "15:00", &window, &recorder).unwrap();
        assert_eq!(moved.status, AppointmentStatus::Reagendada);
        assert_eq!(moved.date, new_date);
        assert_eq!(moved.time, "15:00");
        assert_eq!(recorder.count(ActivityKind::AppointmentRescheduled), 1);
    }

    #[test]
    fn next_upcoming_is_soonest() {
        let mut book = book();
        assert_eq!(book.next_upcoming(today()).unwrap().appointment.id, "a-001");
        book.cancel("a-001", &MemoryActivityRecorder::new()).unwrap();
        let next = book.next_upcoming(today()).unwrap();
        assert_eq!(next.appointment.id, "a-002");
        assert_eq!(next.hospital_name, "Hospital Alemán Nicaragüense");
    }
}
