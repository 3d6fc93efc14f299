//! Appointment request wizard.
//!
//! Three linear steps, each gated by a completion predicate:
//! 1. department + specialty + hospital
//! 2. doctor
//! 3. date + time slot (+ optional reason)
//!
//! then `Confirmed`. Option lists cascade department → specialty →
//! hospital → doctor and are derived from the catalog on every call by
//! [`derive_options`]; nothing is cached between selections.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::activity::ActivityRecorder;
use crate::catalog::Catalog;
use crate::config::PortalConfig;
use crate::models::{ActivityKind, Appointment, AppointmentStatus, Doctor, Hospital};

/// Bookable hours. 12:00 and 13:00 are the midday break.
pub const TIME_SLOTS: &[&str] = &[
    "08:00", "09:00", "10:00", "11:00", "14:00", "15:00", "16:00",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Select a department")]
    MissingDepartment,

    #[error("Department {0} is not available yet")]
    DepartmentUnavailable(String),

    #[error("Select a specialty")]
    MissingSpecialty,

    #[error("Select a hospital")]
    MissingHospital,

    #[error("Hospital {0} does not offer the selected specialty in this department")]
    HospitalNotEligible(String),

    #[error("Select a doctor")]
    MissingDoctor,

    #[error("Doctor {0} is not available for this hospital and specialty")]
    DoctorNotEligible(String),

    #[error("Select a date")]
    MissingDate,

    #[error("Date {date} is outside the booking window {earliest} to {latest}")]
    DateOutsideWindow {
        date: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },

    #[error("Select a time")]
    MissingTime,

    #[error("Time {0} is not a bookable slot")]
    InvalidTimeSlot(String),

    #[error("Action not allowed on step {0:?}")]
    WrongStep(WizardStep),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    SelectLocation,
    SelectDoctor,
    SelectSchedule,
    Confirmed,
}

/// Inclusive range of bookable dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingWindow {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl BookingWindow {
    /// From today, clamped to the configured earliest date, through the
    /// configured latest date.
    pub fn from_today(today: NaiveDate, config: &PortalConfig) -> Self {
        Self {
            earliest: today.max(config.booking_earliest),
            latest: config.booking_latest,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.earliest && date <= self.latest
    }

    pub fn check(&self, date: NaiveDate) -> Result<(), BookingError> {
        if self.contains(date) {
            Ok(())
        } else {
            Err(BookingError::DateOutsideWindow {
                date,
                earliest: self.earliest,
                latest: self.latest,
            })
        }
    }
}

pub fn check_time_slot(time: &str) -> Result<(), BookingError> {
    if TIME_SLOTS.contains(&time) {
        Ok(())
    } else {
        Err(BookingError::InvalidTimeSlot(time.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSelection {
    pub department: Option<String>,
    pub specialty: Option<String>,
    pub hospital_id: Option<String>,
    pub doctor_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentOption {
    pub name: String,
    pub available: bool,
}

/// Everything the current step can offer, given the partial selection.
#[derive(Debug, Clone, Serialize)]
pub struct BookingOptions {
    pub departments: Vec<DepartmentOption>,
    pub specialties: Vec<String>,
    pub hospitals: Vec<Hospital>,
    pub doctors: Vec<Doctor>,
    pub time_slots: Vec<String>,
}

/// Pure cascade over the catalog.
pub fn derive_options(catalog: &Catalog, selection: &BookingSelection) -> BookingOptions {
    let departments = catalog
        .departments
        .iter()
        .map(|d| DepartmentOption {
            name: d.name.clone(),
            available: d.available,
        })
        .collect();

    let department = selection.department.as_deref();
    let specialty = selection.specialty.as_deref();

    let specialties: Vec<String> = department
        .map(|d| catalog.specialties_in(d).into_iter().map(String::from).collect())
        .unwrap_or_default();

    let hospitals: Vec<Hospital> = department
        .map(|d| {
            catalog
                .hospitals_for(d, specialty)
                .into_iter()
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    let doctors: Vec<Doctor> = match (selection.hospital_id.as_deref(), specialty) {
        (Some(h), Some(s)) => catalog.doctors_for(h, s).into_iter().cloned().collect(),
        _ => Vec::new(),
    };

    BookingOptions {
        departments,
        specialties,
        hospitals,
        doctors,
        time_slots: TIME_SLOTS.iter().map(|s| s.to_string()).collect(),
    }
}

/// Shown on the confirmation screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub appointment: Appointment,
    pub department: String,
    pub specialty: String,
    pub hospital_name: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time: String,
}

// ═══════════════════════════════════════════════════════════
// BookingWizard
// ═══════════════════════════════════════════════════════════

pub struct BookingWizard {
    catalog: Arc<Catalog>,
    window: BookingWindow,
    patient_id: String,
    step: WizardStep,
    selection: BookingSelection,
    confirmation: Option<BookingConfirmation>,
}

impl BookingWizard {
    pub fn new(catalog: Arc<Catalog>, window: BookingWindow, patient_id: impl Into<String>) -> Self {
        Self {
            catalog,
            window,
            patient_id: patient_id.into(),
            step: WizardStep::SelectLocation,
            selection: BookingSelection::default(),
            confirmation: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn selection(&self) -> &BookingSelection {
        &self.selection
    }

    pub fn window(&self) -> BookingWindow {
        self.window
    }

    pub fn options(&self) -> BookingOptions {
        derive_options(&self.catalog, &self.selection)
    }

    pub fn confirmation(&self) -> Option<&BookingConfirmation> {
        self.confirmation.as_ref()
    }

    fn require_step(&self, expected: WizardStep) -> Result<(), BookingError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(BookingError::WrongStep(self.step))
        }
    }

    // ── Step 1 selections ───────────────────────────────────

    /// Changing the department drops the hospital and doctor.
    pub fn select_department(&mut self, department: &str) -> Result<(), BookingError> {
        self.require_step(WizardStep::SelectLocation)?;
        if self.selection.department.as_deref() != Some(department) {
            self.selection.department = Some(department.to_string());
            self.selection.hospital_id = None;
            self.selection.doctor_id = None;
        }
        Ok(())
    }

    /// Keeps the hospital only if it still offers the new specialty.
    pub fn select_specialty(&mut self, specialty: &str) -> Result<(), BookingError> {
        self.require_step(WizardStep::SelectLocation)?;
        if self.selection.specialty.as_deref() != Some(specialty) {
            self.selection.specialty = Some(specialty.to_string());
            self.selection.doctor_id = None;
            let still_offered = self
                .selection
                .hospital_id
                .as_deref()
                .and_then(|id| self.catalog.hospital(id))
                .is_some_and(|h| h.offers(specialty));
            if !still_offered {
                self.selection.hospital_id = None;
            }
        }
        Ok(())
    }

    pub fn select_hospital(&mut self, hospital_id: &str) -> Result<(), BookingError> {
        self.require_step(WizardStep::SelectLocation)?;
        if self.selection.hospital_id.as_deref() != Some(hospital_id) {
            self.selection.hospital_id = Some(hospital_id.to_string());
            self.selection.doctor_id = None;
        }
        Ok(())
    }

    // ── Step 2 / 3 selections ───────────────────────────────

    pub fn select_doctor(&mut self, doctor_id: &str) -> Result<(), BookingError> {
        self.require_step(WizardStep::SelectDoctor)?;
        self.selection.doctor_id = Some(doctor_id.to_string());
        Ok(())
    }

    pub fn select_date(&mut self, date: NaiveDate) -> Result<(), BookingError> {
        self.require_step(WizardStep::SelectSchedule)?;
        self.selection.date = Some(date);
        Ok(())
    }

    pub fn select_time(&mut self, time: &str) -> Result<(), BookingError> {
        self.require_step(WizardStep::SelectSchedule)?;
        self.selection.time = Some(time.to_string());
        Ok(())
    }

    pub fn set_reason(&mut self, reason: &str) -> Result<(), BookingError> {
        self.require_step(WizardStep::SelectSchedule)?;
        self.selection.reason = reason.to_string();
        Ok(())
    }

    // ── Completion predicates ───────────────────────────────

    fn location_errors(&self) -> Vec<BookingError> {
        let mut errors = Vec::new();
        match self.selection.department.as_deref() {
            None => errors.push(BookingError::MissingDepartment),
            Some(d) if !self.catalog.is_department_available(d) => {
                errors.push(BookingError::DepartmentUnavailable(d.to_string()))
            }
            Some(_) => {}
        }
        if self.selection.specialty.is_none() {
            errors.push(BookingError::MissingSpecialty);
        }
        match self.selection.hospital_id.as_deref() {
            None => errors.push(BookingError::MissingHospital),
            Some(id) => {
                let eligible = match (self.selection.department.as_deref(), self.selection.specialty.as_deref()) {
                    (Some(d), Some(s)) => self.catalog.hospitals_for(d, Some(s)).iter().any(|h| h.id == id),
                    _ => false,
                };
                if !eligible {
                    errors.push(BookingError::HospitalNotEligible(id.to_string()));
                }
            }
        }
        errors
    }

    fn doctor_errors(&self) -> Vec<BookingError> {
        let Some(id) = self.selection.doctor_id.as_deref() else {
            return vec![BookingError::MissingDoctor];
        };
        let eligible = match (self.selection.hospital_id.as_deref(), self.selection.specialty.as_deref()) {
            (Some(h), Some(s)) => self
                .catalog
                .doctors_for(h, s)
                .iter()
                .any(|d| d.id == id && d.available),
            _ => false,
        };
        if eligible {
            Vec::new()
        } else {
            vec![BookingError::DoctorNotEligible(id.to_string())]
        }
    }

    fn schedule_errors(&self) -> Vec<BookingError> {
        let mut errors = Vec::new();
        match self.selection.date {
            None => errors.push(BookingError::MissingDate),
            Some(date) => {
                if let Err(e) = self.window.check(date) {
                    errors.push(e);
                }
            }
        }
        match self.selection.time.as_deref() {
            None => errors.push(BookingError::MissingTime),
            Some(time) => {
                if let Err(e) = check_time_slot(time) {
                    errors.push(e);
                }
            }
        }
        errors
    }

    /// Every failing check of the current step; empty when it is complete.
    pub fn step_errors(&self) -> Vec<BookingError> {
        match self.step {
            WizardStep::SelectLocation => self.location_errors(),
            WizardStep::SelectDoctor => self.doctor_errors(),
            WizardStep::SelectSchedule => self.schedule_errors(),
            WizardStep::Confirmed => Vec::new(),
        }
    }

    pub fn can_advance(&self) -> bool {
        self.step != WizardStep::Confirmed && self.step_errors().is_empty()
    }

    // ── Transitions ─────────────────────────────────────────

    /// Advance one step. Returns the first failing check if the current
    /// step is incomplete. Step 3 advances only through [`Self::submit`].
    pub fn next(&mut self) -> Result<WizardStep, BookingError> {
        let target = match self.step {
            WizardStep::SelectLocation => WizardStep::SelectDoctor,
            WizardStep::SelectDoctor => WizardStep::SelectSchedule,
            WizardStep::SelectSchedule | WizardStep::Confirmed => {
                return Err(BookingError::WrongStep(self.step))
            }
        };
        if let Some(first) = self.step_errors().into_iter().next() {
            return Err(first);
        }
        tracing::debug!(from = ?self.step, to = ?target, "Booking wizard advanced");
        self.step = target;
        Ok(target)
    }

    /// Go back one step. Selections are kept.
    pub fn back(&mut self) -> Result<WizardStep, BookingError> {
        let target = match self.step {
            WizardStep::SelectDoctor => WizardStep::SelectLocation,
            WizardStep::SelectSchedule => WizardStep::SelectDoctor,
            WizardStep::SelectLocation | WizardStep::Confirmed => {
                return Err(BookingError::WrongStep(self.step))
            }
        };
        self.step = target;
        Ok(target)
    }

    /// Validate all three steps, wait the simulated latency, then create
    /// the appointment and move to `Confirmed`.
    pub async fn submit(
        &mut self,
        latency: Duration,
        activity: &dyn ActivityRecorder,
    ) -> Result<BookingConfirmation, BookingError> {
        self.require_step(WizardStep::SelectSchedule)?;
        let first_error = self
            .location_errors()
            .into_iter()
            .chain(self.doctor_errors())
            .chain(self.schedule_errors())
            .next();
        if let Some(e) = first_error {
            return Err(e);
        }

        let (Some(department), Some(specialty), Some(hospital), Some(doctor), Some(date), Some(time)) = (
            self.selection.department.clone(),
            self.selection.specialty.clone(),
            self.selection.hospital_id.as_deref().and_then(|id| self.catalog.hospital(id)).cloned(),
            self.selection.doctor_id.as_deref().and_then(|id| self.catalog.doctor(id)).cloned(),
            self.selection.date,
            self.selection.time.clone(),
        ) else {
            return Err(BookingError::WrongStep(self.step));
        };

        tokio::time::sleep(latency).await;

        let reason = self.selection.reason.trim().to_string();
        let appointment = Appointment {
            id: Uuid::new_v4().to_string(),
            patient_id: self.patient_id.clone(),
            doctor_id: doctor.id.clone(),
            hospital_id: hospital.id.clone(),
            date,
            time: time.clone(),
            specialty: specialty.clone(),
            status: AppointmentStatus::Programada,
            reason: reason.clone(),
        };

        activity.record(
            ActivityKind::AppointmentBooked,
            Some(json!({
                "specialty": specialty,
                "hospital": hospital.name,
                "reason": reason,
            })),
        );
        tracing::info!(
            appointment_id = %appointment.id,
            hospital = %hospital.id,
            doctor = %doctor.id,
            %date,
            "Appointment booked"
        );

        let confirmation = BookingConfirmation {
            appointment,
            department,
            specialty,
            hospital_name: hospital.name,
            doctor_name: doctor.name,
            date,
            time,
        };
        self.step = WizardStep::Confirmed;
        self.confirmation = Some(confirmation.clone());
        Ok(confirmation)
    }

    /// Start over from step 1, keeping catalog and window.
    pub fn reset(&mut self) {
        self.step = WizardStep::SelectLocation;
        self.selection = BookingSelection::default();
        self.confirmation = None;
    }
}
