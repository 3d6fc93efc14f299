//! Static reference catalog: departments, specialties, hospitals, doctors,
//! plus the seed appointments, medical records and demo accounts.
//!
//! Everything here is immutable at runtime. Screens derive their option
//! lists from it on every change rather than caching intermediate results.

mod mock;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{
    matches_search, Appointment, Doctor, Hospital, HospitalFilter, MedicalRecord, User,
};

pub use mock::{AVAILABLE_DEPARTMENTS, DEMO_PATIENT_ID, DEPARTMENTS, SPECIALTIES};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub name: String,
    /// Only available departments have bookable hospitals.
    pub available: bool,
}

/// Mock login credentials with the profile they unlock.
#[derive(Debug, Clone)]
pub struct DemoAccount {
    pub email: String,
    pub password: String,
    pub user: User,
}

/// Hospital paired with its distance from a query point.
#[derive(Debug, Clone, Serialize)]
pub struct HospitalMatch {
    pub hospital: Hospital,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub departments: Vec<Department>,
    pub specialties: Vec<String>,
    pub hospitals: Vec<Hospital>,
    pub doctors: Vec<Doctor>,
    pub appointments: Vec<Appointment>,
    pub records: Vec<MedicalRecord>,
    pub accounts: Vec<DemoAccount>,
}

impl Catalog {
    pub fn mock() -> Self {
        mock::build()
    }

    pub fn hospital(&self, id: &str) -> Option<&Hospital> {
        self.hospitals.iter().find(|h| h.id == id)
    }

    pub fn doctor(&self, id: &str) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id == id)
    }

    pub fn is_department_available(&self, name: &str) -> bool {
        self.departments.iter().any(|d| d.name == name && d.available)
    }

    /// Hospitals in `department`, narrowed to those offering `specialty`
    /// when one is given. Unavailable departments yield nothing.
    pub fn hospitals_for(&self, department: &str, specialty: Option<&str>) -> Vec<&Hospital> {
        if !self.is_department_available(department) {
            return Vec::new();
        }
        self.hospitals
            .iter()
            .filter(|h| h.municipality == department)
            .filter(|h| specialty.map_or(true, |s| h.offers(s)))
            .collect()
    }

    /// Doctors working at `hospital_id` in `specialty`.
    pub fn doctors_for(&self, hospital_id: &str, specialty: &str) -> Vec<&Doctor> {
        self.doctors
            .iter()
            .filter(|d| d.hospital_id == hospital_id && d.specialty == specialty)
            .collect()
    }

    /// Specialties offered by at least one hospital of an available
    /// department, in catalog order.
    pub fn specialties_in(&self, department: &str) -> Vec<&str> {
        let hospitals = self.hospitals_for(department, None);
        self.specialties
            .iter()
            .filter(|s| hospitals.iter().any(|h| h.offers(s)))
            .map(String::as_str)
            .collect()
    }

    pub fn records(&self) -> &[MedicalRecord] {
        &self.records
    }

    pub fn appointments_for(&self, patient_id: &str) -> Vec<Appointment> {
        self.appointments
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect()
    }

    pub fn find_account(&self, email: &str) -> Option<&DemoAccount> {
        let email = email.trim();
        self.accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
    }

    pub fn account_for_user(&self, user_id: &str) -> Option<&DemoAccount> {
        self.accounts.iter().find(|a| a.user.id == user_id)
    }

    /// Hospital directory search. With `near` set, results are ordered by
    /// distance; otherwise by name.
    pub fn search_hospitals(&self, filter: &HospitalFilter) -> Vec<HospitalMatch> {
        let mut matches: Vec<HospitalMatch> = self
            .hospitals
            .iter()
            .filter(|h| {
                filter
                    .municipality
                    .as_deref()
                    .map_or(true, |m| h.municipality == m)
            })
            .filter(|h| filter.specialty.as_deref().map_or(true, |s| h.offers(s)))
            .filter(|h| filter.tier.map_or(true, |t| h.tier == t))
            .filter(|h| {
                matches_search(
                    filter.search.as_deref(),
                    &[&h.name, &h.address, &h.municipality],
                )
            })
            .map(|h| HospitalMatch {
                hospital: h.clone(),
                distance_km: filter.near.map(|p| p.distance_km(&h.coordinates)),
            })
            .collect();

        matches.sort_by(|a, b| match (a.distance_km, b.distance_km) {
            (Some(da), Some(db)) => da.partial_cmp(&db).unwrap_or(Ordering::Equal),
            _ => a.hospital.name.cmp(&b.hospital.name),
        });
        matches
    }

    /// Referential problems in the catalog; empty when consistent.
    pub fn integrity_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for doctor in &self.doctors {
            match self.hospital(&doctor.hospital_id) {
                None => problems.push(format!(
                    "doctor {} references unknown hospital {}",
                    doctor.id, doctor.hospital_id
                )),
                Some(h) if !h.offers(&doctor.specialty) => problems.push(format!(
                    "doctor {} practices {} which {} does not offer",
                    doctor.id, doctor.specialty, h.id
                )),
                Some(_) => {}
            }
        }
        for appt in &self.appointments {
            match self.doctor(&appt.doctor_id) {
                Some(d) if d.hospital_id != appt.hospital_id => problems.push(format!(
                    "appointment {} doctor {} is not at hospital {}",
                    appt.id, d.id, appt.hospital_id
                )),
                None => problems.push(format!(
                    "appointment {} references unknown doctor {}",
                    appt.id, appt.doctor_id
                )),
                Some(_) => {}
            }
        }
        problems
    }
}
