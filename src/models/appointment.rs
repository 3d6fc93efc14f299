use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub hospital_id: String,
    pub date: NaiveDate,
    /// `HH:MM`, one of the booking time slots.
    pub time: String,
    pub specialty: String,
    /// Written as the canonical tag; older four-value tags are read too.
    #[serde(deserialize_with = "status_from_any")]
    pub status: AppointmentStatus,
    pub reason: String,
}

impl Appointment {
    /// ISO date + time; lexicographic order equals chronological order.
    pub fn sort_key(&self) -> String {
        format!("{}T{}", self.date.format("%Y-%m-%d"), self.time)
    }
}

fn status_from_any<'de, D: Deserializer<'de>>(d: D) -> Result<AppointmentStatus, D::Error> {
    let tag = String::deserialize(d)?;
    AppointmentStatus::from_any(&tag).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(status: &str) -> String {
        format!(
            r#"{{"id":"a-100","patient_id":"pac-001","doctor_id":"d-001","hospital_id":"h-001",
               "date":"2026-11-05","time":"09:00","specialty":"Cardiología",
               "status":"{status}","reason":"Control"}}"#
        )
    }

    #[test]
    fn reads_legacy_and_canonical_status_tags() {
        let legacy: Appointment = serde_json::from_str(&json("PENDING")).unwrap();
        assert_eq!(legacy.status, AppointmentStatus::Programada);
        let current: Appointment = serde_json::from_str(&json("REAGENDADA")).unwrap();
        assert_eq!(current.status, AppointmentStatus::Reagendada);
        assert!(serde_json::from_str::<Appointment>(&json("DONE")).is_err());
    }

    #[test]
    fn writes_canonical_tag() {
        let legacy: Appointment = serde_json::from_str(&json("CANCELLED")).unwrap();
        let out = serde_json::to_value(&legacy).unwrap();
        assert_eq!(out["status"], "CANCELADA");
    }
}
