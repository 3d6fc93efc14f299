use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{HospitalTier, RecordType};
use super::hospital::Coordinates;

/// Tabs of the "my appointments" screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentTab {
    /// "Próximas": active and dated today or later.
    #[default]
    Upcoming,
    Past,
    Cancelled,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentFilter {
    pub tab: AppointmentTab,
    pub search: Option<String>,
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordFilter {
    pub search: Option<String>,
    pub record_type: Option<RecordType>,
    pub specialty: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HospitalFilter {
    pub search: Option<String>,
    pub municipality: Option<String>,
    pub specialty: Option<String>,
    pub tier: Option<HospitalTier>,
    /// When set, results are ranked nearest first.
    pub near: Option<Coordinates>,
}

/// Case-insensitive substring match of `needle` in any of `fields`.
/// An empty or whitespace-only needle matches everything.
pub fn matches_search(needle: Option<&str>, fields: &[&str]) -> bool {
    let needle = match needle.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_lowercase(),
        _ => return true,
    };
    fields.iter().any(|f| f.to_lowercase().contains(&needle))
}
