use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Signed-in patient. Persisted as JSON under `USER_KEY`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub cedula: String,
    pub phone: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub municipality: String,
    pub allergies: Vec<String>,
    pub medical_history: Vec<String>,
}
