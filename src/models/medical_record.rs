use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{ExamStatus, RecordStatus, RecordType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub name: String,
    pub dose: String,
    pub frequency: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamEntry {
    pub exam_type: String,
    pub result: String,
    pub values: Option<String>,
    pub status: ExamStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachedDocument {
    pub name: String,
    pub kind: String,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: String,
    pub date: NaiveDate,
    pub record_type: RecordType,
    pub specialty: String,
    pub doctor: String,
    pub hospital: String,
    pub diagnosis: String,
    pub treatment: String,
    pub medications: Vec<MedicationEntry>,
    pub exams: Vec<ExamEntry>,
    pub notes: String,
    pub next_review: Option<NaiveDate>,
    pub documents: Vec<AttachedDocument>,
    pub status: RecordStatus,
}
