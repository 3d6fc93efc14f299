//! Medical history: filtered, newest-first view over the patient's records.

use serde::Serialize;
use serde_json::json;

use crate::activity::ActivityRecorder;
use crate::catalog::Catalog;
use crate::models::{
    matches_search, ActivityKind, ExamStatus, MedicalRecord, RecordFilter, RecordStatus,
    RecordType,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub record_type: RecordType,
    pub count: usize,
}

/// Counters shown above the history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub total: usize,
    /// One entry per record type, zero counts included.
    pub by_type: Vec<TypeCount>,
    pub active: usize,
    pub pending_exams: usize,
}

impl HistorySummary {
    pub fn count(&self, record_type: RecordType) -> usize {
        self.by_type
            .iter()
            .find(|c| c.record_type == record_type)
            .map_or(0, |c| c.count)
    }
}

pub fn matches_filter(record: &MedicalRecord, filter: &RecordFilter) -> bool {
    if filter.record_type.is_some_and(|t| record.record_type != t) {
        return false;
    }
    if filter
        .specialty
        .as_deref()
        .is_some_and(|s| record.specialty != s)
    {
        return false;
    }
    if filter.date_from.is_some_and(|from| record.date < from) {
        return false;
    }
    if filter.date_to.is_some_and(|to| record.date > to) {
        return false;
    }
    matches_search(
        filter.search.as_deref(),
        &[
            &record.diagnosis,
            &record.doctor,
            &record.hospital,
            &record.specialty,
            &record.treatment,
            &record.notes,
        ],
    )
}

pub struct MedicalHistory {
    records: Vec<MedicalRecord>,
}

impl MedicalHistory {
    pub fn new(records: Vec<MedicalRecord>) -> Self {
        Self { records }
    }

    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self::new(catalog.records().to_vec())
    }

    /// Record that the history screen was opened and return its summary.
    pub fn open(&self, activity: &dyn ActivityRecorder) -> HistorySummary {
        let summary = self.summary();
        activity.record(
            ActivityKind::HistoryViewed,
            Some(json!({ "records": summary.total })),
        );
        summary
    }

    pub fn get(&self, id: &str) -> Option<&MedicalRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Matching records, newest first. Same-day records order by id,
    /// descending, so the order is total.
    pub fn search(&self, filter: &RecordFilter) -> Vec<&MedicalRecord> {
        let mut matched: Vec<&MedicalRecord> = self
            .records
            .iter()
            .filter(|r| matches_filter(r, filter))
            .collect();
        matched.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        matched
    }

    pub fn recent(&self, limit: usize) -> Vec<&MedicalRecord> {
        let mut all = self.search(&RecordFilter::default());
        all.truncate(limit);
        all
    }

    /// Distinct specialties, alphabetical, for the filter dropdown.
    pub fn specialties(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.records.iter().map(|r| r.specialty.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn summary(&self) -> HistorySummary {
        let by_type = RecordType::all()
            .iter()
            .map(|t| TypeCount {
                record_type: *t,
                count: self.records.iter().filter(|r| r.record_type == *t).count(),
            })
            .collect();
        HistorySummary {
            total: self.records.len(),
            by_type,
            active: self
                .records
                .iter()
                .filter(|r| r.status == RecordStatus::Active)
                .count(),
            pending_exams: self
                .records
                .iter()
                .flat_map(|r| &r.exams)
                .filter(|e| e.status == ExamStatus::Pending)
                .count(),
        }
    }
}
