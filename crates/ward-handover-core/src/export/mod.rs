//! Ward overview and discharge summary exports.

mod discharge;
mod overview;

pub use discharge::*;
pub use overview::*;

use thiserror::Error;

use crate::db::{Database, DbError};

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Builds exports from the live database.
pub struct WardExporter<'a> {
    db: &'a Database,
}

impl<'a> WardExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Sorted overview of every active patient.
    pub fn overview(&self) -> ExportResult<WardOverview> {
        let patients = self.db.list_active_patients()?;
        Ok(WardOverview::from_patients(&patients))
    }

    /// Active patients grouped by department.
    pub fn dashboard(&self) -> ExportResult<Vec<DepartmentGroup>> {
        let patients = self.db.list_active_patients()?;
        Ok(group_by_department(patients))
    }

    /// Discharge summary for a patient in any lifecycle state.
    pub fn discharge_summary(&self, patient_id: &str) -> ExportResult<DischargeSummary> {
        let patient = self
            .db
            .get_patient(patient_id)?
            .ok_or_else(|| ExportError::NotFound(patient_id.to_string()))?;
        let entries = self.db.list_progress_for_patient(patient_id)?;
        Ok(DischargeSummary::new(patient, entries))
    }
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
pub(crate) fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
