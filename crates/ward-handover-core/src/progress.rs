//! Daily progress log.

use chrono::Utc;
use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::ProgressEntry;

/// Progress log errors.
#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("Database error: {0}")]
    Database(DbError),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<DbError> for ProgressError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => ProgressError::NotFound(what),
            other => ProgressError::Database(other),
        }
    }
}

pub type ProgressResult<T> = Result<T, ProgressError>;

/// Progress log for patients.
pub struct ProgressLog<'a> {
    db: &'a Database,
}

impl<'a> ProgressLog<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Entries for a patient, oldest first.
    pub fn list(&self, patient_id: &str) -> ProgressResult<Vec<ProgressEntry>> {
        Ok(self.db.list_progress_for_patient(patient_id)?)
    }

    /// Record a progress note.
    pub fn add(&self, patient_id: &str, date: &str, notes: &str) -> ProgressResult<ProgressEntry> {
        let entry = ProgressEntry::new(
            patient_id.to_string(),
            date.to_string(),
            notes.to_string(),
            Utc::now(),
        );
        self.db.insert_progress(&entry)?;
        Ok(entry)
    }

    /// Replace the notes of an entry.
    pub fn update(&self, id: &str, notes: &str) -> ProgressResult<ProgressEntry> {
        if !self.db.update_progress_notes(id, notes, Utc::now())? {
            return Err(ProgressError::NotFound(id.to_string()));
        }
        self.db
            .get_progress(id)?
            .ok_or_else(|| ProgressError::NotFound(id.to_string()))
    }

    /// Delete an entry permanently.
    pub fn delete(&self, id: &str) -> ProgressResult<()> {
        if !self.db.delete_progress(id)? {
            return Err(ProgressError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
