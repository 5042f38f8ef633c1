//! Patient lifecycle: active → archived → restored or purged.
//!
//! ```text
//!   create ──► ACTIVE ──soft_delete──► ARCHIVED ──purge / sweep──► (gone)
//!                 ▲                        │
//!                 └────────restore─────────┘
//! ```
//!
//! Archived patients keep their medical record number reserved until purged.
//! Only active patients can be edited.

mod sweep;

pub use sweep::*;

use chrono::Utc;
use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{NewPatient, Patient, PatientUpdate};

/// Lifecycle errors.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Missing, or in the wrong state for the requested transition.
    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("Duplicate medical record number: {0}")]
    Conflict(String),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Patient lifecycle manager.
pub struct PatientLifecycle<'a> {
    db: &'a Database,
}

impl<'a> PatientLifecycle<'a> {
    /// Create a new lifecycle manager.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All patients that are not archived.
    pub fn list_active(&self) -> LifecycleResult<Vec<Patient>> {
        Ok(self.db.list_active_patients()?)
    }

    /// All archived patients awaiting purge.
    pub fn list_archived(&self) -> LifecycleResult<Vec<Patient>> {
        Ok(self.db.list_archived_patients()?)
    }

    /// Fetch a patient in any lifecycle state.
    pub fn get(&self, id: &str) -> LifecycleResult<Patient> {
        self.db
            .get_patient(id)?
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))
    }

    /// Create an active patient.
    pub fn create(&self, new: NewPatient) -> LifecycleResult<Patient> {
        if self.db.get_patient_by_mrn(&new.mrn)?.is_some() {
            return Err(LifecycleError::Conflict(new.mrn));
        }

        let patient = Patient::from_new(new, Utc::now());
        match self.db.insert_patient(&patient) {
            Ok(()) => {}
            // Lost a race against another create with the same MRN
            Err(DbError::Conflict(_)) => return Err(LifecycleError::Conflict(patient.mrn)),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(patient_id = %patient.id, mrn = %patient.mrn, "Patient created");
        Ok(patient)
    }

    /// Merge `update` over an active patient.
    pub fn update(&self, id: &str, update: PatientUpdate) -> LifecycleResult<Patient> {
        let mut patient = self.active(id)?;
        update.apply_to(&mut patient);
        patient.updated_at = Utc::now();

        if !self.db.update_active_patient(&patient)? {
            return Err(LifecycleError::NotFound(id.to_string()));
        }
        Ok(patient)
    }

    /// Move an active patient into the archive.
    pub fn soft_delete(&self, id: &str) -> LifecycleResult<Patient> {
        if !self.db.archive_patient(id, Utc::now())? {
            return Err(LifecycleError::NotFound(id.to_string()));
        }

        tracing::info!(patient_id = %id, "Patient archived");
        self.get(id)
    }

    /// Return an archived patient to the active list.
    pub fn restore(&self, id: &str) -> LifecycleResult<Patient> {
        if !self.db.restore_patient(id, Utc::now())? {
            return Err(LifecycleError::NotFound(id.to_string()));
        }

        tracing::info!(patient_id = %id, "Patient restored");
        self.get(id)
    }

    /// Permanently remove a patient with its progress and handovers.
    ///
    /// Works in any lifecycle state. Returns `false` when there was nothing to purge.
    pub fn purge(&self, id: &str) -> LifecycleResult<bool> {
        let removed = self.db.delete_patient(id)?;
        if removed {
            tracing::info!(patient_id = %id, "Patient purged");
        } else {
            tracing::debug!(patient_id = %id, "Purge requested for unknown patient");
        }
        Ok(removed)
    }

    fn active(&self, id: &str) -> LifecycleResult<Patient> {
        match self.db.get_patient(id)? {
            Some(patient) if !patient.is_deleted() => Ok(patient),
            _ => Err(LifecycleError::NotFound(id.to_string())),
        }
    }
}
