//! Ward Handover Core Library
//!
//! Local-first patient tracking for a hospital ward: patient records with an
//! undoable archive, daily progress notes and shift-to-shift handover tasks.
//!
//! # Architecture
//!
//! ```text
//!            Host app (Swift/Kotlin) / ward-handover daemon
//!                               │
//!                     WardHandoverCore (FFI)
//!                               │  validation, error → status mapping
//!         ┌──────────────┬──────┴───────┬──────────────┬─────────────┐
//!         ▼              ▼              ▼              ▼             ▼
//!  PatientLifecycle  HandoverTasks  ProgressLog   SessionStore  WardExporter
//!         │              │              │              │             │
//!         └──────────────┴──────┬───────┴──────────────┴─────────────┘
//!                               ▼
//!                       Database (SQLite)
//!                               ▲
//!                      archive sweeper thread
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Patient, ProgressEntry, HandoverTask)
//! - [`lifecycle`]: Active/archived patient state and the retention sweep
//! - [`handover`]: Per-date handover tasks with amend-latest semantics
//! - [`progress`]: Daily progress log
//! - [`session`]: Bearer token lookup with expiry
//! - [`export`]: Ward overview and discharge summary
//! - [`config`]: Startup configuration
//! - [`validation`]: Request input checks

pub mod config;
pub mod db;
pub mod export;
pub mod handover;
pub mod lifecycle;
pub mod models;
pub mod progress;
pub mod session;
pub mod validation;

// Re-export commonly used types
pub use config::CoreConfig;
pub use db::Database;
pub use handover::HandoverTasks;
pub use lifecycle::{start_sweeper, PatientLifecycle, SweepReport, SweeperHandle};
pub use models::{
    ClinicalStatus, Department, HandoverStatus, HandoverTask, NewPatient, Patient, PatientUpdate,
    ProgressEntry, Sex,
};
pub use progress::ProgressLog;
pub use session::SessionStore;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum WardHandoverError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate identifier: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl WardHandoverError {
    /// HTTP status a request layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            WardHandoverError::NotFound(_) => 404,
            WardHandoverError::Conflict(_) => 409,
            WardHandoverError::InvalidInput(_) => 400,
            WardHandoverError::Unauthorized => 401,
            WardHandoverError::DatabaseError(_) | WardHandoverError::SerializationError(_) => 500,
        }
    }
}

impl From<db::DbError> for WardHandoverError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => WardHandoverError::NotFound(what),
            db::DbError::Conflict(what) => WardHandoverError::Conflict(what),
            other => WardHandoverError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for WardHandoverError {
    fn from(e: serde_json::Error) -> Self {
        WardHandoverError::SerializationError(e.to_string())
    }
}

impl From<lifecycle::LifecycleError> for WardHandoverError {
    fn from(e: lifecycle::LifecycleError) -> Self {
        match e {
            lifecycle::LifecycleError::Database(e) => e.into(),
            lifecycle::LifecycleError::NotFound(id) => WardHandoverError::NotFound(id),
            lifecycle::LifecycleError::Conflict(mrn) => WardHandoverError::Conflict(mrn),
        }
    }
}

impl From<handover::HandoverError> for WardHandoverError {
    fn from(e: handover::HandoverError) -> Self {
        match e {
            handover::HandoverError::Database(e) => e.into(),
            handover::HandoverError::NotFound(id) => WardHandoverError::NotFound(id),
        }
    }
}

impl From<progress::ProgressError> for WardHandoverError {
    fn from(e: progress::ProgressError) -> Self {
        match e {
            progress::ProgressError::Database(e) => e.into(),
            progress::ProgressError::NotFound(id) => WardHandoverError::NotFound(id),
        }
    }
}

impl From<session::SessionError> for WardHandoverError {
    fn from(e: session::SessionError) -> Self {
        match e {
            session::SessionError::Database(e) => e.into(),
            session::SessionError::InvalidTtl(msg) => WardHandoverError::InvalidInput(msg),
        }
    }
}

impl From<export::ExportError> for WardHandoverError {
    fn from(e: export::ExportError) -> Self {
        match e {
            export::ExportError::Database(e) => e.into(),
            export::ExportError::NotFound(id) => WardHandoverError::NotFound(id),
            export::ExportError::Json(e) => e.into(),
        }
    }
}

impl From<validation::ValidationError> for WardHandoverError {
    fn from(e: validation::ValidationError) -> Self {
        WardHandoverError::InvalidInput(e.to_string())
    }
}

impl From<config::ConfigError> for WardHandoverError {
    fn from(e: config::ConfigError) -> Self {
        WardHandoverError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for WardHandoverError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        WardHandoverError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path with default settings.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<WardHandoverCore>, WardHandoverError> {
    let config = CoreConfig::default().with_database_path(path)?;
    WardHandoverCore::with_config(config)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<WardHandoverCore>, WardHandoverError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(WardHandoverCore {
        db: Arc::new(Mutex::new(db)),
        config: CoreConfig::default(),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct WardHandoverCore {
    db: Arc<Mutex<Database>>,
    config: CoreConfig,
}

#[uniffi::export]
impl WardHandoverCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Patients currently on the ward.
    pub fn list_active_patients(&self) -> Result<Vec<FfiPatient>, WardHandoverError> {
        let db = self.db.lock()?;
        let patients = PatientLifecycle::new(&db).list_active()?;
        Ok(self.to_ffi_patients(patients))
    }

    /// Patients in the archive, with their scheduled purge time.
    pub fn list_archived_patients(&self) -> Result<Vec<FfiPatient>, WardHandoverError> {
        let db = self.db.lock()?;
        let patients = PatientLifecycle::new(&db).list_archived()?;
        Ok(self.to_ffi_patients(patients))
    }

    /// Get a patient in any lifecycle state.
    pub fn get_patient(&self, id: String) -> Result<FfiPatient, WardHandoverError> {
        let db = self.db.lock()?;
        let patient = PatientLifecycle::new(&db).get(&id)?;
        Ok(FfiPatient::from_patient(patient, self.config.retention()))
    }

    /// Admit a new patient.
    pub fn create_patient(&self, input: FfiNewPatient) -> Result<FfiPatient, WardHandoverError> {
        let new = input.validate()?;
        let db = self.db.lock()?;
        let patient = PatientLifecycle::new(&db).create(new)?;
        Ok(FfiPatient::from_patient(patient, self.config.retention()))
    }

    /// Edit the supplied fields of an active patient.
    pub fn update_patient(
        &self,
        id: String,
        input: FfiPatientUpdate,
    ) -> Result<FfiPatient, WardHandoverError> {
        let update = input.validate()?;
        let db = self.db.lock()?;
        let patient = PatientLifecycle::new(&db).update(&id, update)?;
        Ok(FfiPatient::from_patient(patient, self.config.retention()))
    }

    /// Move a patient to the archive.
    pub fn soft_delete_patient(&self, id: String) -> Result<FfiPatient, WardHandoverError> {
        let db = self.db.lock()?;
        let patient = PatientLifecycle::new(&db).soft_delete(&id)?;
        Ok(FfiPatient::from_patient(patient, self.config.retention()))
    }

    /// Bring a patient back from the archive.
    pub fn restore_patient(&self, id: String) -> Result<FfiPatient, WardHandoverError> {
        let db = self.db.lock()?;
        let patient = PatientLifecycle::new(&db).restore(&id)?;
        Ok(FfiPatient::from_patient(patient, self.config.retention()))
    }

    /// Permanently delete a patient with all progress and handovers.
    pub fn purge_patient(&self, id: String) -> Result<(), WardHandoverError> {
        let db = self.db.lock()?;
        if !PatientLifecycle::new(&db).purge(&id)? {
            return Err(WardHandoverError::NotFound(id));
        }
        Ok(())
    }

    /// Run one archive sweep now. Uses the configured retention when none is given.
    pub fn sweep_expired(
        &self,
        retention_days: Option<u32>,
    ) -> Result<FfiSweepReport, WardHandoverError> {
        let retention = match retention_days {
            Some(days) => self.config.clone().with_retention_days(days)?.retention(),
            None => self.config.retention(),
        };
        let db = self.db.lock()?;
        let report = PatientLifecycle::new(&db).sweep_expired(Utc::now(), retention)?;
        Ok(report.into())
    }

    // =========================================================================
    // Handover Operations
    // =========================================================================

    /// Handovers for a patient, optionally for one date, newest first.
    pub fn list_handovers(
        &self,
        patient_id: String,
        date: Option<String>,
    ) -> Result<Vec<FfiHandoverTask>, WardHandoverError> {
        let date = validation::optional(date.as_deref(), |d| validation::date("date", d))?;
        let db = self.db.lock()?;
        let rows = HandoverTasks::new(&db).list_for_patient(&patient_id, date)?;
        Ok(rows.into_iter().map(|h| h.into()).collect())
    }

    /// Submit or amend the handover for a patient and date.
    pub fn set_handover(
        &self,
        patient_id: String,
        date: String,
        tasks: String,
        assigned_shift: Option<String>,
    ) -> Result<FfiHandoverTask, WardHandoverError> {
        let date = validation::date("date", &date)?;
        let shift = assigned_shift.unwrap_or_else(|| DEFAULT_SHIFT.to_string());
        let db = self.db.lock()?;
        let handover = HandoverTasks::new(&db).set_for_date(&patient_id, date, &tasks, &shift)?;
        Ok(handover.into())
    }

    /// Edit a specific handover row.
    pub fn update_handover(
        &self,
        id: String,
        input: FfiHandoverUpdate,
    ) -> Result<FfiHandoverTask, WardHandoverError> {
        let update = models::HandoverUpdate {
            tasks: input.tasks,
            status: validation::optional(input.status.as_deref(), validation::handover_status)?,
        };
        let db = self.db.lock()?;
        let handover = HandoverTasks::new(&db).update(&id, update)?;
        Ok(handover.into())
    }

    /// Delete a specific handover row.
    pub fn delete_handover(&self, id: String) -> Result<(), WardHandoverError> {
        let db = self.db.lock()?;
        HandoverTasks::new(&db).delete(&id)?;
        Ok(())
    }

    // =========================================================================
    // Progress Operations
    // =========================================================================

    /// Progress notes for a patient, oldest first.
    pub fn list_progress(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiProgressEntry>, WardHandoverError> {
        let db = self.db.lock()?;
        let entries = ProgressLog::new(&db).list(&patient_id)?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    /// Record a progress note.
    pub fn add_progress(
        &self,
        patient_id: String,
        date: String,
        notes: String,
    ) -> Result<FfiProgressEntry, WardHandoverError> {
        let date = validation::required("date", &date)?;
        let notes = validation::required("notes", &notes)?;
        let db = self.db.lock()?;
        let entry = ProgressLog::new(&db).add(&patient_id, &date, &notes)?;
        Ok(entry.into())
    }

    /// Replace the notes of a progress entry.
    pub fn update_progress(
        &self,
        id: String,
        notes: String,
    ) -> Result<FfiProgressEntry, WardHandoverError> {
        let notes = validation::required("notes", &notes)?;
        let db = self.db.lock()?;
        let entry = ProgressLog::new(&db).update(&id, &notes)?;
        Ok(entry.into())
    }

    /// Delete a progress entry.
    pub fn delete_progress(&self, id: String) -> Result<(), WardHandoverError> {
        let db = self.db.lock()?;
        ProgressLog::new(&db).delete(&id)?;
        Ok(())
    }

    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Issue a bearer token for a user.
    pub fn issue_session(&self, user_id: String) -> Result<String, WardHandoverError> {
        let user_id = validation::required("user_id", &user_id)?;
        let db = self.db.lock()?;
        Ok(SessionStore::new(&db).issue(&user_id, self.config.session_ttl())?)
    }

    /// Resolve a bearer token to its user ID.
    pub fn authenticate(&self, token: String) -> Result<String, WardHandoverError> {
        let db = self.db.lock()?;
        SessionStore::new(&db)
            .resolve(&token, Utc::now())?
            .ok_or(WardHandoverError::Unauthorized)
    }

    /// Revoke a bearer token. Returns `false` if it was unknown.
    pub fn revoke_session(&self, token: String) -> Result<bool, WardHandoverError> {
        let db = self.db.lock()?;
        Ok(SessionStore::new(&db).revoke(&token)?)
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Active patients grouped by department.
    pub fn dashboard(&self) -> Result<Vec<FfiDepartmentGroup>, WardHandoverError> {
        let db = self.db.lock()?;
        let groups = export::WardExporter::new(&db).dashboard()?;
        let retention = self.config.retention();
        Ok(groups
            .into_iter()
            .map(|g| FfiDepartmentGroup {
                code: g.code,
                label: g.label,
                patients: g
                    .patients
                    .into_iter()
                    .map(|p| FfiPatient::from_patient(p, retention))
                    .collect(),
            })
            .collect())
    }

    /// Export the ward overview as CSV.
    pub fn export_overview_csv(&self) -> Result<String, WardHandoverError> {
        let db = self.db.lock()?;
        let overview = export::WardExporter::new(&db).overview()?;
        Ok(overview.to_csv())
    }

    /// Export the ward overview as JSON.
    pub fn export_overview_json(&self) -> Result<String, WardHandoverError> {
        let db = self.db.lock()?;
        let overview = export::WardExporter::new(&db).overview()?;
        Ok(overview.to_json()?)
    }

    /// Export a discharge summary as JSON.
    pub fn export_discharge_summary_json(
        &self,
        patient_id: String,
    ) -> Result<String, WardHandoverError> {
        let db = self.db.lock()?;
        let summary = export::WardExporter::new(&db).discharge_summary(&patient_id)?;
        Ok(summary.to_json()?)
    }

    /// Export a discharge summary as printable text.
    pub fn export_discharge_summary_text(
        &self,
        patient_id: String,
    ) -> Result<String, WardHandoverError> {
        let db = self.db.lock()?;
        let summary = export::WardExporter::new(&db).discharge_summary(&patient_id)?;
        Ok(summary.to_text())
    }
}

/// Shift label used when a handover is submitted without one.
const DEFAULT_SHIFT: &str = "next";

impl WardHandoverCore {
    /// Open the configured database.
    pub fn with_config(config: CoreConfig) -> Result<Arc<Self>, WardHandoverError> {
        let db = Database::open(config.database_path())?;
        Ok(Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        }))
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Start the background archive sweeper on this core's database.
    pub fn spawn_sweeper(&self) -> SweeperHandle {
        start_sweeper(
            self.db.clone(),
            self.config.retention(),
            self.config.sweep_interval(),
        )
    }

    fn to_ffi_patients(&self, patients: Vec<Patient>) -> Vec<FfiPatient> {
        let retention = self.config.retention();
        patients
            .into_iter()
            .map(|p| FfiPatient::from_patient(p, retention))
            .collect()
    }
}

// =========================================================================
// FFI Types
// =========================================================================

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub mrn: String,
    pub age: String,
    /// "M", "F" or "O"
    pub sex: String,
    /// Ward code, e.g. "MW"
    pub department: String,
    pub bed: String,
    pub diagnosis: String,
    /// Date of admission, `YYYY-MM-DD`
    pub doa: String,
    pub status: String,
    pub medications: String,
    pub hpi: String,
    pub tasks: String,
    pub notes: String,
    pub is_deleted: bool,
    pub deleted_at: Option<String>,
    /// When the archive sweep will remove this patient
    pub purge_due_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl FfiPatient {
    fn from_patient(patient: Patient, retention: Duration) -> Self {
        let purge_due_at = patient.purge_due_at(retention).map(rfc3339);
        Self {
            is_deleted: patient.is_deleted(),
            deleted_at: patient.deleted_at.map(rfc3339),
            purge_due_at,
            sex: patient.sex.code().to_string(),
            department: patient.department.code().to_string(),
            doa: patient.doa.format("%Y-%m-%d").to_string(),
            status: patient.status.as_str().to_string(),
            created_at: rfc3339(patient.created_at),
            updated_at: rfc3339(patient.updated_at),
            id: patient.id,
            name: patient.name,
            mrn: patient.mrn,
            age: patient.age,
            bed: patient.bed,
            diagnosis: patient.diagnosis,
            medications: patient.medications,
            hpi: patient.hpi,
            tasks: patient.tasks,
            notes: patient.notes,
        }
    }
}

/// FFI-safe patient admission input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub name: String,
    pub mrn: String,
    pub age: String,
    pub sex: String,
    pub department: String,
    pub bed: String,
    pub diagnosis: String,
    pub doa: String,
    /// Defaults to "Stable"
    pub status: Option<String>,
    pub medications: Option<String>,
    pub hpi: Option<String>,
    pub tasks: Option<String>,
    pub notes: Option<String>,
}

impl FfiNewPatient {
    fn validate(self) -> Result<NewPatient, validation::ValidationError> {
        Ok(NewPatient {
            name: validation::required("name", &self.name)?,
            mrn: validation::required("mrn", &self.mrn)?,
            age: validation::required("age", &self.age)?,
            sex: validation::sex(&self.sex)?,
            department: validation::department(&self.department)?,
            bed: validation::required("bed", &self.bed)?,
            diagnosis: validation::required("diagnosis", &self.diagnosis)?,
            doa: validation::date("doa", &self.doa)?,
            status: validation::optional(self.status.as_deref(), validation::clinical_status)?
                .unwrap_or(ClinicalStatus::Stable),
            medications: self.medications.unwrap_or_default(),
            hpi: self.hpi.unwrap_or_default(),
            tasks: self.tasks.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
        })
    }
}

/// FFI-safe partial patient update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiPatientUpdate {
    pub name: Option<String>,
    pub age: Option<String>,
    pub sex: Option<String>,
    pub department: Option<String>,
    pub bed: Option<String>,
    pub diagnosis: Option<String>,
    pub doa: Option<String>,
    pub status: Option<String>,
    pub medications: Option<String>,
    pub hpi: Option<String>,
    pub tasks: Option<String>,
    pub notes: Option<String>,
}

impl FfiPatientUpdate {
    fn validate(self) -> Result<PatientUpdate, validation::ValidationError> {
        use validation::optional;

        Ok(PatientUpdate {
            name: optional(self.name.as_deref(), |v| validation::required("name", v))?,
            age: optional(self.age.as_deref(), |v| validation::required("age", v))?,
            sex: optional(self.sex.as_deref(), validation::sex)?,
            department: optional(self.department.as_deref(), validation::department)?,
            bed: optional(self.bed.as_deref(), |v| validation::required("bed", v))?,
            diagnosis: optional(self.diagnosis.as_deref(), |v| validation::required("diagnosis", v))?,
            doa: optional(self.doa.as_deref(), |v| validation::date("doa", v))?,
            status: optional(self.status.as_deref(), validation::clinical_status)?,
            medications: self.medications,
            hpi: self.hpi,
            tasks: self.tasks,
            notes: self.notes,
        })
    }
}

/// FFI-safe handover row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHandoverTask {
    pub id: String,
    pub patient_id: String,
    pub date: String,
    pub tasks: String,
    /// "pending" or "completed"
    pub status: String,
    pub assigned_shift: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<HandoverTask> for FfiHandoverTask {
    fn from(handover: HandoverTask) -> Self {
        Self {
            date: handover.date.format("%Y-%m-%d").to_string(),
            status: handover.status.as_str().to_string(),
            created_at: rfc3339(handover.created_at),
            updated_at: rfc3339(handover.updated_at),
            id: handover.id,
            patient_id: handover.patient_id,
            tasks: handover.tasks,
            assigned_shift: handover.assigned_shift,
        }
    }
}

/// FFI-safe handover edit.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiHandoverUpdate {
    pub tasks: Option<String>,
    pub status: Option<String>,
}

/// FFI-safe progress entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProgressEntry {
    pub id: String,
    pub patient_id: String,
    pub date: String,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProgressEntry> for FfiProgressEntry {
    fn from(entry: ProgressEntry) -> Self {
        Self {
            created_at: rfc3339(entry.created_at),
            updated_at: rfc3339(entry.updated_at),
            id: entry.id,
            patient_id: entry.patient_id,
            date: entry.date,
            notes: entry.notes,
        }
    }
}

/// FFI-safe department dashboard group.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDepartmentGroup {
    pub code: String,
    pub label: String,
    pub patients: Vec<FfiPatient>,
}

/// FFI-safe sweep report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSweepReport {
    pub swept_at: String,
    pub cutoff: String,
    pub purged: Vec<String>,
    pub skipped: u32,
    pub failed: Vec<FfiSweepFailure>,
}

/// FFI-safe per-record sweep failure.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSweepFailure {
    pub patient_id: String,
    pub error: String,
}

impl From<SweepReport> for FfiSweepReport {
    fn from(report: SweepReport) -> Self {
        Self {
            swept_at: rfc3339(report.swept_at),
            cutoff: rfc3339(report.cutoff),
            purged: report.purged,
            skipped: report.skipped as u32,
            failed: report
                .failed
                .into_iter()
                .map(|f| FfiSweepFailure {
                    patient_id: f.patient_id,
                    error: f.error,
                })
                .collect(),
        }
    }
}
