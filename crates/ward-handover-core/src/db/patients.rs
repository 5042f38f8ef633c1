//! Patient database operations.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{is_unique_violation, Database, DbError, DbResult};
use crate::models::{ClinicalStatus, Department, Patient, Sex};

const PATIENT_COLUMNS: &str = r#"
    id, name, mrn, age, sex, department, bed, diagnosis, doa, status,
    medications, hpi, tasks, notes, deleted_at, created_at, updated_at
"#;

impl Database {
    /// Insert a new patient. Fails with `Conflict` if the MRN is already taken.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        let result = self.conn.execute(
            r#"
            INSERT INTO patients (
                id, name, mrn, age, sex, department, bed, diagnosis, doa, status,
                medications, hpi, tasks, notes, is_deleted, deleted_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#,
            params![
                patient.id,
                patient.name,
                patient.mrn,
                patient.age,
                patient.sex.code(),
                patient.department.code(),
                patient.bed,
                patient.diagnosis,
                patient.doa,
                patient.status.as_str(),
                patient.medications,
                patient.hpi,
                patient.tasks,
                patient.notes,
                patient.is_deleted(),
                patient.deleted_at,
                patient.created_at,
                patient.updated_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(DbError::Conflict(format!(
                "medical record number {} already exists",
                patient.mrn
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the editable fields of an active patient.
    ///
    /// Returns `false` if the patient is missing or archived.
    pub fn update_active_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                name = ?2,
                age = ?3,
                sex = ?4,
                department = ?5,
                bed = ?6,
                diagnosis = ?7,
                doa = ?8,
                status = ?9,
                medications = ?10,
                hpi = ?11,
                tasks = ?12,
                notes = ?13,
                updated_at = ?14
            WHERE id = ?1 AND is_deleted = 0
            "#,
            params![
                patient.id,
                patient.name,
                patient.age,
                patient.sex.code(),
                patient.department.code(),
                patient.bed,
                patient.diagnosis,
                patient.doa,
                patient.status.as_str(),
                patient.medications,
                patient.hpi,
                patient.tasks,
                patient.notes,
                patient.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID, archived or not.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?"),
                [id],
                PatientRow::from_row,
            )
            .optional()?
            .map(Patient::try_from)
            .transpose()
    }

    /// Get a patient by medical record number, archived or not.
    pub fn get_patient_by_mrn(&self, mrn: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE mrn = ?"),
                [mrn],
                PatientRow::from_row,
            )
            .optional()?
            .map(Patient::try_from)
            .transpose()
    }

    /// List patients that are not archived.
    pub fn list_active_patients(&self) -> DbResult<Vec<Patient>> {
        self.list_patients_where("is_deleted = 0")
    }

    /// List archived patients, oldest archive first.
    pub fn list_archived_patients(&self) -> DbResult<Vec<Patient>> {
        self.list_patients_where("is_deleted = 1")
    }

    fn list_patients_where(&self, filter: &str) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE {filter} ORDER BY deleted_at, name"
        ))?;

        let rows = stmt.query_map([], PatientRow::from_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// Move an active patient into the archive.
    ///
    /// Returns `false` if the patient is missing or already archived.
    pub fn archive_patient(&self, id: &str, at: DateTime<Utc>) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET is_deleted = 1, deleted_at = ?2, updated_at = ?2
            WHERE id = ?1 AND is_deleted = 0
            "#,
            params![id, at],
        )?;
        Ok(rows_affected > 0)
    }

    /// Bring an archived patient back to the active list.
    ///
    /// Returns `false` if the patient is missing or not archived.
    pub fn restore_patient(&self, id: &str, at: DateTime<Utc>) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET is_deleted = 0, deleted_at = NULL, updated_at = ?2
            WHERE id = ?1 AND is_deleted = 1
            "#,
            params![id, at],
        )?;
        Ok(rows_affected > 0)
    }

    /// Permanently delete a patient. Progress and handovers cascade.
    pub fn delete_patient(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// IDs of archived patients whose `deleted_at` is strictly before `cutoff`.
    pub fn archived_patient_ids_before(&self, cutoff: DateTime<Utc>) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id FROM patients
            WHERE is_deleted = 1 AND deleted_at < ?
            ORDER BY deleted_at
            "#,
        )?;

        let rows = stmt.query_map([cutoff], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a patient only if it is still archived before `cutoff`.
    ///
    /// The state is re-checked in the statement itself, so a patient restored
    /// after being selected for purge survives.
    pub fn delete_patient_if_archived_before(
        &self,
        id: &str,
        cutoff: DateTime<Utc>,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM patients WHERE id = ?1 AND is_deleted = 1 AND deleted_at < ?2",
            params![id, cutoff],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: String,
    name: String,
    mrn: String,
    age: String,
    sex: String,
    department: String,
    bed: String,
    diagnosis: String,
    doa: NaiveDate,
    status: String,
    medications: String,
    hpi: String,
    tasks: String,
    notes: String,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PatientRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            mrn: row.get(2)?,
            age: row.get(3)?,
            sex: row.get(4)?,
            department: row.get(5)?,
            bed: row.get(6)?,
            diagnosis: row.get(7)?,
            doa: row.get(8)?,
            status: row.get(9)?,
            medications: row.get(10)?,
            hpi: row.get(11)?,
            tasks: row.get(12)?,
            notes: row.get(13)?,
            deleted_at: row.get(14)?,
            created_at: row.get(15)?,
            updated_at: row.get(16)?,
        })
    }
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let sex = Sex::from_code(&row.sex)
            .ok_or_else(|| DbError::Constraint(format!("Unknown sex code: {}", row.sex)))?;
        let department = Department::from_code(&row.department).ok_or_else(|| {
            DbError::Constraint(format!("Unknown department: {}", row.department))
        })?;
        let status = ClinicalStatus::from_str_opt(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown clinical status: {}", row.status)))?;

        Ok(Patient {
            id: row.id,
            name: row.name,
            mrn: row.mrn,
            age: row.age,
            sex,
            department,
            bed: row.bed,
            diagnosis: row.diagnosis,
            doa: row.doa,
            status,
            medications: row.medications,
            hpi: row.hpi,
            tasks: row.tasks,
            notes: row.notes,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
