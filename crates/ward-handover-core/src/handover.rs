//! Shift handover tasks.
//!
//! There is one logical handover per patient per date. Submitting a handover for a
//! date that already has rows amends the most recently created one; historical
//! duplicates are tolerated and never surface as "current".

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{HandoverTask, HandoverUpdate};

/// Handover errors.
#[derive(Error, Debug)]
pub enum HandoverError {
    #[error("Database error: {0}")]
    Database(DbError),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<DbError> for HandoverError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => HandoverError::NotFound(what),
            other => HandoverError::Database(other),
        }
    }
}

pub type HandoverResult<T> = Result<T, HandoverError>;

/// Handover task manager.
pub struct HandoverTasks<'a> {
    db: &'a Database,
}

impl<'a> HandoverTasks<'a> {
    /// Create a new handover manager.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Handovers for a patient, optionally for a single date, newest created first.
    pub fn list_for_patient(
        &self,
        patient_id: &str,
        date: Option<NaiveDate>,
    ) -> HandoverResult<Vec<HandoverTask>> {
        Ok(self.db.list_handovers_for_patient(patient_id, date)?)
    }

    /// Set the handover tasks for a patient and date.
    ///
    /// Amends the latest existing row for the date (tasks only; status and
    /// assigned shift are kept) or creates a pending one.
    pub fn set_for_date(
        &self,
        patient_id: &str,
        date: NaiveDate,
        tasks: &str,
        assigned_shift: &str,
    ) -> HandoverResult<HandoverTask> {
        let tx = self.db.begin()?;
        let now = Utc::now();

        let handover = match self.db.latest_handover_for_date(patient_id, date)? {
            Some(mut existing) => {
                tracing::debug!(handover_id = %existing.id, %date, "Amending handover");
                existing.tasks = tasks.to_string();
                existing.updated_at = now;
                self.db.update_handover(&existing)?;
                existing
            }
            None => {
                let created = HandoverTask::new(
                    patient_id.to_string(),
                    date,
                    tasks.to_string(),
                    assigned_shift.to_string(),
                    now,
                );
                tracing::debug!(handover_id = %created.id, %date, "Creating handover");
                self.db.insert_handover(&created)?;
                created
            }
        };

        tx.commit().map_err(DbError::from)?;
        Ok(handover)
    }

    /// Partially update a handover row by its own ID.
    pub fn update(&self, id: &str, update: HandoverUpdate) -> HandoverResult<HandoverTask> {
        let mut handover = self
            .db
            .get_handover(id)?
            .ok_or_else(|| HandoverError::NotFound(id.to_string()))?;

        if let Some(tasks) = update.tasks {
            handover.tasks = tasks;
        }
        if let Some(status) = update.status {
            handover.status = status;
        }
        handover.updated_at = Utc::now();

        if !self.db.update_handover(&handover)? {
            return Err(HandoverError::NotFound(id.to_string()));
        }
        Ok(handover)
    }

    /// Delete a handover row.
    pub fn delete(&self, id: &str) -> HandoverResult<()> {
        if !self.db.delete_handover(id)? {
            return Err(HandoverError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::PatientLifecycle;
    use crate::models::{ClinicalStatus, Department, HandoverStatus, NewPatient, Sex};

    fn setup() -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let patient = PatientLifecycle::new(&db)
            .create(NewPatient {
                name: "Alan".into(),
                mrn: "M42".into(),
                age: "41".into(),
                sex: Sex::Male,
                department: Department::Private,
                bed: "3".into(),
                diagnosis: "Cellulitis".into(),
                doa: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                status: ClinicalStatus::Stable,
                medications: String::new(),
                hpi: String::new(),
                tasks: String::new(),
                notes: String::new(),
            })
            .unwrap();
        (db, patient.id)
    }

    fn jan1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_set_twice_amends_single_row() {
        let (db, patient_id) = setup();
        let handovers = HandoverTasks::new(&db);

        let first = handovers.set_for_date(&patient_id, jan1(), "task A", "next").unwrap();
        let second = handovers.set_for_date(&patient_id, jan1(), "task B", "next").unwrap();

        assert_eq!(first.id, second.id);
        let rows = handovers.list_for_patient(&patient_id, Some(jan1())).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tasks, "task B");
    }

    #[test]
    fn test_amend_keeps_status_and_shift() {
        let (db, patient_id) = setup();
        let handovers = HandoverTasks::new(&db);

        let created = handovers.set_for_date(&patient_id, jan1(), "task A", "night").unwrap();
        handovers
            .update(
                &created.id,
                HandoverUpdate {
                    status: Some(HandoverStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();

        let amended = handovers.set_for_date(&patient_id, jan1(), "task B", "day").unwrap();
        assert_eq!(amended.tasks, "task B");
        assert_eq!(amended.assigned_shift, "night");
        assert_eq!(amended.status, HandoverStatus::Completed);
    }

    #[test]
    fn test_amend_targets_latest_duplicate() {
        let (db, patient_id) = setup();
        let handovers = HandoverTasks::new(&db);

        // Two rows for the same date, as left behind by concurrent writers
        let base = Utc::now();
        let older = HandoverTask::new(patient_id.clone(), jan1(), "old".into(), "next".into(), base);
        let newer = HandoverTask::new(
            patient_id.clone(),
            jan1(),
            "new".into(),
            "next".into(),
            base + chrono::Duration::seconds(1),
        );
        db.insert_handover(&older).unwrap();
        db.insert_handover(&newer).unwrap();

        let amended = handovers.set_for_date(&patient_id, jan1(), "fixed", "next").unwrap();
        assert_eq!(amended.id, newer.id);

        let stored_older = db.get_handover(&older.id).unwrap().unwrap();
        assert_eq!(stored_older.tasks, "old");
    }

    #[test]
    fn test_new_date_creates_pending_row() {
        let (db, patient_id) = setup();
        let handovers = HandoverTasks::new(&db);

        let jan2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        handovers.set_for_date(&patient_id, jan1(), "a", "next").unwrap();
        let created = handovers.set_for_date(&patient_id, jan2, "b", "next").unwrap();

        assert_eq!(created.status, HandoverStatus::Pending);
        assert_eq!(handovers.list_for_patient(&patient_id, None).unwrap().len(), 2);
    }

    #[test]
    fn test_set_for_unknown_patient() {
        let (db, _) = setup();
        let result = HandoverTasks::new(&db).set_for_date("nobody", jan1(), "a", "next");
        assert!(matches!(result, Err(HandoverError::NotFound(_))));
    }

    #[test]
    fn test_update_and_delete_missing() {
        let (db, _) = setup();
        let handovers = HandoverTasks::new(&db);
        assert!(matches!(
            handovers.update("missing", HandoverUpdate::default()),
            Err(HandoverError::NotFound(_))
        ));
        assert!(matches!(
            handovers.delete("missing"),
            Err(HandoverError::NotFound(_))
        ));
    }
}
