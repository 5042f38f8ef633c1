//! Handover database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{is_foreign_key_violation, Database, DbError, DbResult};
use crate::models::{HandoverStatus, HandoverTask};

impl Database {
    /// Insert a handover row. Fails with `NotFound` if the patient does not exist.
    pub fn insert_handover(&self, handover: &HandoverTask) -> DbResult<()> {
        let result = self.conn.execute(
            r#"
            INSERT INTO handovers (
                id, patient_id, date, tasks, status, assigned_shift, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                handover.id,
                handover.patient_id,
                handover.date,
                handover.tasks,
                handover.status.as_str(),
                handover.assigned_shift,
                handover.created_at,
                handover.updated_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_foreign_key_violation(&e) => {
                Err(DbError::NotFound(format!("patient {}", handover.patient_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write back tasks, status and `updated_at` of an existing row.
    pub fn update_handover(&self, handover: &HandoverTask) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE handovers SET
                tasks = ?2,
                status = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
            params![
                handover.id,
                handover.tasks,
                handover.status.as_str(),
                handover.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a handover by ID.
    pub fn get_handover(&self, id: &str) -> DbResult<Option<HandoverTask>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, date, tasks, status, assigned_shift, created_at, updated_at
                FROM handovers
                WHERE id = ?
                "#,
                [id],
                HandoverRow::from_row,
            )
            .optional()?
            .map(HandoverTask::try_from)
            .transpose()
    }

    /// List handovers for a patient, optionally for one date, newest created first.
    pub fn list_handovers_for_patient(
        &self,
        patient_id: &str,
        date: Option<NaiveDate>,
    ) -> DbResult<Vec<HandoverTask>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, date, tasks, status, assigned_shift, created_at, updated_at
            FROM handovers
            WHERE patient_id = ?1 AND (?2 IS NULL OR date = ?2)
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;

        let rows = stmt.query_map(params![patient_id, date], HandoverRow::from_row)?;

        let mut handovers = Vec::new();
        for row in rows {
            handovers.push(row?.try_into()?);
        }
        Ok(handovers)
    }

    /// The most recently created handover for a patient and date.
    pub fn latest_handover_for_date(
        &self,
        patient_id: &str,
        date: NaiveDate,
    ) -> DbResult<Option<HandoverTask>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, date, tasks, status, assigned_shift, created_at, updated_at
                FROM handovers
                WHERE patient_id = ?1 AND date = ?2
                ORDER BY created_at DESC, rowid DESC
                LIMIT 1
                "#,
                params![patient_id, date],
                HandoverRow::from_row,
            )
            .optional()?
            .map(HandoverTask::try_from)
            .transpose()
    }

    /// Delete a handover.
    pub fn delete_handover(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM handovers WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct HandoverRow {
    id: String,
    patient_id: String,
    date: NaiveDate,
    tasks: String,
    status: String,
    assigned_shift: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl HandoverRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            date: row.get(2)?,
            tasks: row.get(3)?,
            status: row.get(4)?,
            assigned_shift: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl TryFrom<HandoverRow> for HandoverTask {
    type Error = DbError;

    fn try_from(row: HandoverRow) -> Result<Self, Self::Error> {
        let status = HandoverStatus::from_str_opt(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown handover status: {}", row.status)))?;

        Ok(HandoverTask {
            id: row.id,
            patient_id: row.patient_id,
            date: row.date,
            tasks: row.tasks,
            status,
            assigned_shift: row.assigned_shift,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
