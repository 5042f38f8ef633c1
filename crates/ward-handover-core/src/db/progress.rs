//! Daily progress database operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{is_foreign_key_violation, Database, DbError, DbResult};
use crate::models::ProgressEntry;

impl Database {
    /// Insert a progress entry. Fails with `NotFound` if the patient does not exist.
    pub fn insert_progress(&self, entry: &ProgressEntry) -> DbResult<()> {
        let result = self.conn.execute(
            r#"
            INSERT INTO progress_entries (id, patient_id, date, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.id,
                entry.patient_id,
                entry.date,
                entry.notes,
                entry.created_at,
                entry.updated_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_foreign_key_violation(&e) => {
                Err(DbError::NotFound(format!("patient {}", entry.patient_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a progress entry by ID.
    pub fn get_progress(&self, id: &str) -> DbResult<Option<ProgressEntry>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, date, notes, created_at, updated_at
                FROM progress_entries
                WHERE id = ?
                "#,
                [id],
                progress_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List progress entries for a patient in chronological order.
    pub fn list_progress_for_patient(&self, patient_id: &str) -> DbResult<Vec<ProgressEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, date, notes, created_at, updated_at
            FROM progress_entries
            WHERE patient_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )?;

        let rows = stmt.query_map([patient_id], progress_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Replace the notes of a progress entry.
    pub fn update_progress_notes(&self, id: &str, notes: &str, at: DateTime<Utc>) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE progress_entries SET notes = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, notes, at],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a progress entry.
    pub fn delete_progress(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM progress_entries WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn progress_from_row(row: &Row<'_>) -> rusqlite::Result<ProgressEntry> {
    Ok(ProgressEntry {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        date: row.get(2)?,
        notes: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
