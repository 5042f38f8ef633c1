//! SQLite schema definition.

/// Complete database schema for the ward handover tracker.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients (soft-deleted into the archive, purged after retention)
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    mrn TEXT NOT NULL UNIQUE,                    -- shared by active and archived rows
    age TEXT NOT NULL,
    sex TEXT NOT NULL CHECK (sex IN ('M', 'F', 'O')),
    department TEXT NOT NULL,
    bed TEXT NOT NULL,
    diagnosis TEXT NOT NULL,
    doa TEXT NOT NULL,                           -- date of admission, YYYY-MM-DD
    status TEXT NOT NULL,
    medications TEXT NOT NULL DEFAULT '',
    hpi TEXT NOT NULL DEFAULT '',
    tasks TEXT NOT NULL DEFAULT '',
    notes TEXT NOT NULL DEFAULT '',
    is_deleted INTEGER NOT NULL DEFAULT 0,
    deleted_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK (
        (is_deleted = 0 AND deleted_at IS NULL) OR
        (is_deleted = 1 AND deleted_at IS NOT NULL)
    )
);

CREATE INDEX IF NOT EXISTS idx_patients_archive ON patients(is_deleted, deleted_at);

-- ============================================================================
-- Daily Progress (owned by patient, hard delete)
-- ============================================================================

CREATE TABLE IF NOT EXISTS progress_entries (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    notes TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_progress_patient ON progress_entries(patient_id, created_at);

-- ============================================================================
-- Shift Handovers (one logical row per patient per date, newest wins)
-- ============================================================================

CREATE TABLE IF NOT EXISTS handovers (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    tasks TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'completed')),
    assigned_shift TEXT NOT NULL DEFAULT 'next',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Deliberately not UNIQUE: historical duplicates for a date are tolerated
CREATE INDEX IF NOT EXISTS idx_handovers_patient_date ON handovers(patient_id, date, created_at);

-- ============================================================================
-- Bearer Sessions
-- ============================================================================

CREATE TABLE IF NOT EXISTS sessions (
    token_digest TEXT PRIMARY KEY,               -- SHA-256 of the bearer token
    user_id TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(expires_at);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    fn insert_patient(conn: &Connection, id: &str, mrn: &str, is_deleted: i64, deleted_at: Option<&str>) -> rusqlite::Result<usize> {
        conn.execute(
            r#"
            INSERT INTO patients (id, name, mrn, age, sex, department, bed, diagnosis,
                                  doa, status, is_deleted, deleted_at, created_at, updated_at)
            VALUES (?1, 'Test', ?2, '40', 'M', 'MW', '1', 'Dx', '2024-01-01', 'Stable',
                    ?3, ?4, '2024-01-01 00:00:00+00:00', '2024-01-01 00:00:00+00:00')
            "#,
            rusqlite::params![id, mrn, is_deleted, deleted_at],
        )
    }

    #[test]
    fn test_archive_flag_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        // Archived without timestamp should fail
        assert!(insert_patient(&conn, "p1", "M1", 1, None).is_err());

        // Active with timestamp should fail
        assert!(insert_patient(&conn, "p2", "M2", 0, Some("2024-01-02 00:00:00+00:00")).is_err());

        // Consistent rows succeed
        assert!(insert_patient(&conn, "p3", "M3", 0, None).is_ok());
        assert!(insert_patient(&conn, "p4", "M4", 1, Some("2024-01-02 00:00:00+00:00")).is_ok());
    }

    #[test]
    fn test_mrn_unique_across_archive() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        insert_patient(&conn, "p1", "M100", 1, Some("2024-01-02 00:00:00+00:00")).unwrap();
        assert!(insert_patient(&conn, "p2", "M100", 0, None).is_err());
    }

    #[test]
    fn test_cascade_delete() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        insert_patient(&conn, "p1", "M100", 0, None).unwrap();

        conn.execute(
            "INSERT INTO handovers (id, patient_id, date, created_at, updated_at) VALUES ('h1', 'p1', '2024-01-01', 'x', 'x')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO progress_entries (id, patient_id, date, notes, created_at, updated_at) VALUES ('e1', 'p1', '2024-01-01', 'ok', 'x', 'x')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM patients WHERE id = 'p1'", []).unwrap();

        let remaining: i64 = conn
            .query_row(
                "SELECT (SELECT COUNT(*) FROM handovers) + (SELECT COUNT(*) FROM progress_entries)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_orphan_handover_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO handovers (id, patient_id, date, created_at, updated_at) VALUES ('h1', 'missing', '2024-01-01', 'x', 'x')",
            [],
        );
        assert!(result.is_err());
    }
}
