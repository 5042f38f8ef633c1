//! Daily progress note models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A daily progress note written by a clinician.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressEntry {
    /// Unique entry ID
    pub id: String,
    /// Owning patient ID
    pub patient_id: String,
    /// Calendar date label the note refers to (display only)
    pub date: String,
    /// Progress notes
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressEntry {
    /// Create a new progress entry.
    pub fn new(patient_id: String, date: String, notes: String, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            date,
            notes,
            created_at: now,
            updated_at: now,
        }
    }
}
