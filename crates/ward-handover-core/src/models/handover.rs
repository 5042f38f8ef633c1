//! Shift handover task models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Completion state of a handover.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum HandoverStatus {
    #[default]
    Pending,
    Completed,
}

impl HandoverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandoverStatus::Pending => "pending",
            HandoverStatus::Completed => "completed",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(HandoverStatus::Pending),
            "completed" => Some(HandoverStatus::Completed),
            _ => None,
        }
    }
}

/// Outstanding tasks handed from one shift to the next for a patient and date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandoverTask {
    /// Unique handover ID
    pub id: String,
    /// Owning patient ID
    pub patient_id: String,
    /// Shift date the handover applies to
    pub date: NaiveDate,
    /// Free-text task list
    pub tasks: String,
    pub status: HandoverStatus,
    /// Receiving shift label (e.g. "next")
    pub assigned_shift: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HandoverTask {
    /// Create a new pending handover.
    pub fn new(
        patient_id: String,
        date: NaiveDate,
        tasks: String,
        assigned_shift: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            date,
            tasks,
            status: HandoverStatus::Pending,
            assigned_shift,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a single handover row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HandoverUpdate {
    pub tasks: Option<String>,
    pub status: Option<HandoverStatus>,
}
