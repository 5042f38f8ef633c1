//! Patient models.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Recorded sex of the patient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    /// Single-letter code used in storage and on forms.
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Other => "O",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Sex::Male),
            "F" => Some(Sex::Female),
            "O" => Some(Sex::Other),
            _ => None,
        }
    }
}

/// Ward or department the patient is admitted to.
///
/// Declaration order is the display priority used by the ward overview.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Department {
    /// Medical Ward
    Medical,
    /// Private Ward
    Private,
    /// Gynecology Ward
    Gynecology,
    /// Surgical Ward
    Surgical,
    /// Emergency Room
    Emergency,
}

impl Department {
    /// All departments in display priority order.
    pub const ALL: [Department; 5] = [
        Department::Medical,
        Department::Private,
        Department::Gynecology,
        Department::Surgical,
        Department::Emergency,
    ];

    /// Short ward code (e.g. "MW").
    pub fn code(&self) -> &'static str {
        match self {
            Department::Medical => "MW",
            Department::Private => "PVT",
            Department::Gynecology => "GW",
            Department::Surgical => "SW",
            Department::Emergency => "ER",
        }
    }

    /// Human readable ward name.
    pub fn label(&self) -> &'static str {
        match self {
            Department::Medical => "Medical Ward",
            Department::Private => "Private Ward",
            Department::Gynecology => "Gynecology Ward",
            Department::Surgical => "Surgical Ward",
            Department::Emergency => "Emergency Room",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.code() == code)
    }
}

/// Clinical status shown on the dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClinicalStatus {
    Stable,
    Critical,
    Monitoring,
    Discharge,
}

impl ClinicalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClinicalStatus::Stable => "Stable",
            ClinicalStatus::Critical => "Critical",
            ClinicalStatus::Monitoring => "Monitoring",
            ClinicalStatus::Discharge => "Discharge",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "Stable" => Some(ClinicalStatus::Stable),
            "Critical" => Some(ClinicalStatus::Critical),
            "Monitoring" => Some(ClinicalStatus::Monitoring),
            "Discharge" => Some(ClinicalStatus::Discharge),
            _ => None,
        }
    }
}

/// A ward patient record.
///
/// A patient is archived exactly when `deleted_at` is set; there is no separate
/// flag that could disagree with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Opaque UUID, immutable
    pub id: String,
    pub name: String,
    /// Medical record number, unique across active and archived records
    pub mrn: String,
    pub age: String,
    pub sex: Sex,
    pub department: Department,
    /// Bed label (e.g. "12" or "B4")
    pub bed: String,
    pub diagnosis: String,
    /// Date of admission
    pub doa: NaiveDate,
    pub status: ClinicalStatus,
    pub medications: String,
    /// History of present illness
    pub hpi: String,
    pub tasks: String,
    pub notes: String,
    /// Set when the patient was archived, cleared on restore
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// Build a fresh, active record from validated input.
    pub fn from_new(new: NewPatient, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name,
            mrn: new.mrn,
            age: new.age,
            sex: new.sex,
            department: new.department,
            bed: new.bed,
            diagnosis: new.diagnosis,
            doa: new.doa,
            status: new.status,
            medications: new.medications,
            hpi: new.hpi,
            tasks: new.tasks,
            notes: new.notes,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the patient is in the archive.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// When an archived patient becomes eligible for purge.
    pub fn purge_due_at(&self, retention: Duration) -> Option<DateTime<Utc>> {
        self.deleted_at.map(|at| at + retention)
    }

    /// Numeric part of the bed label, 0 when it has no digits.
    pub fn bed_number(&self) -> u32 {
        let digits: String = self.bed.chars().filter(|c| c.is_ascii_digit()).collect();
        digits.parse().unwrap_or(0)
    }
}

/// Input for creating a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    pub name: String,
    pub mrn: String,
    pub age: String,
    pub sex: Sex,
    pub department: Department,
    pub bed: String,
    pub diagnosis: String,
    pub doa: NaiveDate,
    pub status: ClinicalStatus,
    #[serde(default)]
    pub medications: String,
    #[serde(default)]
    pub hpi: String,
    #[serde(default)]
    pub tasks: String,
    #[serde(default)]
    pub notes: String,
}

/// Partial update of an active patient. `None` leaves the field untouched.
///
/// The medical record number is not editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub age: Option<String>,
    pub sex: Option<Sex>,
    pub department: Option<Department>,
    pub bed: Option<String>,
    pub diagnosis: Option<String>,
    pub doa: Option<NaiveDate>,
    pub status: Option<ClinicalStatus>,
    pub medications: Option<String>,
    pub hpi: Option<String>,
    pub tasks: Option<String>,
    pub notes: Option<String>,
}

impl PatientUpdate {
    /// Merge the supplied fields over `patient`.
    pub fn apply_to(self, patient: &mut Patient) {
        if let Some(name) = self.name {
            patient.name = name;
        }
        if let Some(age) = self.age {
            patient.age = age;
        }
        if let Some(sex) = self.sex {
            patient.sex = sex;
        }
        if let Some(department) = self.department {
            patient.department = department;
        }
        if let Some(bed) = self.bed {
            patient.bed = bed;
        }
        if let Some(diagnosis) = self.diagnosis {
            patient.diagnosis = diagnosis;
        }
        if let Some(doa) = self.doa {
            patient.doa = doa;
        }
        if let Some(status) = self.status {
            patient.status = status;
        }
        if let Some(medications) = self.medications {
            patient.medications = medications;
        }
        if let Some(hpi) = self.hpi {
            patient.hpi = hpi;
        }
        if let Some(tasks) = self.tasks {
            patient.tasks = tasks;
        }
        if let Some(notes) = self.notes {
            patient.notes = notes;
        }
    }
}
