//! Discharge summary.
//!
//! Progress notes are grouped by day of admission, where the day is
//! `ceil(|created_at - doa| / 24h)` with the admission date taken as midnight UTC.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Patient, ProgressEntry};

/// Discharge summary for one patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DischargeSummary {
    pub patient: Patient,
    /// Progress grouped by day of admission, ascending
    pub days: Vec<AdmissionDay>,
    /// Export timestamp
    pub generated_at: String,
}

/// Progress notes written on one day of admission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdmissionDay {
    pub day: i64,
    pub entries: Vec<ProgressEntry>,
}

/// Day of admission a timestamp falls on.
pub fn admission_day(doa: chrono::NaiveDate, at: DateTime<Utc>) -> i64 {
    let admitted = doa.and_time(NaiveTime::MIN).and_utc();
    let elapsed = (at - admitted).abs();

    let whole = elapsed.num_days();
    if elapsed > Duration::days(whole) {
        whole + 1
    } else {
        whole
    }
}

impl DischargeSummary {
    /// Group `entries` by day of admission. Entry order within a day is kept.
    pub fn new(patient: Patient, entries: Vec<ProgressEntry>) -> Self {
        let mut days: Vec<AdmissionDay> = Vec::new();

        for entry in entries {
            let day = admission_day(patient.doa, entry.created_at);
            match days.iter_mut().find(|d| d.day == day) {
                Some(existing) => existing.entries.push(entry),
                None => days.push(AdmissionDay {
                    day,
                    entries: vec![entry],
                }),
            }
        }
        days.sort_by_key(|d| d.day);

        Self {
            patient,
            days,
            generated_at: Utc::now().to_rfc3339(),
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render as printable plain text.
    pub fn to_text(&self) -> String {
        let p = &self.patient;
        let mut out = String::new();

        out.push_str("DISCHARGE SUMMARY\n\n");
        out.push_str("Patient Details\n");
        out.push_str(&format!("Name: {}\n", p.name));
        out.push_str(&format!("MRN: {}\n", p.mrn));
        out.push_str(&format!("Age: {} years\n", p.age));
        out.push_str(&format!("Sex: {}\n", p.sex.code()));
        out.push_str(&format!("Ward/Bed: {}-{}\n", p.department.code(), p.bed));
        out.push_str(&format!("Date of Admission: {}\n", p.doa.format("%Y-%m-%d")));
        out.push_str(&format!("Diagnosis: {}\n", p.diagnosis));

        if !p.medications.trim().is_empty() {
            out.push_str(&format!("\nMedications\n{}\n", p.medications.trim()));
        }
        if !p.hpi.trim().is_empty() {
            out.push_str(&format!("\nHistory of Present Illness\n{}\n", p.hpi.trim()));
        }

        if !self.days.is_empty() {
            out.push_str("\nDaily Progress\n");
            for day in &self.days {
                out.push_str(&format!("{} day of admission:\n", ordinal(day.day)));
                for entry in &day.entries {
                    out.push_str(&format!("  {}\n", entry.notes.trim()));
                }
            }
        }

        out
    }
}

fn ordinal(n: i64) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
