//! Ward overview sheet and department dashboard.

use serde::{Deserialize, Serialize};

use crate::models::{Department, Patient};

use super::escape_csv;

/// Printable overview of the active ward census.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardOverview {
    /// Export timestamp
    pub generated_at: String,
    /// One row per active patient, in ward round order
    pub rows: Vec<OverviewRow>,
}

/// Single patient row on the overview sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverviewRow {
    pub patient_id: String,
    /// Ward code (e.g. "MW")
    pub department: String,
    pub bed: String,
    pub name: String,
    pub mrn: String,
    pub age: String,
    pub sex: String,
    pub diagnosis: String,
    pub status: String,
    /// Date of admission, `YYYY-MM-DD`
    pub doa: String,
    pub tasks: String,
}

impl OverviewRow {
    fn from_patient(patient: &Patient) -> Self {
        Self {
            patient_id: patient.id.clone(),
            department: patient.department.code().to_string(),
            bed: patient.bed.clone(),
            name: patient.name.clone(),
            mrn: patient.mrn.clone(),
            age: patient.age.clone(),
            sex: patient.sex.code().to_string(),
            diagnosis: patient.diagnosis.clone(),
            status: patient.status.as_str().to_string(),
            doa: patient.doa.format("%Y-%m-%d").to_string(),
            tasks: patient.tasks.clone(),
        }
    }
}

impl WardOverview {
    /// Build the overview, ordered by department priority then bed number.
    pub fn from_patients(patients: &[Patient]) -> Self {
        let mut sorted: Vec<&Patient> = patients.iter().filter(|p| !p.is_deleted()).collect();
        sorted.sort_by(|a, b| {
            a.department
                .cmp(&b.department)
                .then_with(|| a.bed_number().cmp(&b.bed_number()))
                .then_with(|| a.bed.cmp(&b.bed))
        });

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            rows: sorted.into_iter().map(OverviewRow::from_patient).collect(),
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("department,bed,name,mrn,age,sex,diagnosis,status,doa,tasks\n");

        for row in &self.rows {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{}\n",
                row.department,
                escape_csv(&row.bed),
                escape_csv(&row.name),
                escape_csv(&row.mrn),
                escape_csv(&row.age),
                row.sex,
                escape_csv(&row.diagnosis),
                row.status,
                row.doa,
                escape_csv(&row.tasks),
            ));
        }

        csv
    }
}

/// Active patients admitted to one department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentGroup {
    pub department: Department,
    /// Ward code
    pub code: String,
    /// Human readable ward name
    pub label: String,
    /// Patients ordered by bed number
    pub patients: Vec<Patient>,
}

/// Group active patients by department in display priority order.
///
/// Every department is present, including empty ones.
pub fn group_by_department(patients: Vec<Patient>) -> Vec<DepartmentGroup> {
    let mut groups: Vec<DepartmentGroup> = Department::ALL
        .iter()
        .map(|d| DepartmentGroup {
            department: *d,
            code: d.code().to_string(),
            label: d.label().to_string(),
            patients: Vec::new(),
        })
        .collect();

    for patient in patients.into_iter().filter(|p| !p.is_deleted()) {
        if let Some(group) = groups.iter_mut().find(|g| g.department == patient.department) {
            group.patients.push(patient);
        }
    }

    for group in &mut groups {
        group.patients.sort_by_key(|p| p.bed_number());
    }

    groups
}
