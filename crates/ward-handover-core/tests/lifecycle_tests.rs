//! Patient lifecycle integration tests.

use chrono::{Duration, NaiveDate, Utc};
use ward_handover_core::db::Database;
use ward_handover_core::handover::HandoverTasks;
use ward_handover_core::lifecycle::{LifecycleError, PatientLifecycle};
use ward_handover_core::models::{ClinicalStatus, Department, NewPatient, Sex};
use ward_handover_core::progress::ProgressLog;

fn admit(mrn: &str) -> NewPatient {
    NewPatient {
        name: format!("Patient {}", mrn),
        mrn: mrn.to_string(),
        age: "67".to_string(),
        sex: Sex::Male,
        department: Department::Medical,
        bed: "4".to_string(),
        diagnosis: "COPD exacerbation".to_string(),
        doa: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        status: ClinicalStatus::Monitoring,
        medications: "Salbutamol nebs 4 hourly".to_string(),
        hpi: String::new(),
        tasks: String::new(),
        notes: String::new(),
    }
}

fn ids(patients: &[ward_handover_core::Patient]) -> Vec<String> {
    patients.iter().map(|p| p.id.clone()).collect()
}

#[test]
fn test_archive_restore_archive_sweep_recreate() {
    let db = Database::open_in_memory().unwrap();
    let lifecycle = PatientLifecycle::new(&db);

    let patient = lifecycle.create(admit("M100")).unwrap();
    assert!(!patient.is_deleted());

    lifecycle.soft_delete(&patient.id).unwrap();
    assert!(ids(&lifecycle.list_archived().unwrap()).contains(&patient.id));
    assert!(!ids(&lifecycle.list_active().unwrap()).contains(&patient.id));

    let restored = lifecycle.restore(&patient.id).unwrap();
    assert!(!restored.is_deleted());
    assert_eq!(restored.deleted_at, None);
    assert!(ids(&lifecycle.list_active().unwrap()).contains(&patient.id));
    assert!(!ids(&lifecycle.list_archived().unwrap()).contains(&patient.id));

    lifecycle.soft_delete(&patient.id).unwrap();

    // Any retention shorter than the time since archiving
    let report = lifecycle
        .sweep_expired(Utc::now() + Duration::seconds(1), Duration::zero())
        .unwrap();
    assert_eq!(report.purged, vec![patient.id.clone()]);

    assert!(matches!(
        lifecycle.get(&patient.id),
        Err(LifecycleError::NotFound(_))
    ));
    let recreated = lifecycle.create(admit("M100")).unwrap();
    assert_ne!(recreated.id, patient.id);
}

#[test]
fn test_mrn_reserved_while_archived() {
    let db = Database::open_in_memory().unwrap();
    let lifecycle = PatientLifecycle::new(&db);

    let patient = lifecycle.create(admit("M200")).unwrap();
    assert!(matches!(
        lifecycle.create(admit("M200")),
        Err(LifecycleError::Conflict(_))
    ));

    lifecycle.soft_delete(&patient.id).unwrap();
    assert!(matches!(
        lifecycle.create(admit("M200")),
        Err(LifecycleError::Conflict(_))
    ));

    assert!(lifecycle.purge(&patient.id).unwrap());
    assert!(lifecycle.create(admit("M200")).is_ok());
}

#[test]
fn test_restore_and_soft_delete_bump_updated_at() {
    let db = Database::open_in_memory().unwrap();
    let lifecycle = PatientLifecycle::new(&db);
    let patient = lifecycle.create(admit("M300")).unwrap();

    let archived = lifecycle.soft_delete(&patient.id).unwrap();
    assert!(archived.updated_at >= patient.updated_at);
    assert!(archived.deleted_at.unwrap() >= patient.created_at);

    let restored = lifecycle.restore(&patient.id).unwrap();
    assert!(restored.updated_at >= archived.updated_at);
    assert_eq!(restored.created_at, patient.created_at);
}

#[test]
fn test_purge_cascades_only_to_own_children() {
    let db = Database::open_in_memory().unwrap();
    let lifecycle = PatientLifecycle::new(&db);
    let handovers = HandoverTasks::new(&db);
    let progress = ProgressLog::new(&db);
    let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

    let doomed = lifecycle.create(admit("M400")).unwrap();
    let other = lifecycle.create(admit("M401")).unwrap();
    for patient in [&doomed, &other] {
        handovers.set_for_date(&patient.id, day, "Chase bloods", "next").unwrap();
        progress.add(&patient.id, "2024-01-02", "Settled overnight").unwrap();
    }

    lifecycle.soft_delete(&doomed.id).unwrap();
    assert!(lifecycle.purge(&doomed.id).unwrap());

    assert!(handovers.list_for_patient(&doomed.id, None).unwrap().is_empty());
    assert!(progress.list(&doomed.id).unwrap().is_empty());
    assert_eq!(handovers.list_for_patient(&other.id, None).unwrap().len(), 1);
    assert_eq!(progress.list(&other.id).unwrap().len(), 1);
}

#[test]
fn test_sweep_purges_children_of_expired_patients() {
    let db = Database::open_in_memory().unwrap();
    let lifecycle = PatientLifecycle::new(&db);
    let now = Utc::now();

    let patient = lifecycle.create(admit("M500")).unwrap();
    ProgressLog::new(&db).add(&patient.id, "2024-01-01", "Admitted").unwrap();
    db.archive_patient(&patient.id, now - Duration::days(10)).unwrap();

    let report = lifecycle.sweep_expired(now, Duration::days(7)).unwrap();
    assert_eq!(report.purged.len(), 1);
    assert!(ProgressLog::new(&db).list(&patient.id).unwrap().is_empty());
}

#[test]
fn test_sweep_is_idempotent() {
    let db = Database::open_in_memory().unwrap();
    let lifecycle = PatientLifecycle::new(&db);
    let now = Utc::now();

    let patient = lifecycle.create(admit("M600")).unwrap();
    db.archive_patient(&patient.id, now - Duration::days(9)).unwrap();

    let first = lifecycle.sweep_expired(now, Duration::days(7)).unwrap();
    let second = lifecycle.sweep_expired(now, Duration::days(7)).unwrap();
    assert_eq!(first.purged.len(), 1);
    assert!(second.purged.is_empty());
    assert_eq!(second.skipped, 0);
}

#[test]
fn test_active_list_excludes_archived() {
    let db = Database::open_in_memory().unwrap();
    let lifecycle = PatientLifecycle::new(&db);

    let a = lifecycle.create(admit("M700")).unwrap();
    let b = lifecycle.create(admit("M701")).unwrap();
    lifecycle.soft_delete(&b.id).unwrap();

    assert_eq!(ids(&lifecycle.list_active().unwrap()), vec![a.id]);
    assert_eq!(ids(&lifecycle.list_archived().unwrap()), vec![b.id]);
}

#[test]
fn test_archive_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ward.db");

    let patient_id = {
        let db = Database::open(&path).unwrap();
        let lifecycle = PatientLifecycle::new(&db);
        let patient = lifecycle.create(admit("M800")).unwrap();
        lifecycle.soft_delete(&patient.id).unwrap();
        patient.id
    };

    let db = Database::open(&path).unwrap();
    let patient = PatientLifecycle::new(&db).get(&patient_id).unwrap();
    assert!(patient.is_deleted());
    assert!(patient.deleted_at.is_some());
}
