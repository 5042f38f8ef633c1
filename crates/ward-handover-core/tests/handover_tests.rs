//! Handover task integration tests.

use chrono::NaiveDate;
use ward_handover_core::db::Database;
use ward_handover_core::handover::{HandoverError, HandoverTasks};
use ward_handover_core::lifecycle::PatientLifecycle;
use ward_handover_core::models::{
    ClinicalStatus, Department, HandoverStatus, HandoverUpdate, NewPatient, Sex,
};

fn setup() -> (Database, String) {
    let db = Database::open_in_memory().unwrap();
    let patient = PatientLifecycle::new(&db)
        .create(NewPatient {
            name: "Rosa".to_string(),
            mrn: "H1".to_string(),
            age: "72".to_string(),
            sex: Sex::Female,
            department: Department::Surgical,
            bed: "21".to_string(),
            diagnosis: "Hip fracture".to_string(),
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

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn test_sequential_sets_converge_on_one_row() {
    let (db, patient_id) = setup();
    let handovers = HandoverTasks::new(&db);

    handovers.set_for_date(&patient_id, date("2024-01-01"), "task A", "next").unwrap();
    handovers.set_for_date(&patient_id, date("2024-01-01"), "task B", "next").unwrap();

    let rows = handovers.list_for_patient(&patient_id, Some(date("2024-01-01"))).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].tasks, "task B");
}

#[test]
fn test_list_filters_by_date_newest_first() {
    let (db, patient_id) = setup();
    let handovers = HandoverTasks::new(&db);

    let d1 = handovers.set_for_date(&patient_id, date("2024-01-01"), "day one", "next").unwrap();
    let d2 = handovers.set_for_date(&patient_id, date("2024-01-02"), "day two", "next").unwrap();

    let all = handovers.list_for_patient(&patient_id, None).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, d2.id);
    assert_eq!(all[1].id, d1.id);

    let only = handovers.list_for_patient(&patient_id, Some(date("2024-01-02"))).unwrap();
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].tasks, "day two");

    assert!(handovers
        .list_for_patient(&patient_id, Some(date("2024-01-03")))
        .unwrap()
        .is_empty());
}

#[test]
fn test_update_is_partial() {
    let (db, patient_id) = setup();
    let handovers = HandoverTasks::new(&db);
    let created = handovers.set_for_date(&patient_id, date("2024-01-01"), "Review x-ray", "night").unwrap();

    let updated = handovers
        .update(
            &created.id,
            HandoverUpdate {
                status: Some(HandoverStatus::Completed),
                tasks: None,
            },
        )
        .unwrap();

    assert_eq!(updated.tasks, "Review x-ray");
    assert_eq!(updated.status, HandoverStatus::Completed);
    assert_eq!(updated.assigned_shift, "night");
    assert_eq!(db.get_handover(&created.id).unwrap().unwrap(), updated);
}

#[test]
fn test_delete_then_set_creates_fresh_row() {
    let (db, patient_id) = setup();
    let handovers = HandoverTasks::new(&db);
    let first = handovers.set_for_date(&patient_id, date("2024-01-01"), "a", "next").unwrap();

    handovers.delete(&first.id).unwrap();
    assert!(matches!(handovers.delete(&first.id), Err(HandoverError::NotFound(_))));

    let second = handovers.set_for_date(&patient_id, date("2024-01-01"), "b", "day").unwrap();
    assert_ne!(second.id, first.id);
    assert_eq!(second.status, HandoverStatus::Pending);
    assert_eq!(second.assigned_shift, "day");
}
