//! Property tests for partial updates and the retention boundary.

use chrono::{Duration, NaiveDate, Utc};
use proptest::prelude::*;
use ward_handover_core::db::Database;
use ward_handover_core::lifecycle::PatientLifecycle;
use ward_handover_core::models::{ClinicalStatus, Department, NewPatient, PatientUpdate, Sex};

fn admit(mrn: &str) -> NewPatient {
    NewPatient {
        name: "Property Patient".to_string(),
        mrn: mrn.to_string(),
        age: "45".to_string(),
        sex: Sex::Other,
        department: Department::Emergency,
        bed: "2".to_string(),
        diagnosis: "Abdominal pain".to_string(),
        doa: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        status: ClinicalStatus::Stable,
        medications: "Nil".to_string(),
        hpi: "Two days of RUQ pain".to_string(),
        tasks: "USS abdomen".to_string(),
        notes: "NBM".to_string(),
    }
}

proptest! {
    #[test]
    fn prop_update_preserves_unsupplied_fields(
        name in proptest::option::of("[A-Za-z ]{1,20}"),
        bed in proptest::option::of("[A-Z]?[0-9]{1,3}"),
        notes in proptest::option::of("[ -~]{0,40}"),
    ) {
        let db = Database::open_in_memory().unwrap();
        let lifecycle = PatientLifecycle::new(&db);
        let before = lifecycle.create(admit("P1")).unwrap();

        let after = lifecycle
            .update(
                &before.id,
                PatientUpdate {
                    name: name.clone(),
                    bed: bed.clone(),
                    notes: notes.clone(),
                    ..Default::default()
                },
            )
            .unwrap();

        prop_assert_eq!(&after.name, name.as_ref().unwrap_or(&before.name));
        prop_assert_eq!(&after.bed, bed.as_ref().unwrap_or(&before.bed));
        prop_assert_eq!(&after.notes, notes.as_ref().unwrap_or(&before.notes));

        prop_assert_eq!(&after.mrn, &before.mrn);
        prop_assert_eq!(&after.age, &before.age);
        prop_assert_eq!(&after.diagnosis, &before.diagnosis);
        prop_assert_eq!(&after.medications, &before.medications);
        prop_assert_eq!(&after.hpi, &before.hpi);
        prop_assert_eq!(&after.tasks, &before.tasks);
        prop_assert_eq!(after.doa, before.doa);
        prop_assert_eq!(after.status, before.status);
        prop_assert_eq!(after.created_at, before.created_at);
        prop_assert!(after.updated_at >= before.updated_at);

        prop_assert_eq!(lifecycle.get(&before.id).unwrap(), after);
    }

    #[test]
    fn prop_sweep_purges_strictly_older_than_retention(
        age_secs in 0i64..(14 * 24 * 3600),
        retention_days in 1i64..10,
    ) {
        let db = Database::open_in_memory().unwrap();
        let lifecycle = PatientLifecycle::new(&db);
        let now = Utc::now();
        let retention = Duration::days(retention_days);

        let patient = lifecycle.create(admit("P2")).unwrap();
        db.archive_patient(&patient.id, now - Duration::seconds(age_secs)).unwrap();

        let report = lifecycle.sweep_expired(now, retention).unwrap();
        let expired = Duration::seconds(age_secs) > retention;

        prop_assert_eq!(report.purged.len(), usize::from(expired));
        prop_assert_eq!(db.get_patient(&patient.id).unwrap().is_none(), expired);
    }
}
