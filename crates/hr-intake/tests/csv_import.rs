use chrono::NaiveDate;
use hr_intake::config::ImportLimits;
use hr_intake::workflows::bulk_import::{
    map_row, template_csv, BulkImporter, ImportFormatError, TEMPLATE_HEADER,
};
use hr_intake::workflows::endorsement::{
    ApplicantDraft, ApplicantSlots, JobPost, JobPostId, RestrictionCode,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn driver_post() -> JobPost {
    JobPost {
        id: JobPostId("job-42".to_string()),
        title: "Delivery Driver".to_string(),
        department: "Logistics".to_string(),
        depot: "Pasig".to_string(),
        driver_role: true,
    }
}

const FULL_ROW: &str = "Ana,Reyes,Santos,Ana.Reyes@Example.com,9171234567,46000,No,04/12/1995,Single,Female,12,Rizal Ave,Malinta,Valenzuela,Metro Manila,1440,College,PUP,BS Accountancy,2016,Inventory|Forklift,Forklift NC II,2019,yes,1,no,checked,Professional,2028-01-31,B2;c - heavy,8,Basic,\"Closed van, Wing van\",Tire change|Battery jump,no,,yes,13/01/2026";

#[test]
fn template_row_round_trips_through_the_mapper() {
    let csv = format!("{}{FULL_ROW}\n", template_csv());
    let table = BulkImporter::default()
        .load_bytes("applicants.csv", csv.as_bytes())
        .expect("template parses");
    assert_eq!(table.headers.len(), TEMPLATE_HEADER.split(',').count());
    assert_eq!(table.rows.len(), 1);

    let draft = map_row(&table.rows[0], &ApplicantDraft::default(), Some(&driver_post()));

    assert_eq!(draft.first_name, "Ana");
    assert_eq!(draft.middle_name, "Santos");
    assert_eq!(draft.last_name, "Reyes");
    assert_eq!(draft.email, "Ana.Reyes@Example.com");
    assert_eq!(draft.contact_number, "09171234567");
    assert_eq!(draft.available_start_date, Some(date(2025, 12, 9)));
    assert_eq!(draft.currently_employed, "No");
    // Both parts are twelve or below, so this is read month-first. The source sheet
    // may well have meant 4 December; the tie-break is a known ambiguity.
    assert_eq!(draft.birthday, Some(date(1995, 4, 12)));
    assert_eq!(draft.marital_status, "Single");
    assert_eq!(draft.sex, "Female");
    assert_eq!(draft.address.unit_house_number, "12");
    assert_eq!(draft.address.street, "Rizal Ave");
    assert_eq!(draft.address.barangay, "Malinta");
    assert_eq!(draft.address.city, "Valenzuela");
    assert_eq!(draft.address.province, "Metro Manila");
    assert_eq!(draft.address.zip, "1440");
    assert_eq!(draft.education.level, "College");
    assert_eq!(draft.education.tertiary_school, "PUP");
    assert_eq!(draft.education.tertiary_program, "BS Accountancy");
    assert_eq!(draft.education.tertiary_year, "2016");
    assert_eq!(draft.skills, vec!["Inventory", "Forklift"]);
    assert_eq!(draft.specialized_training.name, "Forklift NC II");
    assert_eq!(draft.specialized_training.year, "2019");
    assert!(draft.government_ids.has_sss);
    assert!(draft.government_ids.has_pagibig);
    assert!(!draft.government_ids.has_tin);
    assert!(draft.government_ids.has_philhealth);
    assert_eq!(draft.driver.license_classification, "Professional");
    assert_eq!(draft.driver.license_expiry, Some(date(2028, 1, 31)));
    assert_eq!(
        draft.driver.restriction_codes,
        vec![RestrictionCode::B2, RestrictionCode::C]
    );
    assert_eq!(draft.driver.years_driving, "8");
    assert_eq!(draft.driver.truck_knowledge, "Basic");
    assert_eq!(draft.driver.vehicles_driven, vec!["Closed van", "Wing van"]);
    assert_eq!(
        draft.driver.troubleshooting_tasks,
        vec!["Tire change", "Battery jump"]
    );
    assert!(!draft.medical.taking_medications);
    assert_eq!(draft.medical.medication_reason, "");
    assert!(draft.medical.took_medical_test);
    assert_eq!(draft.medical.medical_test_date, Some(date(2026, 1, 13)));

    assert_eq!(draft.position, "Delivery Driver");
    assert_eq!(draft.department, "Logistics");
    assert_eq!(draft.depot, "Pasig");
}

#[test]
fn ambiguous_dates_resolve_month_first() {
    let csv = "birthday,available_start_date,license_expiry\n01/02/2026,13/01/2026,01/13/2026\n";
    let table = BulkImporter::default()
        .load_bytes("dates.csv", csv.as_bytes())
        .expect("parses");
    let draft = map_row(&table.rows[0], &ApplicantDraft::default(), None);

    assert_eq!(draft.birthday, Some(date(2026, 1, 2)));
    assert_eq!(draft.available_start_date, Some(date(2026, 1, 13)));
    assert_eq!(draft.driver.license_expiry, Some(date(2026, 1, 13)));
}

#[test]
fn import_limits_are_checked_before_mapping() {
    let importer = BulkImporter::new(ImportLimits {
        max_bytes: 1024,
        max_rows: 2,
    });
    let csv = "firstname\nAna\nBen\nCara\n";
    let error = importer
        .load_bytes("three.csv", csv.as_bytes())
        .expect_err("too many rows");
    assert_eq!(
        error.to_string(),
        "file contains 3 applicant rows; at most 2 can be imported at once"
    );
    assert!(matches!(
        importer.load_bytes("empty.csv", b"firstname\n"),
        Err(ImportFormatError::MissingData)
    ));
}

#[test]
fn import_into_a_fresh_session_fills_the_placeholder_slot_first() {
    let csv = format!("{}{FULL_ROW}\n{FULL_ROW}\n{FULL_ROW}\n", template_csv());
    let table = BulkImporter::default()
        .load_bytes("three.csv", csv.as_bytes())
        .expect("parses");

    let mut slots = ApplicantSlots::new(Some(driver_post()));
    let touched = slots.import_rows(&table.rows);

    assert_eq!(touched, vec![1, 2, 3]);
    assert_eq!(slots.slots().len(), 3);
    assert!(slots.slots().iter().all(|slot| slot.name == "Ana Reyes"));
}
