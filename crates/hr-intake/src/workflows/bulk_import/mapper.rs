use super::mapping::{resolve_header, FieldKind, FieldTarget};
use super::normalizer::{
    normalize_bool, normalize_date, normalize_list, normalize_phone, normalize_restriction_codes,
    normalize_year, normalize_zip,
};
use super::tokenizer::ImportRow;
use crate::workflows::endorsement::domain::{ApplicantDraft, JobPost, RestrictionCode};
use chrono::NaiveDate;

/// Coerced cell value, shaped by the target's `FieldKind`.
enum CellValue {
    Text(String),
    Date(NaiveDate),
    Flag(bool),
    List(Vec<String>),
    Codes(Vec<RestrictionCode>),
}

/// Map one CSV row onto a copy of `baseline`.
///
/// Unknown columns, empty cells and values that fail coercion leave the baseline
/// untouched. Department, position and depot always come from `job_post`.
pub fn map_row(
    row: &ImportRow,
    baseline: &ApplicantDraft,
    job_post: Option<&JobPost>,
) -> ApplicantDraft {
    let mut draft = baseline.clone();

    for (header, raw) in row.cells() {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let Some(target) = resolve_header(header) else {
            continue;
        };
        if let Some(value) = coerce(target.kind(), raw) {
            apply(&mut draft, target, value);
        }
    }

    if let Some(job_post) = job_post {
        job_post.apply_to(&mut draft);
    }

    if !draft.contact_number.is_empty() {
        draft.contact_number = normalize_phone(&draft.contact_number);
    }

    draft
}

fn coerce(kind: FieldKind, raw: &str) -> Option<CellValue> {
    let value = match kind {
        FieldKind::Text => CellValue::Text(raw.to_string()),
        FieldKind::Date => CellValue::Date(normalize_date(raw)?),
        FieldKind::Phone => CellValue::Text(normalize_phone(raw)),
        FieldKind::Year => CellValue::Text(normalize_year(raw)),
        FieldKind::Zip => CellValue::Text(normalize_zip(raw)),
        FieldKind::Boolean => CellValue::Flag(normalize_bool(raw)),
        FieldKind::List => CellValue::List(normalize_list(raw)),
        FieldKind::RestrictionCodes => CellValue::Codes(normalize_restriction_codes(raw)),
        FieldKind::JobPost => return None,
    };

    match &value {
        CellValue::Text(text) if text.is_empty() => None,
        CellValue::List(items) if items.is_empty() => None,
        CellValue::Codes(codes) if codes.is_empty() => None,
        _ => Some(value),
    }
}

fn apply(draft: &mut ApplicantDraft, target: FieldTarget, value: CellValue) {
    match value {
        CellValue::Text(text) => {
            if let Some(slot) = text_field(draft, target) {
                *slot = text;
            }
        }
        CellValue::Date(date) => {
            let slot = match target {
                FieldTarget::Birthday => &mut draft.birthday,
                FieldTarget::AvailableStartDate => &mut draft.available_start_date,
                FieldTarget::LicenseExpiry => &mut draft.driver.license_expiry,
                FieldTarget::MedicalTestDate => &mut draft.medical.medical_test_date,
                _ => return,
            };
            *slot = Some(date);
        }
        CellValue::Flag(flag) => {
            let slot = match target {
                FieldTarget::HasSss => &mut draft.government_ids.has_sss,
                FieldTarget::HasPagibig => &mut draft.government_ids.has_pagibig,
                FieldTarget::HasTin => &mut draft.government_ids.has_tin,
                FieldTarget::HasPhilhealth => &mut draft.government_ids.has_philhealth,
                FieldTarget::TakingMedications => &mut draft.medical.taking_medications,
                FieldTarget::TookMedicalTest => &mut draft.medical.took_medical_test,
                _ => return,
            };
            *slot = flag;
        }
        CellValue::List(items) => {
            let slot = match target {
                FieldTarget::Skills => &mut draft.skills,
                FieldTarget::VehiclesDriven => &mut draft.driver.vehicles_driven,
                FieldTarget::TroubleshootingTasks => &mut draft.driver.troubleshooting_tasks,
                _ => return,
            };
            *slot = items;
        }
        CellValue::Codes(codes) => draft.driver.restriction_codes = codes,
    }
}

fn text_field(draft: &mut ApplicantDraft, target: FieldTarget) -> Option<&mut String> {
    let field = match target {
        FieldTarget::FirstName => &mut draft.first_name,
        FieldTarget::MiddleName => &mut draft.middle_name,
        FieldTarget::LastName => &mut draft.last_name,
        FieldTarget::Email => &mut draft.email,
        FieldTarget::ContactNumber => &mut draft.contact_number,
        FieldTarget::CurrentlyEmployed => &mut draft.currently_employed,
        FieldTarget::MaritalStatus => &mut draft.marital_status,
        FieldTarget::Sex => &mut draft.sex,
        FieldTarget::UnitHouseNumber => &mut draft.address.unit_house_number,
        FieldTarget::Street => &mut draft.address.street,
        FieldTarget::Barangay => &mut draft.address.barangay,
        FieldTarget::City => &mut draft.address.city,
        FieldTarget::Province => &mut draft.address.province,
        FieldTarget::Zip => &mut draft.address.zip,
        FieldTarget::EducationLevel => &mut draft.education.level,
        FieldTarget::TertiarySchool => &mut draft.education.tertiary_school,
        FieldTarget::TertiaryProgram => &mut draft.education.tertiary_program,
        FieldTarget::TertiaryYear => &mut draft.education.tertiary_year,
        FieldTarget::SpecializedTraining => &mut draft.specialized_training.name,
        FieldTarget::SpecializedYear => &mut draft.specialized_training.year,
        FieldTarget::LicenseClassification => &mut draft.driver.license_classification,
        FieldTarget::YearsDriving => &mut draft.driver.years_driving,
        FieldTarget::TruckKnowledge => &mut draft.driver.truck_knowledge,
        FieldTarget::MedicationReason => &mut draft.medical.medication_reason,
        _ => return None,
    };
    Some(field)
}
