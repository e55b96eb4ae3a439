use super::normalizer::{canonical_key, header_key};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Applicant field a CSV column can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTarget {
    FirstName,
    MiddleName,
    LastName,
    Email,
    ContactNumber,
    AvailableStartDate,
    CurrentlyEmployed,
    Birthday,
    MaritalStatus,
    Sex,
    UnitHouseNumber,
    Street,
    Barangay,
    City,
    Province,
    Zip,
    EducationLevel,
    TertiarySchool,
    TertiaryProgram,
    TertiaryYear,
    Skills,
    SpecializedTraining,
    SpecializedYear,
    HasSss,
    HasPagibig,
    HasTin,
    HasPhilhealth,
    LicenseClassification,
    LicenseExpiry,
    RestrictionCodes,
    YearsDriving,
    TruckKnowledge,
    VehiclesDriven,
    TroubleshootingTasks,
    TakingMedications,
    MedicationReason,
    TookMedicalTest,
    MedicalTestDate,
    Department,
    Position,
    Depot,
}

/// Coercion applied to a raw cell before it lands on the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    Phone,
    Year,
    Zip,
    Boolean,
    List,
    RestrictionCodes,
    /// Recognized so it is not misrouted by heuristics, but always taken from the job post.
    JobPost,
}

impl FieldTarget {
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Birthday | Self::AvailableStartDate | Self::LicenseExpiry => FieldKind::Date,
            Self::MedicalTestDate => FieldKind::Date,
            Self::ContactNumber => FieldKind::Phone,
            Self::TertiaryYear | Self::SpecializedYear | Self::YearsDriving => FieldKind::Year,
            Self::Zip => FieldKind::Zip,
            Self::HasSss
            | Self::HasPagibig
            | Self::HasTin
            | Self::HasPhilhealth
            | Self::TakingMedications
            | Self::TookMedicalTest => FieldKind::Boolean,
            Self::Skills | Self::VehiclesDriven | Self::TroubleshootingTasks => FieldKind::List,
            Self::RestrictionCodes => FieldKind::RestrictionCodes,
            Self::Department | Self::Position | Self::Depot => FieldKind::JobPost,
            _ => FieldKind::Text,
        }
    }
}

const HEADER_VARIANTS: &[(&str, FieldTarget)] = &[
    ("firstname", FieldTarget::FirstName),
    ("first name", FieldTarget::FirstName),
    ("first_name", FieldTarget::FirstName),
    ("given name", FieldTarget::FirstName),
    ("middlename", FieldTarget::MiddleName),
    ("middle name", FieldTarget::MiddleName),
    ("middle_name", FieldTarget::MiddleName),
    ("lastname", FieldTarget::LastName),
    ("last name", FieldTarget::LastName),
    ("last_name", FieldTarget::LastName),
    ("surname", FieldTarget::LastName),
    ("family name", FieldTarget::LastName),
    ("email", FieldTarget::Email),
    ("email address", FieldTarget::Email),
    ("e-mail", FieldTarget::Email),
    ("contact", FieldTarget::ContactNumber),
    ("contact number", FieldTarget::ContactNumber),
    ("contact_number", FieldTarget::ContactNumber),
    ("contact no", FieldTarget::ContactNumber),
    ("contact no.", FieldTarget::ContactNumber),
    ("mobile", FieldTarget::ContactNumber),
    ("mobile number", FieldTarget::ContactNumber),
    ("phone", FieldTarget::ContactNumber),
    ("phone number", FieldTarget::ContactNumber),
    ("cellphone", FieldTarget::ContactNumber),
    ("available_start_date", FieldTarget::AvailableStartDate),
    ("available start date", FieldTarget::AvailableStartDate),
    ("start date", FieldTarget::AvailableStartDate),
    ("availability", FieldTarget::AvailableStartDate),
    ("employed", FieldTarget::CurrentlyEmployed),
    ("currently employed", FieldTarget::CurrentlyEmployed),
    ("employment status", FieldTarget::CurrentlyEmployed),
    ("birthday", FieldTarget::Birthday),
    ("birthdate", FieldTarget::Birthday),
    ("birth date", FieldTarget::Birthday),
    ("date of birth", FieldTarget::Birthday),
    ("dob", FieldTarget::Birthday),
    ("marital_status", FieldTarget::MaritalStatus),
    ("marital status", FieldTarget::MaritalStatus),
    ("civil status", FieldTarget::MaritalStatus),
    ("sex", FieldTarget::Sex),
    ("gender", FieldTarget::Sex),
    ("unit_house_number", FieldTarget::UnitHouseNumber),
    ("unit/house number", FieldTarget::UnitHouseNumber),
    ("house number", FieldTarget::UnitHouseNumber),
    ("unit", FieldTarget::UnitHouseNumber),
    ("street", FieldTarget::Street),
    ("barangay", FieldTarget::Barangay),
    ("brgy", FieldTarget::Barangay),
    ("city", FieldTarget::City),
    ("city/municipality", FieldTarget::City),
    ("municipality", FieldTarget::City),
    ("province", FieldTarget::Province),
    ("zip", FieldTarget::Zip),
    ("zip code", FieldTarget::Zip),
    ("zipcode", FieldTarget::Zip),
    ("postal code", FieldTarget::Zip),
    ("education", FieldTarget::EducationLevel),
    ("education level", FieldTarget::EducationLevel),
    ("educational attainment", FieldTarget::EducationLevel),
    ("highest education", FieldTarget::EducationLevel),
    ("tertiary_school", FieldTarget::TertiarySchool),
    ("school", FieldTarget::TertiarySchool),
    ("college", FieldTarget::TertiarySchool),
    ("university", FieldTarget::TertiarySchool),
    ("tertiary_program", FieldTarget::TertiaryProgram),
    ("program", FieldTarget::TertiaryProgram),
    ("course", FieldTarget::TertiaryProgram),
    ("degree", FieldTarget::TertiaryProgram),
    ("tertiary_year", FieldTarget::TertiaryYear),
    ("year graduated", FieldTarget::TertiaryYear),
    ("graduation year", FieldTarget::TertiaryYear),
    ("year completed", FieldTarget::TertiaryYear),
    ("skills", FieldTarget::Skills),
    ("specialized_training", FieldTarget::SpecializedTraining),
    ("specialized training", FieldTarget::SpecializedTraining),
    ("training", FieldTarget::SpecializedTraining),
    ("specialized_year", FieldTarget::SpecializedYear),
    ("specialized training year", FieldTarget::SpecializedYear),
    ("has_sss", FieldTarget::HasSss),
    ("sss", FieldTarget::HasSss),
    ("has_pagibig", FieldTarget::HasPagibig),
    ("pag-ibig", FieldTarget::HasPagibig),
    ("pagibig", FieldTarget::HasPagibig),
    ("has_tin", FieldTarget::HasTin),
    ("tin", FieldTarget::HasTin),
    ("has_philhealth", FieldTarget::HasPhilhealth),
    ("philhealth", FieldTarget::HasPhilhealth),
    ("license_classification", FieldTarget::LicenseClassification),
    ("license classification", FieldTarget::LicenseClassification),
    ("license type", FieldTarget::LicenseClassification),
    ("license_expiry", FieldTarget::LicenseExpiry),
    ("license expiry", FieldTarget::LicenseExpiry),
    ("license expiration", FieldTarget::LicenseExpiry),
    ("restriction_codes", FieldTarget::RestrictionCodes),
    ("restriction codes", FieldTarget::RestrictionCodes),
    ("restrictions", FieldTarget::RestrictionCodes),
    ("years_driving", FieldTarget::YearsDriving),
    ("years driving", FieldTarget::YearsDriving),
    ("driving experience", FieldTarget::YearsDriving),
    ("truck_knowledge", FieldTarget::TruckKnowledge),
    ("truck knowledge", FieldTarget::TruckKnowledge),
    ("vehicles_driven", FieldTarget::VehiclesDriven),
    ("vehicles driven", FieldTarget::VehiclesDriven),
    ("troubleshooting_tasks", FieldTarget::TroubleshootingTasks),
    ("troubleshooting tasks", FieldTarget::TroubleshootingTasks),
    ("troubleshooting", FieldTarget::TroubleshootingTasks),
    ("taking_medications", FieldTarget::TakingMedications),
    ("taking medications", FieldTarget::TakingMedications),
    ("medication_reason", FieldTarget::MedicationReason),
    ("medication reason", FieldTarget::MedicationReason),
    ("took_medical_test", FieldTarget::TookMedicalTest),
    ("took medical test", FieldTarget::TookMedicalTest),
    ("medical_test_date", FieldTarget::MedicalTestDate),
    ("medical test date", FieldTarget::MedicalTestDate),
    ("department", FieldTarget::Department),
    ("position", FieldTarget::Position),
    ("job title", FieldTarget::Position),
    ("depot", FieldTarget::Depot),
];

/// Ordered substring rules over the canonical key; the first rule whose needles all
/// appear wins. More specific rules precede the general ones they would shadow.
const HEURISTICS: &[(&[&str], FieldTarget)] = &[
    (&["specialized", "year"], FieldTarget::SpecializedYear),
    (&["training", "year"], FieldTarget::SpecializedYear),
    (&["specialized"], FieldTarget::SpecializedTraining),
    (&["restriction"], FieldTarget::RestrictionCodes),
    (&["license", "expir"], FieldTarget::LicenseExpiry),
    (&["license", "valid"], FieldTarget::LicenseExpiry),
    (&["license", "class"], FieldTarget::LicenseClassification),
    (&["year", "driving"], FieldTarget::YearsDriving),
    (&["driving", "experience"], FieldTarget::YearsDriving),
    (&["vehicle"], FieldTarget::VehiclesDriven),
    (&["troubleshoot"], FieldTarget::TroubleshootingTasks),
    (&["truck"], FieldTarget::TruckKnowledge),
    (&["medication", "reason"], FieldTarget::MedicationReason),
    (&["medication"], FieldTarget::TakingMedications),
    (&["medical", "date"], FieldTarget::MedicalTestDate),
    (&["medical"], FieldTarget::TookMedicalTest),
    (&["birth"], FieldTarget::Birthday),
    (&["graduat"], FieldTarget::TertiaryYear),
    (&["year", "complet"], FieldTarget::TertiaryYear),
    (&["school"], FieldTarget::TertiarySchool),
    (&["course"], FieldTarget::TertiaryProgram),
    (&["program"], FieldTarget::TertiaryProgram),
    (&["education"], FieldTarget::EducationLevel),
    (&["email"], FieldTarget::Email),
    (&["mobile"], FieldTarget::ContactNumber),
    (&["phone"], FieldTarget::ContactNumber),
    (&["contact"], FieldTarget::ContactNumber),
    (&["zip"], FieldTarget::Zip),
    (&["postal"], FieldTarget::Zip),
    (&["first", "name"], FieldTarget::FirstName),
    (&["middle"], FieldTarget::MiddleName),
    (&["last", "name"], FieldTarget::LastName),
    (&["start", "date"], FieldTarget::AvailableStartDate),
    (&["avail"], FieldTarget::AvailableStartDate),
    (&["marital"], FieldTarget::MaritalStatus),
    (&["civil"], FieldTarget::MaritalStatus),
    (&["barangay"], FieldTarget::Barangay),
    (&["street"], FieldTarget::Street),
    (&["province"], FieldTarget::Province),
    (&["city"], FieldTarget::City),
    (&["sss"], FieldTarget::HasSss),
    (&["pagibig"], FieldTarget::HasPagibig),
    (&["philhealth"], FieldTarget::HasPhilhealth),
    (&["skill"], FieldTarget::Skills),
];

static EXACT_HEADERS: OnceLock<HashMap<String, FieldTarget>> = OnceLock::new();
static CANONICAL_HEADERS: OnceLock<HashMap<String, FieldTarget>> = OnceLock::new();

fn exact_headers() -> &'static HashMap<String, FieldTarget> {
    EXACT_HEADERS.get_or_init(|| {
        let mut map = HashMap::with_capacity(HEADER_VARIANTS.len());
        for (name, target) in HEADER_VARIANTS {
            map.insert(header_key(name), *target);
        }
        map
    })
}

fn canonical_headers() -> &'static HashMap<String, FieldTarget> {
    CANONICAL_HEADERS.get_or_init(|| {
        let mut map = HashMap::with_capacity(HEADER_VARIANTS.len());
        for (name, target) in HEADER_VARIANTS {
            map.entry(canonical_key(name)).or_insert(*target);
        }
        map
    })
}

/// Resolve a raw CSV header: exact variant, then canonical key, then heuristics.
pub fn resolve_header(header: &str) -> Option<FieldTarget> {
    if let Some(target) = exact_headers().get(&header_key(header)) {
        return Some(*target);
    }

    let canonical = canonical_key(header);
    if canonical.is_empty() {
        return None;
    }
    if let Some(target) = canonical_headers().get(&canonical) {
        return Some(*target);
    }

    HEURISTICS
        .iter()
        .find(|(needles, _)| needles.iter().all(|needle| canonical.contains(needle)))
        .map(|(_, target)| *target)
}
