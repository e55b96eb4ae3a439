use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicantDraft, ApplicantSlot};
use super::slots::is_blank;

/// Minimum age accepted on an endorsement.
pub const MINIMUM_AGE: i32 = 15;

/// Wizard pages an endorsement passes through. Driver roles add the license and
/// driving experience pages before the final medical page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Personal,
    Address,
    EducationAndSkills,
    Employment,
    License,
    DrivingExperience,
    MedicalAndIds,
}

const STANDARD_STEPS: [WizardStep; 5] = [
    WizardStep::Personal,
    WizardStep::Address,
    WizardStep::EducationAndSkills,
    WizardStep::Employment,
    WizardStep::MedicalAndIds,
];

const DRIVER_STEPS: [WizardStep; 7] = [
    WizardStep::Personal,
    WizardStep::Address,
    WizardStep::EducationAndSkills,
    WizardStep::Employment,
    WizardStep::License,
    WizardStep::DrivingExperience,
    WizardStep::MedicalAndIds,
];

impl WizardStep {
    pub fn sequence(driver_role: bool) -> &'static [WizardStep] {
        if driver_role {
            &DRIVER_STEPS
        } else {
            &STANDARD_STEPS
        }
    }

    /// One-based step number to step.
    pub fn from_number(number: u8, driver_role: bool) -> Option<Self> {
        let index = usize::from(number).checked_sub(1)?;
        Self::sequence(driver_role).get(index).copied()
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Personal => "Personal information",
            Self::Address => "Address",
            Self::EducationAndSkills => "Education & skills",
            Self::Employment => "Employment",
            Self::License => "Driver's license",
            Self::DrivingExperience => "Driving experience",
            Self::MedicalAndIds => "Medical & government IDs",
        }
    }
}

pub fn step_count(driver_role: bool) -> u8 {
    WizardStep::sequence(driver_role).len() as u8
}

/// Inputs that are not part of the draft itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    pub today: NaiveDate,
    pub driver_role: bool,
}

/// A single human-readable problem with a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    fn required(field: &'static str, label: &str) -> Self {
        Self::new(field, format!("{label} is required"))
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// First slot/step that blocks a batch submission.
#[derive(Debug, Clone, thiserror::Error, Serialize)]
#[error("{slot_name} is incomplete on step {step} ({step_label}): {}", join_messages(.violations))]
pub struct ValidationError {
    pub slot_id: u32,
    pub slot_name: String,
    pub step: u8,
    pub step_label: &'static str,
    pub violations: Vec<Violation>,
}

fn join_messages(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|violation| violation.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate one wizard step of a draft. An empty list means the step is complete.
pub fn validate_step(step: u8, draft: &ApplicantDraft, ctx: &ValidationContext) -> Vec<Violation> {
    let Some(step) = WizardStep::from_number(step, ctx.driver_role) else {
        return vec![Violation::new(
            "step",
            format!("step {step} does not exist for this job post"),
        )];
    };

    let mut violations = Vec::new();
    match step {
        WizardStep::Personal => personal(draft, ctx, &mut violations),
        WizardStep::Address => address(draft, &mut violations),
        WizardStep::EducationAndSkills => education(draft, &mut violations),
        WizardStep::Employment => employment(draft, ctx, &mut violations),
        WizardStep::License => license(draft, ctx, &mut violations),
        WizardStep::DrivingExperience => driving_experience(draft, ctx, &mut violations),
        WizardStep::MedicalAndIds => medical(draft, ctx, &mut violations),
    }
    violations
}

/// Run every step for every non-blank slot, stopping at the first failure.
pub fn validate_for_submission(
    slots: &[ApplicantSlot],
    ctx: &ValidationContext,
) -> Result<(), ValidationError> {
    for slot in slots.iter().filter(|slot| !is_blank(&slot.draft)) {
        for step in 1..=step_count(ctx.driver_role) {
            let violations = validate_step(step, &slot.draft, ctx);
            if !violations.is_empty() {
                let step_label = WizardStep::from_number(step, ctx.driver_role)
                    .map(WizardStep::label)
                    .unwrap_or_default();
                return Err(ValidationError {
                    slot_id: slot.id,
                    slot_name: slot.name.clone(),
                    step,
                    step_label,
                    violations,
                });
            }
        }
    }
    Ok(())
}

fn require(value: &str, field: &'static str, label: &str, out: &mut Vec<Violation>) {
    if value.trim().is_empty() {
        out.push(Violation::required(field, label));
    }
}

fn personal(draft: &ApplicantDraft, ctx: &ValidationContext, out: &mut Vec<Violation>) {
    require(&draft.first_name, "first_name", "First name", out);
    require(&draft.last_name, "last_name", "Last name", out);

    match draft.birthday {
        None => out.push(Violation::required("birthday", "Birthday")),
        Some(birthday) if birthday > ctx.today => {
            out.push(Violation::new("birthday", "Birthday cannot be in the future"))
        }
        Some(birthday) if age_on(birthday, ctx.today) < MINIMUM_AGE => out.push(Violation::new(
            "birthday",
            format!("Applicant must be at least {MINIMUM_AGE} years old"),
        )),
        Some(_) => {}
    }

    require(&draft.sex, "sex", "Sex", out);
    require(&draft.marital_status, "marital_status", "Marital status", out);

    let phone = draft.contact_number.trim();
    if phone.is_empty() {
        out.push(Violation::required("contact_number", "Contact number"));
    } else if !is_mobile_number(phone) {
        out.push(Violation::new(
            "contact_number",
            "Contact number must be 11 digits starting with 09",
        ));
    }

    let email = draft.email.trim();
    if email.is_empty() {
        out.push(Violation::required("email", "Email"));
    } else if !is_email_shaped(email) {
        out.push(Violation::new(
            "email",
            "Email must look like name@domain.tld",
        ));
    }
}

fn address(draft: &ApplicantDraft, out: &mut Vec<Violation>) {
    let address = &draft.address;
    require(&address.street, "address.street", "Street", out);
    require(&address.barangay, "address.barangay", "Barangay", out);
    require(&address.city, "address.city", "City", out);
    require(&address.province, "address.province", "Province", out);

    let zip = address.zip.trim();
    if zip.is_empty() {
        out.push(Violation::required("address.zip", "Zip code"));
    } else if zip.len() != 4 || !zip.chars().all(|ch| ch.is_ascii_digit()) {
        out.push(Violation::new("address.zip", "Zip code must be exactly 4 digits"));
    }
}

fn education(draft: &ApplicantDraft, out: &mut Vec<Violation>) {
    let education = &draft.education;
    let birth_year = draft.birthday.map(|date| date.year());

    if education.level.trim().is_empty() {
        out.push(Violation::required("education.level", "Education level"));
    } else if !education.is_not_applicable() {
        require(
            &education.tertiary_school,
            "education.tertiary_school",
            "School",
            out,
        );
        require(
            &education.tertiary_program,
            "education.tertiary_program",
            "Program",
            out,
        );
        check_year_after_birth(
            &education.tertiary_year,
            birth_year,
            "education.tertiary_year",
            "Graduation year",
            true,
            out,
        );
    }

    check_year_after_birth(
        &draft.specialized_training.year,
        birth_year,
        "specialized_training.year",
        "Specialized training year",
        false,
        out,
    );

    if draft.skills.iter().all(|skill| skill.trim().is_empty()) {
        out.push(Violation::new("skills", "At least one skill is required"));
    }
}

fn check_year_after_birth(
    raw: &str,
    birth_year: Option<i32>,
    field: &'static str,
    label: &str,
    required: bool,
    out: &mut Vec<Violation>,
) {
    let raw = raw.trim();
    if raw.is_empty() {
        if required {
            out.push(Violation::required(field, label));
        }
        return;
    }

    match parse_number(raw) {
        None => out.push(Violation::new(field, format!("{label} must be a number"))),
        Some(year) => {
            if let Some(birth_year) = birth_year {
                if year <= i64::from(birth_year) {
                    out.push(Violation::new(
                        field,
                        format!("{label} must be after the birth year"),
                    ));
                }
            }
        }
    }
}

fn employment(draft: &ApplicantDraft, ctx: &ValidationContext, out: &mut Vec<Violation>) {
    match draft.available_start_date {
        None => out.push(Violation::required(
            "available_start_date",
            "Available start date",
        )),
        Some(date) if date < ctx.today => out.push(Violation::new(
            "available_start_date",
            "Available start date cannot be in the past",
        )),
        Some(_) => {}
    }

    require(&draft.position, "position", "Position", out);
}

fn license(draft: &ApplicantDraft, ctx: &ValidationContext, out: &mut Vec<Violation>) {
    let driver = &draft.driver;
    require(
        &driver.license_classification,
        "driver.license_classification",
        "License classification",
        out,
    );

    match driver.license_expiry {
        None => out.push(Violation::required("driver.license_expiry", "License expiry")),
        Some(expiry) if expiry <= ctx.today => out.push(Violation::new(
            "driver.license_expiry",
            "License must not be expired",
        )),
        Some(_) => {}
    }

    if driver.restriction_codes.is_empty() {
        out.push(Violation::new(
            "driver.restriction_codes",
            "Select at least one restriction code",
        ));
    }
}

fn driving_experience(draft: &ApplicantDraft, ctx: &ValidationContext, out: &mut Vec<Violation>) {
    let driver = &draft.driver;
    let years = driver.years_driving.trim();
    if years.is_empty() {
        out.push(Violation::required("driver.years_driving", "Years of driving"));
    } else {
        match parse_number(years) {
            None => out.push(Violation::new(
                "driver.years_driving",
                "Years of driving must be a number",
            )),
            Some(years) => {
                if let Some(birthday) = draft.birthday {
                    if years > i64::from(age_on(birthday, ctx.today)) {
                        out.push(Violation::new(
                            "driver.years_driving",
                            "Years of driving cannot exceed the applicant's age",
                        ));
                    }
                }
            }
        }
    }

    if driver.vehicles_driven.is_empty() {
        out.push(Violation::new(
            "driver.vehicles_driven",
            "List at least one vehicle type driven",
        ));
    }
}

fn medical(draft: &ApplicantDraft, ctx: &ValidationContext, out: &mut Vec<Violation>) {
    let medical = &draft.medical;
    if medical.taking_medications {
        require(
            &medical.medication_reason,
            "medical.medication_reason",
            "Medication reason",
            out,
        );
    }

    if medical.took_medical_test {
        match medical.medical_test_date {
            None => out.push(Violation::required(
                "medical.medical_test_date",
                "Medical test date",
            )),
            Some(date) if date > ctx.today => out.push(Violation::new(
                "medical.medical_test_date",
                "Medical test date cannot be in the future",
            )),
            Some(_) => {}
        }
    }
}

/// Completed years between `birthday` and `today`.
pub fn age_on(birthday: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birthday.year();
    if (today.month(), today.day()) < (birthday.month(), birthday.day()) {
        age -= 1;
    }
    age
}

fn parse_number(value: &str) -> Option<i64> {
    if value.is_empty() || !value.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn is_mobile_number(value: &str) -> bool {
    value.len() == 11 && value.starts_with("09") && value.chars().all(|ch| ch.is_ascii_digit())
}

/// `local@domain.tld` with no whitespace and a single `@`.
fn is_email_shaped(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty(),
        None => false,
    }
}
