use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel education level meaning "no formal education block to capture".
pub const EDUCATION_NOT_APPLICABLE: &str = "N/A";

/// Identifier wrapper for job posts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobPostId(pub String);

/// Identifier wrapper for stored applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier of the agency performing the endorsement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgencyId(pub String);

/// Hiring requisition an applicant is endorsed against.
///
/// The post is the source of truth for department, position and depot on every draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPost {
    pub id: JobPostId,
    pub title: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub depot: String,
    #[serde(default)]
    pub driver_role: bool,
}

impl JobPost {
    /// Overwrite the job-derived fields of `draft` with this post's non-empty values.
    pub fn apply_to(&self, draft: &mut ApplicantDraft) {
        if !self.department.trim().is_empty() {
            draft.department = self.department.trim().to_string();
        }
        if !self.title.trim().is_empty() {
            draft.position = self.title.trim().to_string();
        }
        if !self.depot.trim().is_empty() {
            draft.depot = self.depot.trim().to_string();
        }
    }
}

/// One in-progress endorsement record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicantDraft {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub birthday: Option<NaiveDate>,
    pub sex: String,
    pub marital_status: String,
    pub contact_number: String,
    pub email: String,
    pub address: Address,
    pub available_start_date: Option<NaiveDate>,
    pub currently_employed: String,
    pub department: String,
    pub position: String,
    pub depot: String,
    pub education: Education,
    pub skills: Vec<String>,
    pub specialized_training: SpecializedTraining,
    pub government_ids: GovernmentIds,
    pub driver: DriverProfile,
    pub medical: MedicalInfo,
    pub resume: FileRef,
}

impl ApplicantDraft {
    /// "First Last" when both names are present.
    pub fn display_name(&self) -> Option<String> {
        let first = self.first_name.trim();
        let last = self.last_name.trim();
        if first.is_empty() || last.is_empty() {
            None
        } else {
            Some(format!("{first} {last}"))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub unit_house_number: String,
    pub street: String,
    pub barangay: String,
    pub city: String,
    pub province: String,
    pub zip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub level: String,
    pub tertiary_school: String,
    pub tertiary_program: String,
    pub tertiary_year: String,
}

impl Education {
    pub fn is_not_applicable(&self) -> bool {
        self.level.trim().eq_ignore_ascii_case(EDUCATION_NOT_APPLICABLE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecializedTraining {
    pub name: String,
    pub year: String,
    pub certificate: FileRef,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernmentIds {
    pub has_sss: bool,
    pub has_pagibig: bool,
    pub has_tin: bool,
    pub has_philhealth: bool,
}

/// Extra block captured for driver-role job posts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverProfile {
    pub license_classification: String,
    pub license_expiry: Option<NaiveDate>,
    pub restriction_codes: Vec<RestrictionCode>,
    pub years_driving: String,
    pub truck_knowledge: String,
    pub vehicles_driven: Vec<String>,
    pub troubleshooting_tasks: Vec<String>,
    pub license_file: FileRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicalInfo {
    pub taking_medications: bool,
    pub medication_reason: String,
    pub took_medical_test: bool,
    pub medical_test_date: Option<NaiveDate>,
}

/// Reference to an uploaded document: nothing yet, a local file awaiting upload,
/// or a path already held by blob storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileRef {
    #[default]
    Absent,
    Pending(PendingFile),
    Stored { path: String },
}

impl FileRef {
    pub fn is_absent(&self) -> bool {
        matches!(self, FileRef::Absent)
    }

    pub fn stored_path(&self) -> Option<&str> {
        match self {
            FileRef::Stored { path } => Some(path.as_str()),
            _ => None,
        }
    }
}

/// Local file selected by the user but not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PendingFile {
    pub fn new(file_name: impl Into<String>, content_type: mime::Mime, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.essence_str().to_string(),
            bytes,
        }
    }

    /// Parsed content type, falling back to `application/octet-stream`.
    pub fn mime(&self) -> mime::Mime {
        self.content_type
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM)
    }
}

/// Driver's license restriction codes accepted on endorsements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestrictionCode {
    A,
    A1,
    B,
    B1,
    B2,
    C,
    D,
    BE,
    CE,
}

impl RestrictionCode {
    pub const fn catalog() -> [Self; 9] {
        [
            Self::A,
            Self::A1,
            Self::B,
            Self::B1,
            Self::B2,
            Self::C,
            Self::D,
            Self::BE,
            Self::CE,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::A1 => "A1",
            Self::B => "B",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C => "C",
            Self::D => "D",
            Self::BE => "BE",
            Self::CE => "CE",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "Motorcycle",
            Self::A1 => "Tricycle",
            Self::B => "Light vehicle up to 5000 kg, up to 8 seats",
            Self::B1 => "Light vehicle up to 5000 kg, 9 or more seats",
            Self::B2 => "Light goods vehicle up to 3500 kg",
            Self::C => "Heavy goods vehicle over 3500 kg",
            Self::D => "Bus over 5000 kg, 9 or more seats",
            Self::BE => "Trailer combination up to 3500 kg",
            Self::CE => "Articulated vehicle over 3500 kg",
        }
    }

    /// Exact catalog lookup on an already-normalized code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::catalog()
            .into_iter()
            .find(|candidate| candidate.code() == code)
    }
}

impl std::fmt::Display for RestrictionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.code(), self.label())
    }
}

/// Stable identity wrapping one draft within an endorsement session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantSlot {
    pub id: u32,
    pub name: String,
    pub draft: ApplicantDraft,
}

/// Application lifecycle as recorded by the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    UnderReview,
    Interview,
    Offered,
    Hired,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Hired and rejected applications no longer block other endorsements.
    pub const fn is_active(self) -> bool {
        !matches!(self, ApplicationStatus::Hired | ApplicationStatus::Rejected)
    }
}

/// Lowercased, trimmed email used for every duplicate check.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Case- and whitespace-insensitive email equality. Empty addresses never match.
pub fn emails_match(left: &str, right: &str) -> bool {
    let left = normalize_email(left);
    !left.is_empty() && left == normalize_email(right)
}
