use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{AgencyId, ApplicationId, ApplicationStatus, JobPostId, PendingFile};

/// Existing employee matched by work email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Stored application as seen by the duplicate checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRow {
    pub id: ApplicationId,
    pub job_post_id: JobPostId,
    pub job_title: String,
    pub status: ApplicationStatus,
    pub endorsed: bool,
    pub payload: Value,
}

impl ApplicationRow {
    pub fn applicant_email(&self) -> Option<&str> {
        payload_email(&self.payload)
    }
}

/// Applicant email inside a stored payload. Older rows nest the form under `applicant`
/// or `form`.
pub fn payload_email(payload: &Value) -> Option<&str> {
    [
        payload.get("email"),
        payload.get("applicant").and_then(|applicant| applicant.get("email")),
        payload.get("form").and_then(|form| form.get("email")),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .find(|email| !email.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewApplication {
    pub job_post_id: JobPostId,
    pub agency_id: AgencyId,
    pub status: ApplicationStatus,
    pub endorsed: bool,
    pub payload: Value,
}

/// Full replacement written onto an existing application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationUpdate {
    pub status: ApplicationStatus,
    pub endorsed: bool,
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HrRole {
    Hr,
    DepotHr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrUser {
    pub user_id: String,
    pub role: HrRole,
    #[serde(default)]
    pub depot: Option<String>,
}

impl HrUser {
    /// Depot-scoped HR only hear about endorsements for their own depot.
    pub fn receives_for_depot(&self, depot: &str) -> bool {
        match self.role {
            HrRole::Hr => true,
            HrRole::DepotHr => {
                let depot = depot.trim();
                !depot.is_empty()
                    && self
                        .depot
                        .as_deref()
                        .map(|own| own.trim().eq_ignore_ascii_case(depot))
                        .unwrap_or(false)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: String,
    pub application_id: ApplicationId,
    pub kind: String,
    pub title: String,
    pub message: String,
}

/// Backing store holding employees, applications and applicant profiles.
#[async_trait]
pub trait EndorsementStore: Send + Sync {
    async fn find_employee_by_email(
        &self,
        email: &str,
    ) -> Result<Option<EmployeeRecord>, StoreError>;

    async fn applications_for_job(
        &self,
        job_post_id: &JobPostId,
    ) -> Result<Vec<ApplicationRow>, StoreError>;

    /// Applications across every job that are neither hired nor rejected.
    async fn active_applications(&self) -> Result<Vec<ApplicationRow>, StoreError>;

    async fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<ApplicationId, StoreError>;

    async fn update_application(
        &self,
        id: &ApplicationId,
        update: ApplicationUpdate,
    ) -> Result<(), StoreError>;

    /// Résumé path saved on the applicant's own profile, if any.
    async fn profile_resume_by_email(&self, email: &str) -> Result<Option<String>, StoreError>;

    async fn hr_recipients(&self) -> Result<Vec<HrUser>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("conflicting record: {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store call timed out")]
    Timeout,
}

/// Object storage for résumés, certificates and license copies.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Upload `file` to `bucket/path`, returning the stored path.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        file: &PendingFile,
        upsert: bool,
    ) -> Result<String, BlobError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("upload rejected: {0}")]
    Rejected(String),
    #[error("blob storage unavailable: {0}")]
    Unavailable(String),
    #[error("upload timed out")]
    Timeout,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("notification timed out")]
    Timeout,
}
