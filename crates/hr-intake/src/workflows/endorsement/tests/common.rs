use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::config::{StorageConfig, SubmissionConfig};
use crate::workflows::bulk_import::BulkImporter;
use crate::workflows::endorsement::domain::{
    emails_match, AgencyId, Address, ApplicantDraft, ApplicantSlot, ApplicationId,
    ApplicationStatus, Education, JobPost, JobPostId, PendingFile,
};
use crate::workflows::endorsement::repository::{
    ApplicationRow, ApplicationUpdate, BlobError, BlobStorage, EmployeeRecord, EndorsementStore,
    HrUser, NewApplication, Notification, NotificationError, NotificationSink, StoreError,
};
use crate::workflows::endorsement::{EndorsementService, EndorsementSubmitter};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn job_post() -> JobPost {
    JobPost {
        id: JobPostId("job-1".to_string()),
        title: "Warehouse Helper".to_string(),
        department: "Operations".to_string(),
        depot: "Valenzuela".to_string(),
        driver_role: false,
    }
}

pub(super) fn driver_job_post() -> JobPost {
    JobPost {
        id: JobPostId("job-2".to_string()),
        title: "Delivery Driver".to_string(),
        department: "Logistics".to_string(),
        depot: "Pasig".to_string(),
        driver_role: true,
    }
}

/// Draft that passes every standard step as of `today()`.
pub(super) fn complete_draft(first: &str, last: &str, email: &str) -> ApplicantDraft {
    let mut draft = ApplicantDraft {
        first_name: first.to_string(),
        last_name: last.to_string(),
        birthday: Some(date(1995, 4, 12)),
        sex: "Female".to_string(),
        marital_status: "Single".to_string(),
        contact_number: "09171234567".to_string(),
        email: email.to_string(),
        address: Address {
            unit_house_number: "12".to_string(),
            street: "Rizal Ave".to_string(),
            barangay: "Malinta".to_string(),
            city: "Valenzuela".to_string(),
            province: "Metro Manila".to_string(),
            zip: "1440".to_string(),
        },
        available_start_date: Some(date(2026, 3, 16)),
        currently_employed: "No".to_string(),
        education: Education {
            level: "College".to_string(),
            tertiary_school: "PUP".to_string(),
            tertiary_program: "BS Accountancy".to_string(),
            tertiary_year: "2016".to_string(),
        },
        skills: vec!["Inventory".to_string()],
        ..ApplicantDraft::default()
    };
    job_post().apply_to(&mut draft);
    draft
}

pub(super) fn slot(id: u32, draft: ApplicantDraft) -> ApplicantSlot {
    let name = draft
        .display_name()
        .unwrap_or_else(|| format!("Employee {id}"));
    ApplicantSlot { id, name, draft }
}

pub(super) fn resume_file() -> PendingFile {
    PendingFile::new("cv.pdf", mime::APPLICATION_PDF, b"%PDF-1.4".to_vec())
}

pub(super) fn application_row(
    id: &str,
    job_post: &JobPost,
    email: &str,
    status: ApplicationStatus,
    endorsed: bool,
) -> ApplicationRow {
    ApplicationRow {
        id: ApplicationId(id.to_string()),
        job_post_id: job_post.id.clone(),
        job_title: job_post.title.clone(),
        status,
        endorsed,
        payload: json!({ "applicant": { "email": email } }),
    }
}

#[derive(Default)]
pub(super) struct StoreState {
    pub(super) employees: Vec<EmployeeRecord>,
    pub(super) applications: Vec<ApplicationRow>,
    pub(super) profile_resumes: HashMap<String, String>,
    pub(super) hr_users: Vec<HrUser>,
    /// Row written by a "concurrent" actor the moment an insert is attempted.
    pub(super) race_on_insert: Option<ApplicationRow>,
    /// Emails whose inserts fail with an unavailable store.
    pub(super) unavailable_for: Vec<String>,
    pub(super) fail_updates: bool,
    pub(super) fail_profile_lookup: bool,
    pub(super) inserts: usize,
    pub(super) updates: usize,
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub(super) fn with(configure: impl FnOnce(&mut StoreState)) -> Self {
        let store = Self::default();
        configure(&mut store.state.lock().expect("store mutex poisoned"));
        store
    }

    pub(super) fn applications(&self) -> Vec<ApplicationRow> {
        self.state
            .lock()
            .expect("store mutex poisoned")
            .applications
            .clone()
    }

    pub(super) fn inserts(&self) -> usize {
        self.state.lock().expect("store mutex poisoned").inserts
    }

    pub(super) fn updates(&self) -> usize {
        self.state.lock().expect("store mutex poisoned").updates
    }
}

#[async_trait]
impl EndorsementStore for MemoryStore {
    async fn find_employee_by_email(
        &self,
        email: &str,
    ) -> Result<Option<EmployeeRecord>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .employees
            .iter()
            .find(|employee| emails_match(email, &employee.email))
            .cloned())
    }

    async fn applications_for_job(
        &self,
        job_post_id: &JobPostId,
    ) -> Result<Vec<ApplicationRow>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .applications
            .iter()
            .filter(|row| &row.job_post_id == job_post_id)
            .cloned()
            .collect())
    }

    async fn active_applications(&self) -> Result<Vec<ApplicationRow>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .applications
            .iter()
            .filter(|row| row.status.is_active())
            .cloned()
            .collect())
    }

    async fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<ApplicationId, StoreError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let email = application.payload["email"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        if state
            .unavailable_for
            .iter()
            .any(|blocked| emails_match(blocked, &email))
        {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        if let Some(row) = state.race_on_insert.take() {
            state.applications.push(row);
            return Err(StoreError::Conflict(
                "duplicate key value violates unique constraint".to_string(),
            ));
        }

        state.inserts += 1;
        let id = ApplicationId(format!("app-{:03}", state.applications.len() + 1));
        state.applications.push(ApplicationRow {
            id: id.clone(),
            job_post_id: application.job_post_id,
            job_title: "Warehouse Helper".to_string(),
            status: application.status,
            endorsed: application.endorsed,
            payload: application.payload,
        });
        Ok(id)
    }

    async fn update_application(
        &self,
        id: &ApplicationId,
        update: ApplicationUpdate,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        if state.fail_updates {
            return Err(StoreError::Unavailable("row locked".to_string()));
        }
        let row = state
            .applications
            .iter_mut()
            .find(|row| &row.id == id)
            .ok_or(StoreError::NotFound)?;
        row.status = update.status;
        row.endorsed = update.endorsed;
        row.payload = update.payload;
        state.updates += 1;
        Ok(())
    }

    async fn profile_resume_by_email(&self, email: &str) -> Result<Option<String>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        if state.fail_profile_lookup {
            return Err(StoreError::Unavailable("profiles offline".to_string()));
        }
        Ok(state
            .profile_resumes
            .iter()
            .find(|(owner, _)| emails_match(email, owner))
            .map(|(_, path)| path.clone()))
    }

    async fn hr_recipients(&self) -> Result<Vec<HrUser>, StoreError> {
        Ok(self
            .state
            .lock()
            .expect("store mutex poisoned")
            .hr_users
            .clone())
    }
}

/// Store that never answers employee lookups in time.
pub(super) struct StalledStore;

#[async_trait]
impl EndorsementStore for StalledStore {
    async fn find_employee_by_email(
        &self,
        _email: &str,
    ) -> Result<Option<EmployeeRecord>, StoreError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(None)
    }

    async fn applications_for_job(
        &self,
        _job_post_id: &JobPostId,
    ) -> Result<Vec<ApplicationRow>, StoreError> {
        Ok(Vec::new())
    }

    async fn active_applications(&self) -> Result<Vec<ApplicationRow>, StoreError> {
        Ok(Vec::new())
    }

    async fn insert_application(
        &self,
        _application: NewApplication,
    ) -> Result<ApplicationId, StoreError> {
        Err(StoreError::Unavailable("unreachable".to_string()))
    }

    async fn update_application(
        &self,
        _id: &ApplicationId,
        _update: ApplicationUpdate,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("unreachable".to_string()))
    }

    async fn profile_resume_by_email(&self, _email: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn hr_recipients(&self) -> Result<Vec<HrUser>, StoreError> {
        Ok(Vec::new())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryBlobs {
    uploads: Arc<Mutex<Vec<(String, String)>>>,
    pub(super) fail: bool,
}

impl MemoryBlobs {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().expect("blob mutex poisoned").clone()
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobs {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        _file: &PendingFile,
        _upsert: bool,
    ) -> Result<String, BlobError> {
        if self.fail {
            return Err(BlobError::Rejected("payload too large".to_string()));
        }
        self.uploads
            .lock()
            .expect("blob mutex poisoned")
            .push((bucket.to_string(), path.to_string()));
        Ok(format!("{bucket}/{path}"))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    sent: Arc<Mutex<Vec<Notification>>>,
    pub(super) fail: bool,
}

impl MemoryNotifications {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notification mutex poisoned").clone()
    }
}

#[async_trait]
impl NotificationSink for MemoryNotifications {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::Transport("smtp down".to_string()));
        }
        self.sent
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Sink whose deliveries never finish within a short call timeout.
pub(super) struct StalledNotifications;

#[async_trait]
impl NotificationSink for StalledNotifications {
    async fn notify(&self, _notification: Notification) -> Result<(), NotificationError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }
}

pub(super) fn agency() -> AgencyId {
    AgencyId("agency-1".to_string())
}

pub(super) fn build_submitter<S: EndorsementStore + 'static>(
    store: Arc<S>,
    blobs: Arc<MemoryBlobs>,
    notifications: Arc<MemoryNotifications>,
) -> EndorsementSubmitter<S, MemoryBlobs, MemoryNotifications> {
    EndorsementSubmitter::new(
        store,
        blobs,
        notifications,
        StorageConfig::default(),
        SubmissionConfig::default(),
        agency(),
    )
}

pub(super) fn build_service(
    store: Arc<MemoryStore>,
) -> EndorsementService<MemoryStore, MemoryBlobs, MemoryNotifications> {
    let submitter = build_submitter(
        store,
        Arc::new(MemoryBlobs::default()),
        Arc::new(MemoryNotifications::default()),
    );
    EndorsementService::new(BulkImporter::default(), Arc::new(submitter)).with_clock(today)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
