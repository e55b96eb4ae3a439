use async_trait::async_trait;
use hr_intake::workflows::endorsement::repository::payload_email;
use hr_intake::workflows::endorsement::{
    emails_match, ApplicationId, ApplicationRow, ApplicationUpdate, BlobError, BlobStorage,
    EmployeeRecord, EndorsementStore, HrUser, JobPost, JobPostId, NewApplication, Notification,
    NotificationError, NotificationSink, PendingFile, StoreError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct StoreTables {
    employees: Vec<EmployeeRecord>,
    job_titles: HashMap<JobPostId, String>,
    applications: Vec<ApplicationRow>,
    profile_resumes: HashMap<String, String>,
    hr_users: Vec<HrUser>,
}

/// Process-local store that enforces one endorsed application per email and job post.
#[derive(Default, Clone)]
pub(crate) struct InMemoryEndorsementStore {
    tables: Arc<Mutex<StoreTables>>,
}

impl InMemoryEndorsementStore {
    pub(crate) fn register_job(&self, job_post: &JobPost) {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        tables
            .job_titles
            .insert(job_post.id.clone(), job_post.title.clone());
    }

    pub(crate) fn add_employee(&self, employee: EmployeeRecord) {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        tables.employees.push(employee);
    }

    pub(crate) fn add_hr_user(&self, user: HrUser) {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        tables.hr_users.push(user);
    }

    pub(crate) fn add_profile_resume(&self, email: &str, path: &str) {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        tables
            .profile_resumes
            .insert(email.trim().to_lowercase(), path.to_string());
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreTables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    pub(crate) fn applications(&self) -> Vec<ApplicationRow> {
        self.tables
            .lock()
            .expect("store mutex poisoned")
            .applications
            .clone()
    }
}

#[async_trait]
impl EndorsementStore for InMemoryEndorsementStore {
    async fn find_employee_by_email(
        &self,
        email: &str,
    ) -> Result<Option<EmployeeRecord>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .employees
            .iter()
            .find(|employee| emails_match(email, &employee.email))
            .cloned())
    }

    async fn applications_for_job(
        &self,
        job_post_id: &JobPostId,
    ) -> Result<Vec<ApplicationRow>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .applications
            .iter()
            .filter(|row| &row.job_post_id == job_post_id)
            .cloned()
            .collect())
    }

    async fn active_applications(&self) -> Result<Vec<ApplicationRow>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
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
        let mut tables = self.lock()?;
        let email = payload_email(&application.payload).unwrap_or_default();
        let duplicate = tables.applications.iter().any(|row| {
            row.job_post_id == application.job_post_id
                && row.endorsed
                && row
                    .applicant_email()
                    .is_some_and(|existing| emails_match(email, existing))
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "{email} is already endorsed for {}",
                application.job_post_id.0
            )));
        }

        let id = ApplicationId(format!("app-{:04}", tables.applications.len() + 1));
        let job_title = tables
            .job_titles
            .get(&application.job_post_id)
            .cloned()
            .unwrap_or_else(|| application.job_post_id.0.clone());
        tables.applications.push(ApplicationRow {
            id: id.clone(),
            job_post_id: application.job_post_id,
            job_title,
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
        let mut tables = self.lock()?;
        let row = tables
            .applications
            .iter_mut()
            .find(|row| &row.id == id)
            .ok_or(StoreError::NotFound)?;
        row.status = update.status;
        row.endorsed = update.endorsed;
        row.payload = update.payload;
        Ok(())
    }

    async fn profile_resume_by_email(&self, email: &str) -> Result<Option<String>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .profile_resumes
            .get(&email.trim().to_lowercase())
            .cloned())
    }

    async fn hr_recipients(&self) -> Result<Vec<HrUser>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.hr_users.clone())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryBlobStorage {
    objects: Arc<Mutex<HashMap<String, PendingFile>>>,
}

impl InMemoryBlobStorage {
    pub(crate) fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .objects
            .lock()
            .expect("blob mutex poisoned")
            .keys()
            .cloned()
            .collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        file: &PendingFile,
        upsert: bool,
    ) -> Result<String, BlobError> {
        let key = format!("{bucket}/{path}");
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| BlobError::Unavailable("blob lock poisoned".to_string()))?;
        if !upsert && objects.contains_key(&key) {
            return Err(BlobError::Rejected(format!("{key} already exists")));
        }
        info!(%key, content_type = %file.content_type, size = file.bytes.len(), "stored upload");
        objects.insert(key, file.clone());
        Ok(path.to_string())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationSink {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryNotificationSink {
    pub(crate) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notification mutex poisoned").clone()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            user_id = %notification.user_id,
            application_id = %notification.application_id.0,
            "hr notified of endorsement"
        );
        self.sent
            .lock()
            .map_err(|_| NotificationError::Transport("notification lock poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}

/// Read a local document into a pending upload, guessing its content type from the extension.
pub(crate) fn pending_file_from_path(path: &Path) -> std::io::Result<PendingFile> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(pending_file(file_name, bytes))
}

pub(crate) fn pending_file(file_name: impl Into<String>, bytes: Vec<u8>) -> PendingFile {
    let file_name = file_name.into();
    let content_type = mime_guess::from_path(&file_name).first_or_octet_stream();
    PendingFile::new(file_name, content_type, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hr_intake::workflows::endorsement::{AgencyId, ApplicationStatus};
    use serde_json::json;

    fn new_application(email: &str) -> NewApplication {
        NewApplication {
            job_post_id: JobPostId("job-1".to_string()),
            agency_id: AgencyId("agency-1".to_string()),
            status: ApplicationStatus::Submitted,
            endorsed: true,
            payload: json!({ "email": email }),
        }
    }

    #[tokio::test]
    async fn second_endorsement_for_the_same_job_conflicts() {
        let store = InMemoryEndorsementStore::default();
        store
            .insert_application(new_application("ana@example.com"))
            .await
            .expect("first insert");

        let error = store
            .insert_application(new_application(" ANA@example.com"))
            .await
            .expect_err("duplicate");
        assert!(matches!(error, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn blob_uploads_without_upsert_reject_existing_paths() {
        let blobs = InMemoryBlobStorage::default();
        let file = pending_file("resume.pdf", b"%PDF".to_vec());
        assert_eq!(file.content_type, "application/pdf");

        blobs
            .upload("resumes", "a/resume.pdf", &file, false)
            .await
            .expect("first upload");
        assert!(blobs
            .upload("resumes", "a/resume.pdf", &file, false)
            .await
            .is_err());
        blobs
            .upload("resumes", "a/resume.pdf", &file, true)
            .await
            .expect("upsert");
        assert_eq!(blobs.paths(), vec!["resumes/a/resume.pdf".to_string()]);
    }
}
