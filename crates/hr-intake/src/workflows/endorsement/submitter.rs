use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::domain::{
    emails_match, normalize_email, AgencyId, ApplicantSlot, ApplicationId, ApplicationStatus,
    FileRef, JobPost, PendingFile,
};
use super::repository::{
    ApplicationRow, ApplicationUpdate, BlobError, BlobStorage, EndorsementStore, NewApplication,
    Notification, NotificationError, NotificationSink, StoreError,
};
use crate::config::{StorageConfig, SubmissionConfig};

/// Per-applicant submission phases, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Draft,
    PreCheck,
    Blocked,
    InsertOrUpdate,
    Done,
    Failed,
}

impl SubmissionPhase {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionPhase::Draft => "draft",
            SubmissionPhase::PreCheck => "pre_check",
            SubmissionPhase::Blocked => "blocked",
            SubmissionPhase::InsertOrUpdate => "insert_or_update",
            SubmissionPhase::Done => "done",
            SubmissionPhase::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndorsementErrorKind {
    DuplicateEmployee,
    AlreadyEndorsed,
    ActiveApplicationElsewhere,
    FileUpload,
    Submission,
    DuplicateData,
}

/// Terminal failure for one applicant. None of these are retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EndorsementError {
    #[error("{email} already belongs to an existing employee")]
    DuplicateEmployee { email: String },
    #[error("{email} is already endorsed for {job_title}")]
    AlreadyEndorsed { email: String, job_title: String },
    #[error("{email} has an active application for {job_title} ({})", .status.label())]
    ActiveApplicationElsewhere {
        email: String,
        job_title: String,
        status: ApplicationStatus,
    },
    #[error("failed to upload {document}: {message}")]
    FileUpload {
        document: &'static str,
        message: String,
    },
    #[error("{0}")]
    Submission(String),
    #[error("duplicate data for {email}: {message}")]
    DuplicateData { email: String, message: String },
}

impl EndorsementError {
    pub fn kind(&self) -> EndorsementErrorKind {
        match self {
            EndorsementError::DuplicateEmployee { .. } => EndorsementErrorKind::DuplicateEmployee,
            EndorsementError::AlreadyEndorsed { .. } => EndorsementErrorKind::AlreadyEndorsed,
            EndorsementError::ActiveApplicationElsewhere { .. } => {
                EndorsementErrorKind::ActiveApplicationElsewhere
            }
            EndorsementError::FileUpload { .. } => EndorsementErrorKind::FileUpload,
            EndorsementError::Submission(_) => EndorsementErrorKind::Submission,
            EndorsementError::DuplicateData { .. } => EndorsementErrorKind::DuplicateData,
        }
    }
}

impl From<StoreError> for EndorsementError {
    fn from(error: StoreError) -> Self {
        EndorsementError::Submission(error.to_string())
    }
}

/// How the application row came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Inserted,
    Updated,
    /// The insert conflicted with an unendorsed row written concurrently.
    Recovered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndorsementReceipt {
    pub application_id: ApplicationId,
    pub outcome: WriteOutcome,
    pub notified: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct ResolvedFiles {
    resume: Option<String>,
    certificate: Option<String>,
    license: Option<String>,
}

async fn within<T, E>(
    limit: Duration,
    call: impl Future<Output = Result<T, E>>,
    on_timeout: E,
) -> Result<T, E> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout),
    }
}

/// Submits one applicant at a time against the store, blob storage and notifications.
pub struct EndorsementSubmitter<S, B, N> {
    store: Arc<S>,
    blobs: Arc<B>,
    notifications: Arc<N>,
    storage: StorageConfig,
    call_timeout: Duration,
    agency: AgencyId,
}

impl<S, B, N> EndorsementSubmitter<S, B, N>
where
    S: EndorsementStore + 'static,
    B: BlobStorage + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(
        store: Arc<S>,
        blobs: Arc<B>,
        notifications: Arc<N>,
        storage: StorageConfig,
        submission: SubmissionConfig,
        agency: AgencyId,
    ) -> Self {
        Self {
            store,
            blobs,
            notifications,
            storage,
            call_timeout: submission.call_timeout,
            agency,
        }
    }

    pub fn agency(&self) -> &AgencyId {
        &self.agency
    }

    fn transition(&self, slot: &ApplicantSlot, phase: SubmissionPhase) {
        match phase {
            SubmissionPhase::Blocked | SubmissionPhase::Failed => {
                warn!(slot_id = slot.id, phase = phase.label(), "endorsement phase")
            }
            _ => debug!(slot_id = slot.id, phase = phase.label(), "endorsement phase"),
        }
    }

    /// Endorse one applicant against `job_post`.
    pub async fn submit(
        &self,
        job_post: &JobPost,
        slot: &ApplicantSlot,
    ) -> Result<EndorsementReceipt, EndorsementError> {
        self.transition(slot, SubmissionPhase::Draft);
        let email = normalize_email(&slot.draft.email);

        self.transition(slot, SubmissionPhase::PreCheck);
        let update_target = match self.pre_check(job_post, &email).await {
            Ok(target) => target,
            Err(error) => {
                let phase = match error {
                    EndorsementError::Submission(_) => SubmissionPhase::Failed,
                    _ => SubmissionPhase::Blocked,
                };
                self.transition(slot, phase);
                return Err(error);
            }
        };

        self.transition(slot, SubmissionPhase::InsertOrUpdate);
        let written = match self.write(job_post, slot, &email, update_target).await {
            Ok(written) => written,
            Err(error) => {
                self.transition(slot, SubmissionPhase::Failed);
                return Err(error);
            }
        };

        let (application_id, outcome) = written;
        let notified = self.notify_hr(job_post, slot, &application_id).await;
        self.transition(slot, SubmissionPhase::Done);
        info!(
            slot_id = slot.id,
            application_id = application_id.0.as_str(),
            outcome = ?outcome,
            notified,
            "applicant endorsed"
        );

        Ok(EndorsementReceipt {
            application_id,
            outcome,
            notified,
        })
    }

    /// Employee, same-job and cross-job collision checks. Returns the unendorsed
    /// same-job application to overwrite, if one exists.
    async fn pre_check(
        &self,
        job_post: &JobPost,
        email: &str,
    ) -> Result<Option<ApplicationRow>, EndorsementError> {
        let employee = within(
            self.call_timeout,
            self.store.find_employee_by_email(email),
            StoreError::Timeout,
        )
        .await?;
        if employee.is_some() {
            return Err(EndorsementError::DuplicateEmployee {
                email: email.to_string(),
            });
        }

        let same_job = within(
            self.call_timeout,
            self.store.applications_for_job(&job_post.id),
            StoreError::Timeout,
        )
        .await?;
        if let Some(existing) = find_by_email(same_job, email) {
            if existing.endorsed {
                return Err(EndorsementError::AlreadyEndorsed {
                    email: email.to_string(),
                    job_title: job_post.title.clone(),
                });
            }
            return Ok(Some(existing));
        }

        let active = within(
            self.call_timeout,
            self.store.active_applications(),
            StoreError::Timeout,
        )
        .await?;
        let elsewhere = active
            .into_iter()
            .filter(|row| row.job_post_id != job_post.id && row.status.is_active());
        if let Some(conflict) = find_by_email(elsewhere, email) {
            return Err(EndorsementError::ActiveApplicationElsewhere {
                email: email.to_string(),
                job_title: conflict.job_title,
                status: conflict.status,
            });
        }

        Ok(None)
    }

    async fn write(
        &self,
        job_post: &JobPost,
        slot: &ApplicantSlot,
        email: &str,
        update_target: Option<ApplicationRow>,
    ) -> Result<(ApplicationId, WriteOutcome), EndorsementError> {
        let files = self.resolve_files(job_post, slot, email).await?;
        let payload = self.payload(job_post, slot, email, &files, Utc::now());

        if let Some(target) = update_target {
            let update = ApplicationUpdate {
                status: ApplicationStatus::Submitted,
                endorsed: true,
                payload: payload.clone(),
            };
            match within(
                self.call_timeout,
                self.store.update_application(&target.id, update),
                StoreError::Timeout,
            )
            .await
            {
                Ok(()) => return Ok((target.id, WriteOutcome::Updated)),
                Err(error) => warn!(
                    application_id = target.id.0.as_str(),
                    %error,
                    "update of pending application failed; inserting instead"
                ),
            }
        }

        let application = NewApplication {
            job_post_id: job_post.id.clone(),
            agency_id: self.agency.clone(),
            status: ApplicationStatus::Submitted,
            endorsed: true,
            payload,
        };
        match within(
            self.call_timeout,
            self.store.insert_application(application),
            StoreError::Timeout,
        )
        .await
        {
            Ok(id) => Ok((id, WriteOutcome::Inserted)),
            Err(StoreError::Conflict(message)) => self.recover_conflict(job_post, email, message).await,
            Err(other) => Err(other.into()),
        }
    }

    /// Re-read the job's applications after an insert conflict and reconcile by email.
    async fn recover_conflict(
        &self,
        job_post: &JobPost,
        email: &str,
        message: String,
    ) -> Result<(ApplicationId, WriteOutcome), EndorsementError> {
        warn!(
            job_post_id = job_post.id.0.as_str(),
            %message,
            "insert conflicted; re-scanning job applications"
        );
        let rows = within(
            self.call_timeout,
            self.store.applications_for_job(&job_post.id),
            StoreError::Timeout,
        )
        .await?;

        match find_by_email(rows, email) {
            Some(row) if row.endorsed => Err(EndorsementError::AlreadyEndorsed {
                email: email.to_string(),
                job_title: job_post.title.clone(),
            }),
            Some(row) => Ok((row.id, WriteOutcome::Recovered)),
            None => Err(EndorsementError::DuplicateData {
                email: email.to_string(),
                message,
            }),
        }
    }

    async fn resolve_files(
        &self,
        job_post: &JobPost,
        slot: &ApplicantSlot,
        email: &str,
    ) -> Result<ResolvedFiles, EndorsementError> {
        let draft = &slot.draft;
        let owner = format!("{}-{}", slot.id, email);
        let resume = match &draft.resume {
            FileRef::Pending(file) => Some(
                self.upload(
                    "resume",
                    &self.storage.resume_bucket,
                    job_post,
                    &owner,
                    file,
                )
                .await?,
            ),
            FileRef::Stored { path } => Some(path.clone()),
            FileRef::Absent => self.profile_resume(email).await,
        };

        let certificate = match &draft.specialized_training.certificate {
            FileRef::Pending(file) => Some(
                self.upload(
                    "training certificate",
                    &self.storage.certificate_bucket,
                    job_post,
                    &owner,
                    file,
                )
                .await?,
            ),
            other => other.stored_path().map(str::to_string),
        };

        let license = match &draft.driver.license_file {
            FileRef::Pending(file) => Some(
                self.upload(
                    "license photocopy",
                    &self.storage.license_bucket,
                    job_post,
                    &owner,
                    file,
                )
                .await?,
            ),
            other => other.stored_path().map(str::to_string),
        };

        Ok(ResolvedFiles {
            resume,
            certificate,
            license,
        })
    }

    async fn profile_resume(&self, email: &str) -> Option<String> {
        match within(
            self.call_timeout,
            self.store.profile_resume_by_email(email),
            StoreError::Timeout,
        )
        .await
        {
            Ok(path) => path,
            Err(error) => {
                warn!(%error, "profile résumé lookup failed; continuing without one");
                None
            }
        }
    }

    async fn upload(
        &self,
        document: &'static str,
        bucket: &str,
        job_post: &JobPost,
        owner: &str,
        file: &PendingFile,
    ) -> Result<String, EndorsementError> {
        let path = object_path(&self.agency, job_post, owner, file, Utc::now());
        within(
            self.call_timeout,
            self.blobs.upload(bucket, &path, file, true),
            BlobError::Timeout,
        )
        .await
        .map_err(|error| EndorsementError::FileUpload {
            document,
            message: error.to_string(),
        })
    }

    fn payload(
        &self,
        job_post: &JobPost,
        slot: &ApplicantSlot,
        email: &str,
        files: &ResolvedFiles,
        endorsed_at: DateTime<Utc>,
    ) -> serde_json::Value {
        let mut applicant = slot.draft.clone();
        applicant.email = email.to_string();
        applicant.resume = stored(&files.resume);
        applicant.specialized_training.certificate = stored(&files.certificate);
        applicant.driver.license_file = stored(&files.license);

        json!({
            "email": email,
            "job_post_id": job_post.id,
            "agency_id": self.agency,
            "endorsed_at": endorsed_at.to_rfc3339(),
            "slot_name": slot.name,
            "applicant": applicant,
            "files": {
                "resume": files.resume,
                "certificate": files.certificate,
                "license": files.license,
            },
        })
    }

    /// Fan out to HR. Failures are logged and never undo the endorsement.
    async fn notify_hr(
        &self,
        job_post: &JobPost,
        slot: &ApplicantSlot,
        application_id: &ApplicationId,
    ) -> usize {
        let recipients = match within(
            self.call_timeout,
            self.store.hr_recipients(),
            StoreError::Timeout,
        )
        .await
        {
            Ok(recipients) => recipients,
            Err(error) => {
                warn!(%error, "could not list HR recipients; skipping notifications");
                return 0;
            }
        };

        let applicant = slot
            .draft
            .display_name()
            .unwrap_or_else(|| slot.name.clone());
        let mut notified = 0;
        for recipient in recipients
            .into_iter()
            .filter(|recipient| recipient.receives_for_depot(&job_post.depot))
        {
            let notification = Notification {
                user_id: recipient.user_id.clone(),
                application_id: application_id.clone(),
                kind: "endorsement".to_string(),
                title: "New endorsed applicant".to_string(),
                message: format!("{applicant} was endorsed for {}", job_post.title),
            };
            match within(
                self.call_timeout,
                self.notifications.notify(notification),
                NotificationError::Timeout,
            )
            .await
            {
                Ok(()) => notified += 1,
                Err(error) => warn!(
                    user_id = recipient.user_id.as_str(),
                    %error,
                    "failed to notify HR user"
                ),
            }
        }
        notified
    }
}

fn stored(path: &Option<String>) -> FileRef {
    match path {
        Some(path) => FileRef::Stored { path: path.clone() },
        None => FileRef::Absent,
    }
}

fn find_by_email(
    rows: impl IntoIterator<Item = ApplicationRow>,
    email: &str,
) -> Option<ApplicationRow> {
    rows.into_iter().find(|row| {
        row.applicant_email()
            .map(|stored| emails_match(email, stored))
            .unwrap_or(false)
    })
}

/// `{agency}/{job}/{owner}/{millis}-{file}` with every segment reduced to safe characters.
///
/// `owner` identifies the applicant so same-named files from one batch never share a path.
fn object_path(
    agency: &AgencyId,
    job_post: &JobPost,
    owner: &str,
    file: &PendingFile,
    at: DateTime<Utc>,
) -> String {
    format!(
        "{}/{}/{}/{}-{}",
        agency.0,
        job_post.id.0,
        path_segment(owner, "applicant"),
        at.timestamp_millis(),
        path_segment(&file.file_name, "upload")
    )
}

fn path_segment(raw: &str, fallback: &str) -> String {
    let segment: String = raw
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if segment.is_empty() {
        fallback.to_string()
    } else {
        segment
    }
}
