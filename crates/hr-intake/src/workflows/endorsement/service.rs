use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::batch::{BatchError, BatchOrchestrator, BatchSummary};
use super::domain::{AgencyId, ApplicantDraft, ApplicantSlot, JobPost};
use super::repository::{BlobStorage, EndorsementStore, NotificationSink};
use super::slots::ApplicantSlots;
use super::submitter::EndorsementSubmitter;
use super::validation::{step_count, validate_step, ValidationContext, Violation};
use crate::config::AppConfig;
use crate::workflows::bulk_import::{BulkImporter, ImportFormatError};

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    pub file_name: String,
    pub content: String,
    #[serde(default)]
    pub job_post: Option<JobPost>,
    #[serde(default)]
    pub slots: Vec<ApplicantSlot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    pub imported: Vec<u32>,
    pub selected: u32,
    pub step: u8,
    pub slots: Vec<ApplicantSlot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateRequest {
    pub step: u8,
    pub draft: ApplicantDraft,
    #[serde(default)]
    pub driver_role: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateResponse {
    pub step: u8,
    pub step_count: u8,
    pub complete: bool,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub job_post: Option<JobPost>,
    pub slots: Vec<ApplicantSlot>,
}

/// Facade over import, validation and batch submission used by the HTTP router.
pub struct EndorsementService<S, B, N> {
    importer: BulkImporter,
    orchestrator: BatchOrchestrator<S, B, N>,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl<S, B, N> EndorsementService<S, B, N>
where
    S: EndorsementStore + 'static,
    B: BlobStorage + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(importer: BulkImporter, submitter: Arc<EndorsementSubmitter<S, B, N>>) -> Self {
        Self {
            importer,
            orchestrator: BatchOrchestrator::new(submitter),
            today: local_today,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        agency: AgencyId,
        store: Arc<S>,
        blobs: Arc<B>,
        notifications: Arc<N>,
    ) -> Self {
        let submitter = EndorsementSubmitter::new(
            store,
            blobs,
            notifications,
            config.storage.clone(),
            config.submission,
            agency,
        );
        Self::new(BulkImporter::new(config.import), Arc::new(submitter))
    }

    /// Pin the date used for validation.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn importer(&self) -> &BulkImporter {
        &self.importer
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    pub fn import(&self, request: ImportRequest) -> Result<ImportResponse, ImportFormatError> {
        let table = self
            .importer
            .load_bytes(&request.file_name, request.content.as_bytes())?;

        let mut slots = ApplicantSlots::from_slots(request.slots, request.job_post);
        let imported = slots.import_rows(&table.rows);
        info!(
            file_name = request.file_name.as_str(),
            imported = imported.len(),
            "csv applicants imported"
        );

        Ok(ImportResponse {
            imported,
            selected: slots.selected(),
            step: slots.step(),
            slots: slots.into_slots(),
        })
    }

    pub fn validate(&self, request: &ValidateRequest) -> ValidateResponse {
        let ctx = ValidationContext {
            today: self.today(),
            driver_role: request.driver_role,
        };
        let violations = validate_step(request.step, &request.draft, &ctx);
        ValidateResponse {
            step: request.step,
            step_count: step_count(request.driver_role),
            complete: violations.is_empty(),
            violations,
        }
    }

    pub async fn submit(&self, request: SubmitRequest) -> Result<BatchSummary, BatchError> {
        let slots = ApplicantSlots::from_slots(request.slots, request.job_post);
        let ctx = ValidationContext {
            today: self.today(),
            driver_role: slots.driver_role(),
        };
        self.orchestrator
            .submit_all(slots.job_post(), slots.slots(), &ctx)
            .await
    }
}
