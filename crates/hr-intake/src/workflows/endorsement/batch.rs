use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{ApplicantSlot, JobPost};
use super::repository::{BlobStorage, EndorsementStore, NotificationSink};
use super::slots::is_blank;
use super::submitter::{EndorsementErrorKind, EndorsementReceipt, EndorsementSubmitter};
use super::validation::{validate_for_submission, ValidationContext, ValidationError};

/// Errors that stop a batch before any applicant reaches the store.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("select a job post before submitting")]
    MissingJobPost,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("there are no applicants to submit")]
    NothingToSubmit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotFailure {
    pub kind: EndorsementErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotResult {
    pub slot_id: u32,
    pub name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<EndorsementReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SlotFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    AllEndorsed,
    PartiallyEndorsed,
    NoneEndorsed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub outcome: BatchOutcome,
    pub message: String,
    pub results: Vec<SlotResult>,
}

impl BatchSummary {
    fn from_results(results: Vec<SlotResult>) -> Self {
        let succeeded: Vec<&str> = results
            .iter()
            .filter(|result| result.ok)
            .map(|result| result.name.as_str())
            .collect();
        let failures: Vec<String> = results
            .iter()
            .filter_map(|result| {
                result
                    .error
                    .as_ref()
                    .map(|error| format!("{}: {}", result.name, error.message))
            })
            .collect();

        let (outcome, message) = if failures.is_empty() {
            (
                BatchOutcome::AllEndorsed,
                format!("Endorsed {} applicant(s) successfully", succeeded.len()),
            )
        } else if succeeded.is_empty() {
            (
                BatchOutcome::NoneEndorsed,
                format!("No applicants were endorsed. {}", failures.join("; ")),
            )
        } else {
            (
                BatchOutcome::PartiallyEndorsed,
                format!(
                    "Endorsed {}. Failed: {}",
                    succeeded.join(", "),
                    failures.join("; ")
                ),
            )
        };

        Self {
            outcome,
            message,
            results,
        }
    }

    pub fn successes(&self) -> impl Iterator<Item = &SlotResult> {
        self.results.iter().filter(|result| result.ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &SlotResult> {
        self.results.iter().filter(|result| !result.ok)
    }
}

/// Runs validation and then submits every non-blank slot strictly in slot order.
pub struct BatchOrchestrator<S, B, N> {
    submitter: Arc<EndorsementSubmitter<S, B, N>>,
}

impl<S, B, N> BatchOrchestrator<S, B, N>
where
    S: EndorsementStore + 'static,
    B: BlobStorage + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(submitter: Arc<EndorsementSubmitter<S, B, N>>) -> Self {
        Self { submitter }
    }

    pub async fn submit_all(
        &self,
        job_post: Option<&JobPost>,
        slots: &[ApplicantSlot],
        ctx: &ValidationContext,
    ) -> Result<BatchSummary, BatchError> {
        let job_post = job_post.ok_or(BatchError::MissingJobPost)?;
        validate_for_submission(slots, ctx)?;

        let pending: Vec<&ApplicantSlot> =
            slots.iter().filter(|slot| !is_blank(&slot.draft)).collect();
        if pending.is_empty() {
            return Err(BatchError::NothingToSubmit);
        }

        info!(
            job_post_id = job_post.id.0.as_str(),
            applicants = pending.len(),
            "submitting endorsement batch"
        );

        let mut results = Vec::with_capacity(pending.len());
        for slot in pending {
            let result = match self.submitter.submit(job_post, slot).await {
                Ok(receipt) => SlotResult {
                    slot_id: slot.id,
                    name: slot.name.clone(),
                    ok: true,
                    receipt: Some(receipt),
                    error: None,
                },
                Err(error) => {
                    warn!(slot_id = slot.id, %error, "applicant not endorsed");
                    SlotResult {
                        slot_id: slot.id,
                        name: slot.name.clone(),
                        ok: false,
                        receipt: None,
                        error: Some(SlotFailure {
                            kind: error.kind(),
                            message: error.to_string(),
                        }),
                    }
                }
            };
            results.push(result);
        }

        let summary = BatchSummary::from_results(results);
        info!(outcome = ?summary.outcome, "endorsement batch finished");
        Ok(summary)
    }
}
