//! Agency endorsement of applicants against a job post.
//!
//! Drafts live in numbered slots while an agency fills them in by hand or through CSV
//! import. Submission validates every non-blank slot, then endorses each applicant in
//! slot order through the store, blob and notification ports.

pub mod batch;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod slots;
pub mod submitter;
pub mod validation;

#[cfg(test)]
mod tests;

pub use batch::{
    BatchError, BatchOrchestrator, BatchOutcome, BatchSummary, SlotFailure, SlotResult,
};
pub use domain::{
    emails_match, normalize_email, AgencyId, ApplicantDraft, ApplicantSlot, ApplicationId,
    ApplicationStatus, FileRef, JobPost, JobPostId, PendingFile, RestrictionCode,
};
pub use repository::{
    ApplicationRow, ApplicationUpdate, BlobError, BlobStorage, EmployeeRecord, EndorsementStore,
    HrRole, HrUser, NewApplication, Notification, NotificationError, NotificationSink,
    StoreError,
};
pub use router::endorsement_router;
pub use service::{
    EndorsementService, ImportRequest, ImportResponse, SubmitRequest, ValidateRequest,
    ValidateResponse,
};
pub use slots::{is_blank, is_reusable_for_import, ApplicantSlots, SlotError};
pub use submitter::{
    EndorsementError, EndorsementErrorKind, EndorsementReceipt, EndorsementSubmitter,
    SubmissionPhase, WriteOutcome,
};
pub use validation::{
    validate_for_submission, validate_step, ValidationContext, ValidationError, Violation,
    WizardStep,
};
