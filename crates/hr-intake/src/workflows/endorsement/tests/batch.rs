use std::sync::Arc;

use super::common::*;
use crate::workflows::endorsement::batch::{BatchError, BatchOrchestrator, BatchOutcome};
use crate::workflows::endorsement::domain::{ApplicantDraft, FileRef};
use crate::workflows::endorsement::submitter::EndorsementErrorKind;
use crate::workflows::endorsement::validation::ValidationContext;

fn orchestrator(
    store: Arc<MemoryStore>,
) -> BatchOrchestrator<MemoryStore, MemoryBlobs, MemoryNotifications> {
    BatchOrchestrator::new(Arc::new(build_submitter(
        store,
        Arc::new(MemoryBlobs::default()),
        Arc::new(MemoryNotifications::default()),
    )))
}

fn ctx() -> ValidationContext {
    ValidationContext {
        today: today(),
        driver_role: false,
    }
}

#[tokio::test]
async fn one_failed_slot_does_not_stop_the_others() {
    let store = Arc::new(MemoryStore::with(|state| {
        state.unavailable_for.push("ben@example.com".to_string())
    }));
    let slots = vec![
        slot(1, complete_draft("Ana", "Reyes", "ana@example.com")),
        slot(2, complete_draft("Ben", "Cruz", "ben@example.com")),
        slot(3, complete_draft("Cara", "Lim", "cara@example.com")),
    ];

    let summary = orchestrator(store.clone())
        .submit_all(Some(&job_post()), &slots, &ctx())
        .await
        .expect("batch ran");

    assert_eq!(summary.outcome, BatchOutcome::PartiallyEndorsed);
    let failures: Vec<_> = summary.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].slot_id, 2);
    assert_eq!(failures[0].name, "Ben Cruz");
    assert_eq!(
        failures[0].error.as_ref().map(|error| error.kind),
        Some(EndorsementErrorKind::Submission)
    );
    let succeeded: Vec<u32> = summary.successes().map(|result| result.slot_id).collect();
    assert_eq!(succeeded, vec![1, 3]);
    assert_eq!(
        summary.message,
        "Endorsed Ana Reyes, Cara Lim. Failed: Ben Cruz: store unavailable: connection reset"
    );
    assert_eq!(store.applications().len(), 2);
}

#[tokio::test]
async fn all_slots_succeeding_reports_full_success() {
    let store = Arc::new(MemoryStore::default());
    let slots = vec![
        slot(1, complete_draft("Ana", "Reyes", "ana@example.com")),
        slot(2, ApplicantDraft::default()),
    ];

    let summary = orchestrator(store)
        .submit_all(Some(&job_post()), &slots, &ctx())
        .await
        .expect("batch ran");

    assert_eq!(summary.outcome, BatchOutcome::AllEndorsed);
    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.message, "Endorsed 1 applicant(s) successfully");
}

#[tokio::test]
async fn duplicate_emails_in_one_batch_are_caught_by_sequential_checks() {
    let store = Arc::new(MemoryStore::default());
    let slots = vec![
        slot(1, complete_draft("Ana", "Reyes", "ana@example.com")),
        slot(2, complete_draft("Ana", "Reyes", "ANA@example.com ")),
    ];

    let summary = orchestrator(store.clone())
        .submit_all(Some(&job_post()), &slots, &ctx())
        .await
        .expect("batch ran");

    assert_eq!(summary.outcome, BatchOutcome::PartiallyEndorsed);
    assert_eq!(
        summary.results[1].error.as_ref().map(|error| error.kind),
        Some(EndorsementErrorKind::AlreadyEndorsed)
    );
    assert_eq!(store.applications().len(), 1);
}

#[tokio::test]
async fn every_slot_failing_reports_none_endorsed() {
    let store = Arc::new(MemoryStore::with(|state| {
        state.unavailable_for.push("ana@example.com".to_string())
    }));
    let slots = vec![slot(1, complete_draft("Ana", "Reyes", "ana@example.com"))];

    let summary = orchestrator(store)
        .submit_all(Some(&job_post()), &slots, &ctx())
        .await
        .expect("batch ran");

    assert_eq!(summary.outcome, BatchOutcome::NoneEndorsed);
    assert!(summary.message.starts_with("No applicants were endorsed."));
}

#[tokio::test]
async fn blank_batches_never_reach_the_store() {
    let store = Arc::new(MemoryStore::default());
    let slots = vec![
        slot(1, ApplicantDraft::default()),
        slot(2, ApplicantDraft::default()),
    ];

    let error = orchestrator(store.clone())
        .submit_all(Some(&job_post()), &slots, &ctx())
        .await
        .expect_err("nothing to submit");

    assert!(matches!(error, BatchError::NothingToSubmit));
    assert_eq!(store.inserts(), 0);
}

#[tokio::test]
async fn validation_failures_stop_the_batch_before_any_write() {
    let store = Arc::new(MemoryStore::default());
    let mut incomplete = complete_draft("Ben", "Cruz", "ben@example.com");
    incomplete.contact_number = "12345".to_string();
    let slots = vec![
        slot(1, complete_draft("Ana", "Reyes", "ana@example.com")),
        slot(2, incomplete),
    ];

    let error = orchestrator(store.clone())
        .submit_all(Some(&job_post()), &slots, &ctx())
        .await
        .expect_err("invalid slot");

    match error {
        BatchError::Validation(validation) => assert_eq!(validation.slot_id, 2),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(store.applications().is_empty());
}

#[tokio::test]
async fn a_job_post_is_required() {
    let error = orchestrator(Arc::new(MemoryStore::default()))
        .submit_all(None, &[slot(1, ApplicantDraft::default())], &ctx())
        .await
        .expect_err("missing job post");
    assert!(matches!(error, BatchError::MissingJobPost));
}

#[tokio::test]
async fn same_named_uploads_from_one_batch_get_their_own_paths() {
    let store = Arc::new(MemoryStore::default());
    let blobs = Arc::new(MemoryBlobs::default());
    let orchestrator = BatchOrchestrator::new(Arc::new(build_submitter(
        store.clone(),
        blobs.clone(),
        Arc::new(MemoryNotifications::default()),
    )));
    let mut ana = complete_draft("Ana", "Reyes", "ana@example.com");
    ana.resume = FileRef::Pending(resume_file());
    let mut ben = complete_draft("Ben", "Cruz", "ben@example.com");
    ben.resume = FileRef::Pending(resume_file());

    let summary = orchestrator
        .submit_all(Some(&job_post()), &[slot(1, ana), slot(2, ben)], &ctx())
        .await
        .expect("batch ran");
    assert_eq!(summary.outcome, BatchOutcome::AllEndorsed);

    let uploads = blobs.uploads();
    assert_eq!(uploads.len(), 2);
    assert_ne!(uploads[0].1, uploads[1].1);

    let rows = store.applications();
    assert_ne!(rows[0].payload["files"]["resume"], rows[1].payload["files"]["resume"]);
    assert!(rows[0].payload["files"]["resume"]
        .as_str()
        .expect("resume path")
        .contains("/1-ana_example.com/"));
}
