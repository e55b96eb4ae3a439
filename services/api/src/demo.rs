use crate::infra::{
    pending_file, pending_file_from_path, InMemoryBlobStorage, InMemoryEndorsementStore,
    InMemoryNotificationSink,
};
use chrono::{Duration, NaiveDate};
use clap::Args;
use hr_intake::config::AppConfig;
use hr_intake::error::AppError;
use hr_intake::workflows::bulk_import::template_csv;
use hr_intake::workflows::endorsement::{
    validate_for_submission, AgencyId, ApplicantSlot, ApplicantSlots, BatchSummary,
    EmployeeRecord, EndorsementService, FileRef, HrRole, HrUser, JobPost, JobPostId,
    SubmitRequest, ValidationContext,
};
use std::path::PathBuf;
use std::sync::Arc;

type InMemoryService =
    EndorsementService<InMemoryEndorsementStore, InMemoryBlobStorage, InMemoryNotificationSink>;

#[derive(Args, Debug)]
pub(crate) struct TemplateArgs {
    /// Write the template to this path instead of stdout.
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// CSV file to import (use the template for column names)
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// Job post identifier the applicants are endorsed against
    #[arg(long, default_value = "job-local")]
    pub(crate) job_id: String,
    /// Job post title, applied as every applicant's position
    #[arg(long)]
    pub(crate) job_title: String,
    #[arg(long, default_value = "")]
    pub(crate) department: String,
    #[arg(long, default_value = "")]
    pub(crate) depot: String,
    /// Treat the job post as a driver role (adds license and driving steps)
    #[arg(long)]
    pub(crate) driver: bool,
    /// Attach this résumé to every imported applicant
    #[arg(long)]
    pub(crate) resume: Option<PathBuf>,
    /// Endorse the imported applicants into an in-memory store after validation
    #[arg(long)]
    pub(crate) submit: bool,
    #[arg(long, default_value = "agency-local")]
    pub(crate) agency: String,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    #[arg(long, default_value = "agency-demo")]
    pub(crate) agency: String,
}

pub(crate) fn run_template(args: TemplateArgs) -> Result<(), AppError> {
    match args.output {
        Some(path) => {
            std::fs::write(&path, template_csv())?;
            println!("Template written to {}", path.display());
        }
        None => print!("{}", template_csv()),
    }
    Ok(())
}

pub(crate) async fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let job_post = JobPost {
        id: JobPostId(args.job_id),
        title: args.job_title,
        department: args.department,
        depot: args.depot,
        driver_role: args.driver,
    };

    let store = InMemoryEndorsementStore::default();
    store.register_job(&job_post);
    let service = in_memory_service(&config, AgencyId(args.agency), store);

    let table = service.importer().load_path(&args.file)?;
    let mut session = ApplicantSlots::new(Some(job_post.clone()));
    let touched = session.import_rows(&table.rows);
    println!(
        "Imported {} row(s) from {} into slot(s) {:?}",
        table.rows.len(),
        args.file.display(),
        touched
    );

    let mut slots = session.into_slots();
    if let Some(path) = &args.resume {
        let file = pending_file_from_path(path)?;
        for slot in &mut slots {
            slot.draft.resume = FileRef::Pending(file.clone());
        }
    }

    let ctx = ValidationContext {
        today: service.today(),
        driver_role: job_post.driver_role,
    };
    let ready = render_validation(&slots, &ctx);

    if !args.submit {
        return Ok(());
    }
    if ready < slots.len() {
        println!("\nFix the issues above before submitting.");
        return Ok(());
    }

    let summary = service
        .submit(SubmitRequest {
            job_post: Some(job_post),
            slots,
        })
        .await?;
    render_summary(&summary);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    println!("Agency endorsement demo");

    let demo = demo_batch(&config, AgencyId(args.agency)).await?;
    render_summary(&demo.summary);

    println!("\nStored applications");
    for row in demo.store.applications() {
        println!(
            "  {} {} [{}] endorsed={}",
            row.id.0,
            row.applicant_email().unwrap_or("-"),
            row.status.label(),
            row.endorsed
        );
    }

    println!("\nUploaded documents");
    for path in demo.blobs.paths() {
        println!("  {path}");
    }

    println!("\nHR notifications");
    for notification in demo.notifications.sent() {
        println!("  {} <- {}", notification.user_id, notification.message);
    }
    Ok(())
}

pub(crate) struct DemoBatch {
    pub(crate) summary: BatchSummary,
    pub(crate) store: InMemoryEndorsementStore,
    pub(crate) blobs: InMemoryBlobStorage,
    pub(crate) notifications: InMemoryNotificationSink,
}

/// Import three applicants, one of them an existing employee, and endorse the batch.
pub(crate) async fn demo_batch(
    config: &AppConfig,
    agency: AgencyId,
) -> Result<DemoBatch, AppError> {
    let job_post = JobPost {
        id: JobPostId("job-demo-1".to_string()),
        title: "Warehouse Helper".to_string(),
        department: "Operations".to_string(),
        depot: "Valenzuela".to_string(),
        driver_role: false,
    };

    let store = InMemoryEndorsementStore::default();
    store.register_job(&job_post);
    store.add_employee(EmployeeRecord {
        id: "emp-0042".to_string(),
        email: "ben.cruz@example.com".to_string(),
        name: "Ben Cruz".to_string(),
    });
    store.add_profile_resume("cara.lim@example.com", "profiles/cara-lim/resume.pdf");
    store.add_hr_user(HrUser {
        user_id: "hr-main".to_string(),
        role: HrRole::Hr,
        depot: None,
    });
    store.add_hr_user(HrUser {
        user_id: "hr-valenzuela".to_string(),
        role: HrRole::DepotHr,
        depot: Some("Valenzuela".to_string()),
    });
    store.add_hr_user(HrUser {
        user_id: "hr-pasig".to_string(),
        role: HrRole::DepotHr,
        depot: Some("Pasig".to_string()),
    });

    let blobs = InMemoryBlobStorage::default();
    let notifications = InMemoryNotificationSink::default();
    let service = EndorsementService::from_config(
        config,
        agency,
        Arc::new(store.clone()),
        Arc::new(blobs.clone()),
        Arc::new(notifications.clone()),
    );

    let csv = demo_csv(service.today() + Duration::days(14));
    let table = service.importer().load_bytes("demo.csv", csv.as_bytes())?;
    let mut session = ApplicantSlots::new(Some(job_post.clone()));
    session.import_rows(&table.rows);

    let mut slots = session.into_slots();
    if let Some(first) = slots.first_mut() {
        first.draft.resume = FileRef::Pending(pending_file(
            "ana-reyes-resume.pdf",
            b"%PDF-1.4 demo".to_vec(),
        ));
    }

    let summary = service
        .submit(SubmitRequest {
            job_post: Some(job_post),
            slots,
        })
        .await?;

    Ok(DemoBatch {
        summary,
        store,
        blobs,
        notifications,
    })
}

fn in_memory_service(
    config: &AppConfig,
    agency: AgencyId,
    store: InMemoryEndorsementStore,
) -> InMemoryService {
    EndorsementService::from_config(
        config,
        agency,
        Arc::new(store),
        Arc::new(InMemoryBlobStorage::default()),
        Arc::new(InMemoryNotificationSink::default()),
    )
}

fn demo_csv(start: NaiveDate) -> String {
    let start = start.format("%Y-%m-%d");
    format!(
        "{}\
Ana,Reyes,,ana.reyes@example.com,9171234567,{start},No,1995-04-12,Single,Female,12,Rizal Ave,Malinta,Valenzuela,Metro Manila,1440,College,PUP,BS Accountancy,2016,Inventory|Forklift,,,yes,yes,no,yes,,,,,,,,no,,no,\n\
Ben,Cruz,,Ben.Cruz@Example.com,9181234567,{start},Yes,1990-08-01,Married,Male,,Mabini St,Marulas,Valenzuela,Metro Manila,1440,N/A,,,,Loading,,,yes,no,no,yes,,,,,,,,no,,no,\n\
Cara,Lim,Santos,cara.lim@example.com,09191234567,{start},No,1998-11-30,Single,Female,3B,Luna St,Karuhatan,Valenzuela,Metro Manila,1441,College,FEU,BS Psychology,2019,Recruitment,,,no,yes,yes,yes,,,,,,,,no,,no,\n",
        template_csv()
    )
}

fn render_validation(slots: &[ApplicantSlot], ctx: &ValidationContext) -> usize {
    let mut ready = 0;
    for slot in slots {
        match validate_for_submission(std::slice::from_ref(slot), ctx) {
            Ok(()) => {
                ready += 1;
                println!("  [ok] {} {}", slot.id, slot.name);
            }
            Err(error) => {
                println!(
                    "  [!!] {} {} (step {}: {})",
                    slot.id, slot.name, error.step, error.step_label
                );
                for violation in &error.violations {
                    println!("       - {}: {}", violation.field, violation.message);
                }
            }
        }
    }
    ready
}

fn render_summary(summary: &BatchSummary) {
    println!("\n{}", summary.message);
    for result in &summary.results {
        match (&result.receipt, &result.error) {
            (Some(receipt), _) => println!(
                "  {} {} -> {} ({:?}, {} HR notified)",
                result.slot_id,
                result.name,
                receipt.application_id.0,
                receipt.outcome,
                receipt.notified
            ),
            (None, Some(error)) => println!(
                "  {} {} -> failed: {}",
                result.slot_id, result.name, error.message
            ),
            (None, None) => println!("  {} {} -> no result", result.slot_id, result.name),
        }
    }
}
