use super::common::*;
use crate::workflows::bulk_import::{tokenize, ImportRow};
use crate::workflows::endorsement::domain::{ApplicantDraft, FileRef, RestrictionCode};
use crate::workflows::endorsement::slots::{
    is_blank, is_reusable_for_import, ApplicantSlots, SlotError,
};
use crate::workflows::endorsement::validation::ValidationContext;

#[test]
fn default_draft_is_blank_until_edited_and_blank_again_when_restored() {
    let mut draft = ApplicantDraft::default();
    assert!(is_blank(&draft));

    draft.address.city = "Pasig".to_string();
    assert!(!is_blank(&draft));
    draft.address.city.clear();
    assert!(is_blank(&draft));

    draft.government_ids.has_tin = true;
    assert!(!is_blank(&draft));
    draft.government_ids.has_tin = false;
    assert!(is_blank(&draft));

    draft.driver.restriction_codes.push(RestrictionCode::B);
    assert!(!is_blank(&draft));
    draft.driver.restriction_codes.clear();
    assert!(is_blank(&draft));
}

#[test]
fn job_post_fields_and_whitespace_do_not_count() {
    let mut draft = ApplicantDraft::default();
    job_post().apply_to(&mut draft);
    draft.first_name = "   ".to_string();
    assert!(is_blank(&draft));
}

#[test]
fn attached_files_make_a_draft_non_blank() {
    let draft = ApplicantDraft {
        resume: FileRef::Pending(resume_file()),
        ..ApplicantDraft::default()
    };
    assert!(!is_blank(&draft));
    assert!(is_reusable_for_import(&draft));
}

#[test]
fn reusable_for_import_only_inspects_personal_fields() {
    let mut draft = ApplicantDraft::default();
    draft.skills.push("Welding".to_string());
    draft.education.level = "College".to_string();
    assert!(is_reusable_for_import(&draft));

    draft.birthday = Some(date(1999, 1, 1));
    assert!(!is_reusable_for_import(&draft));
}

fn rows(csv: &str) -> Vec<ImportRow> {
    tokenize(csv).expect("tokenizes").rows
}

#[test]
fn importing_three_rows_reuses_the_blank_first_slot() {
    let mut slots = ApplicantSlots::new(Some(job_post()));
    let touched = slots.import_rows(&rows(
        "firstname,lastname,email\nAna,Reyes,ana@example.com\nBen,Cruz,ben@example.com\nCara,Lim,cara@example.com\n",
    ));

    assert_eq!(touched, vec![1, 2, 3]);
    assert_eq!(slots.slots().len(), 3);
    let names: Vec<&str> = slots.slots().iter().map(|slot| slot.name.as_str()).collect();
    assert_eq!(names, vec!["Ana Reyes", "Ben Cruz", "Cara Lim"]);
    assert_eq!(slots.selected(), 1);
    assert_eq!(slots.step(), 1);
}

#[test]
fn import_skips_partially_filled_slots_and_keeps_their_data() {
    let mut slots = ApplicantSlots::new(Some(job_post()));
    slots
        .update(1, |draft| draft.email = "typed@example.com".to_string())
        .expect("slot exists");
    let second = slots.add_slot();
    slots.select(1).expect("slot exists");

    let touched = slots.import_rows(&rows("firstname,lastname\nDan,Uy\nEli,Go\n"));

    assert_eq!(touched, vec![second, 3]);
    assert_eq!(
        slots.slot(1).expect("kept").draft.email,
        "typed@example.com"
    );
    assert_eq!(slots.slot(3).expect("allocated").name, "Eli Go");
    assert_eq!(slots.selected(), second);
}

#[test]
fn imported_rows_without_full_names_fall_back_to_slot_names() {
    let mut slots = ApplicantSlots::new(None);
    slots.rename(1, "First pick").expect("slot exists");
    let touched = slots.import_rows(&rows(
        "firstname,email\nAna,ana@example.com\nBen,ben@example.com\n",
    ));

    assert_eq!(touched, vec![1, 2]);
    assert_eq!(slots.slot(1).expect("reused").name, "First pick");
    assert_eq!(slots.slot(2).expect("allocated").name, "Employee 2");
}

#[test]
fn csv_cannot_override_the_job_post_position() {
    let mut slots = ApplicantSlots::new(Some(job_post()));
    slots.import_rows(&rows("firstname,lastname,position\nAna,Reyes,Clerk\n"));
    assert_eq!(slots.slot(1).expect("slot").draft.position, "Warehouse Helper");
}

#[test]
fn the_last_slot_cannot_be_removed() {
    let mut slots = ApplicantSlots::new(None);
    assert!(matches!(slots.remove_slot(1), Err(SlotError::LastSlot)));
    assert!(matches!(slots.remove_slot(9), Err(SlotError::UnknownSlot(9))));

    let added = slots.add_slot();
    assert_eq!(added, 2);
    slots.remove_slot(2).expect("removable");
    assert_eq!(slots.selected(), 1);
}

#[test]
fn new_slot_ids_follow_the_highest_id() {
    let mut slots = ApplicantSlots::new(None);
    slots.add_slot();
    slots.add_slot();
    slots.remove_slot(2).expect("removable");
    assert_eq!(slots.add_slot(), 4);
}

#[test]
fn edits_cannot_change_job_post_fields() {
    let mut slots = ApplicantSlots::new(Some(job_post()));
    slots
        .update(1, |draft| {
            draft.department = "Finance".to_string();
            draft.first_name = "Ana".to_string();
        })
        .expect("slot exists");
    let draft = &slots.slot(1).expect("slot").draft;
    assert_eq!(draft.department, "Operations");
    assert_eq!(draft.first_name, "Ana");
}

#[test]
fn wizard_only_advances_past_complete_steps() {
    let mut slots = ApplicantSlots::new(Some(job_post()));
    let ctx = ValidationContext {
        today: today(),
        driver_role: false,
    };

    match slots.next_step(&ctx) {
        Err(SlotError::StepIncomplete { step, violations }) => {
            assert_eq!(step, 1);
            assert!(violations.iter().any(|violation| violation.field == "first_name"));
        }
        other => panic!("expected incomplete step, got {other:?}"),
    }

    let complete = complete_draft("Ana", "Reyes", "ana@example.com");
    slots
        .update(1, |draft| *draft = complete)
        .expect("slot exists");
    assert_eq!(slots.next_step(&ctx).expect("personal complete"), 2);
    assert_eq!(slots.previous_step(), 1);
    assert_eq!(slots.previous_step(), 1);
}

#[test]
fn switching_to_a_shorter_flow_resets_the_step() {
    let mut slots = ApplicantSlots::new(Some(driver_job_post()));
    let mut complete = complete_draft("Ana", "Reyes", "ana@example.com");
    complete.driver.license_classification = "Professional".to_string();
    complete.driver.license_expiry = Some(date(2028, 1, 1));
    complete.driver.restriction_codes = vec![RestrictionCode::B, RestrictionCode::C];
    slots
        .update(1, |draft| *draft = complete)
        .expect("slot exists");
    let ctx = ValidationContext {
        today: today(),
        driver_role: true,
    };
    for expected in 2..=6 {
        assert_eq!(slots.next_step(&ctx).expect("step complete"), expected);
    }
    assert_eq!(slots.slot(1).expect("slot").draft.position, "Delivery Driver");

    slots.set_job_post(Some(job_post()));
    assert_eq!(slots.step(), 1);
    assert_eq!(slots.slot(1).expect("slot").draft.position, "Warehouse Helper");
}
