use std::collections::VecDeque;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::domain::{ApplicantDraft, ApplicantSlot, JobPost};
use super::validation::{step_count, validate_step, ValidationContext, Violation};
use crate::workflows::bulk_import::{map_row, ImportRow};

/// Draft keys owned by the job post rather than the applicant.
const JOB_POST_FIELDS: [&str; 3] = ["department", "position", "depot"];

#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("applicant slot {0} does not exist")]
    UnknownSlot(u32),
    #[error("at least one applicant slot must remain")]
    LastSlot,
    #[error("step {step} has {} unresolved item(s)", .violations.len())]
    StepIncomplete { step: u8, violations: Vec<Violation> },
}

/// True when the draft is indistinguishable from the default record, ignoring the
/// job-post-derived fields.
pub fn is_blank(draft: &ApplicantDraft) -> bool {
    let Ok(Value::Object(mut actual)) = serde_json::to_value(draft) else {
        return false;
    };
    let Value::Object(mut baseline) = default_draft_value().clone() else {
        return false;
    };
    for key in JOB_POST_FIELDS {
        actual.remove(key);
        baseline.remove(key);
    }
    values_match(&Value::Object(actual), &Value::Object(baseline))
}

fn default_draft_value() -> &'static Value {
    static DEFAULT: OnceLock<Value> = OnceLock::new();
    DEFAULT.get_or_init(|| serde_json::to_value(ApplicantDraft::default()).unwrap_or(Value::Null))
}

fn values_match(actual: &Value, baseline: &Value) -> bool {
    match (actual, baseline) {
        (Value::String(left), Value::String(right)) => strings_match(left, right),
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(left, right)| values_match(left, right))
        }
        (Value::Object(left), Value::Object(right)) => left.keys().chain(right.keys()).all(|key| {
            values_match(
                left.get(key).unwrap_or(&Value::Null),
                right.get(key).unwrap_or(&Value::Null),
            )
        }),
        (Value::Null, other) | (other, Value::Null) => is_empty_value(other),
        (left, right) => left == right,
    }
}

/// Trimmed equality, or numeric equality when both sides parse as numbers.
fn strings_match(left: &str, right: &str) -> bool {
    let (left, right) = (left.trim(), right.trim());
    if left == right {
        return true;
    }
    match (left.parse::<f64>(), right.parse::<f64>()) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Looser check used by CSV import: only personal, contact and address fields count.
/// Attached files and job-post fields do not stop a slot from being reused.
pub fn is_reusable_for_import(draft: &ApplicantDraft) -> bool {
    let address = &draft.address;
    let texts = [
        &draft.first_name,
        &draft.middle_name,
        &draft.last_name,
        &draft.contact_number,
        &draft.email,
        &address.unit_house_number,
        &address.street,
        &address.barangay,
        &address.city,
        &address.province,
        &address.zip,
    ];

    texts.iter().all(|value| value.trim().is_empty())
        && draft.birthday.is_none()
        && draft.available_start_date.is_none()
}

fn default_slot_name(id: u32) -> String {
    format!("Employee {id}")
}

/// Editable set of applicant slots for one endorsement session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantSlots {
    slots: Vec<ApplicantSlot>,
    job_post: Option<JobPost>,
    selected: u32,
    step: u8,
}

impl ApplicantSlots {
    pub fn new(job_post: Option<JobPost>) -> Self {
        let mut slots = Self {
            slots: Vec::new(),
            job_post,
            selected: 1,
            step: 1,
        };
        let draft = slots.default_draft();
        slots.slots.push(ApplicantSlot {
            id: 1,
            name: default_slot_name(1),
            draft,
        });
        slots
    }

    /// Rebuild a session from slots held by a client. Job-post fields are re-applied.
    pub fn from_slots(mut slots: Vec<ApplicantSlot>, job_post: Option<JobPost>) -> Self {
        if slots.is_empty() {
            return Self::new(job_post);
        }
        slots.sort_by_key(|slot| slot.id);
        slots.dedup_by_key(|slot| slot.id);
        if let Some(job_post) = &job_post {
            for slot in &mut slots {
                job_post.apply_to(&mut slot.draft);
            }
        }
        let selected = slots[0].id;
        Self {
            slots,
            job_post,
            selected,
            step: 1,
        }
    }

    pub fn slots(&self) -> &[ApplicantSlot] {
        &self.slots
    }

    pub fn into_slots(self) -> Vec<ApplicantSlot> {
        self.slots
    }

    pub fn slot(&self, id: u32) -> Option<&ApplicantSlot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    pub fn job_post(&self) -> Option<&JobPost> {
        self.job_post.as_ref()
    }

    pub fn driver_role(&self) -> bool {
        self.job_post
            .as_ref()
            .map(|job_post| job_post.driver_role)
            .unwrap_or(false)
    }

    pub fn selected(&self) -> u32 {
        self.selected
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    /// The empty record with the active job post applied.
    pub fn default_draft(&self) -> ApplicantDraft {
        let mut draft = ApplicantDraft::default();
        if let Some(job_post) = &self.job_post {
            job_post.apply_to(&mut draft);
        }
        draft
    }

    fn next_id(&self) -> u32 {
        self.slots.iter().map(|slot| slot.id).max().unwrap_or(0) + 1
    }

    fn position(&self, id: u32) -> Result<usize, SlotError> {
        self.slots
            .iter()
            .position(|slot| slot.id == id)
            .ok_or(SlotError::UnknownSlot(id))
    }

    pub fn add_slot(&mut self) -> u32 {
        let id = self.next_id();
        let draft = self.default_draft();
        self.slots.push(ApplicantSlot {
            id,
            name: default_slot_name(id),
            draft,
        });
        self.selected = id;
        self.step = 1;
        id
    }

    pub fn remove_slot(&mut self, id: u32) -> Result<(), SlotError> {
        let index = self.position(id)?;
        if self.slots.len() == 1 {
            return Err(SlotError::LastSlot);
        }
        self.slots.remove(index);
        if self.selected == id {
            self.selected = self.slots[index.min(self.slots.len() - 1)].id;
            self.step = 1;
        }
        Ok(())
    }

    pub fn select(&mut self, id: u32) -> Result<(), SlotError> {
        self.position(id)?;
        if self.selected != id {
            self.selected = id;
            self.step = 1;
        }
        Ok(())
    }

    pub fn rename(&mut self, id: u32, name: impl Into<String>) -> Result<(), SlotError> {
        let index = self.position(id)?;
        let name = name.into();
        self.slots[index].name = if name.trim().is_empty() {
            default_slot_name(id)
        } else {
            name.trim().to_string()
        };
        Ok(())
    }

    /// Edit a draft in place; job-post fields are restored afterwards.
    pub fn update<F>(&mut self, id: u32, edit: F) -> Result<(), SlotError>
    where
        F: FnOnce(&mut ApplicantDraft),
    {
        let index = self.position(id)?;
        let draft = &mut self.slots[index].draft;
        edit(draft);
        if let Some(job_post) = &self.job_post {
            job_post.apply_to(draft);
        }
        Ok(())
    }

    pub fn set_job_post(&mut self, job_post: Option<JobPost>) {
        self.job_post = job_post;
        if let Some(job_post) = &self.job_post {
            for slot in &mut self.slots {
                job_post.apply_to(&mut slot.draft);
            }
        }
        if self.step > step_count(self.driver_role()) {
            self.step = 1;
        }
    }

    /// Advance the wizard when the selected slot's current step is complete.
    pub fn next_step(&mut self, ctx: &ValidationContext) -> Result<u8, SlotError> {
        let index = self.position(self.selected)?;
        let violations = validate_step(self.step, &self.slots[index].draft, ctx);
        if !violations.is_empty() {
            return Err(SlotError::StepIncomplete {
                step: self.step,
                violations,
            });
        }
        self.step = (self.step + 1).min(step_count(ctx.driver_role));
        Ok(self.step)
    }

    pub fn previous_step(&mut self) -> u8 {
        self.step = self.step.saturating_sub(1).max(1);
        self.step
    }

    /// Merge imported rows into the session, reusing untouched slots before allocating
    /// new ones. Returns the ids written, in row order.
    pub fn import_rows(&mut self, rows: &[ImportRow]) -> Vec<u32> {
        let mut reusable: VecDeque<u32> = self
            .slots
            .iter()
            .filter(|slot| is_reusable_for_import(&slot.draft))
            .map(|slot| slot.id)
            .collect();
        let reused_available = reusable.len();
        let mut touched = Vec::with_capacity(rows.len());

        for row in rows {
            let id = reusable.pop_front().unwrap_or_else(|| self.next_id());

            match self.slots.iter().position(|slot| slot.id == id) {
                Some(index) => {
                    let draft = map_row(row, &self.slots[index].draft, self.job_post.as_ref());
                    let slot = &mut self.slots[index];
                    if let Some(name) = draft.display_name() {
                        slot.name = name;
                    }
                    slot.draft = draft;
                }
                None => {
                    let draft = map_row(row, &self.default_draft(), self.job_post.as_ref());
                    let name = draft
                        .display_name()
                        .unwrap_or_else(|| default_slot_name(id));
                    self.slots.push(ApplicantSlot { id, name, draft });
                }
            }
            touched.push(id);
        }

        if let Some(first) = touched.first() {
            self.selected = *first;
            self.step = 1;
        }

        info!(
            rows = rows.len(),
            reused = reused_available.min(rows.len()),
            total_slots = self.slots.len(),
            "merged imported applicants into slots"
        );
        touched
    }
}
