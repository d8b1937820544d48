//! The engine's output: a field-level diff for one deficiency.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::changes::Apply;
use crate::model::{CompletedPhoto, Deficiency, DeficiencyState, HistoryEntry};

/// Everything one `compute_update` call wants persisted.
///
/// Current-value cells and their freshly appended history entries travel
/// together; a store's `apply_diff` must write the whole diff atomically
/// so a reader never observes a `current_*` value without its ledger
/// entry, or vice versa. [`DeficiencyDiff::apply_to`] is the in-memory
/// reference for that write.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeficiencyDiff {
    /// Present only when the resolved state differs from the record's.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<DeficiencyState>,

    #[serde(skip_serializing_if = "Apply::is_keep")]
    pub current_plan_to_fix: Apply<String>,
    #[serde(skip_serializing_if = "Apply::is_keep")]
    pub current_responsibility_group: Apply<String>,
    #[serde(skip_serializing_if = "Apply::is_keep")]
    pub current_due_date: Apply<i64>,
    #[serde(skip_serializing_if = "Apply::is_keep")]
    pub current_due_date_day: Apply<String>,
    #[serde(skip_serializing_if = "Apply::is_keep")]
    pub current_deferred_date: Apply<i64>,
    #[serde(skip_serializing_if = "Apply::is_keep")]
    pub current_deferred_date_day: Apply<String>,
    #[serde(skip_serializing_if = "Apply::is_keep")]
    pub current_reason_incomplete: Apply<String>,
    #[serde(skip_serializing_if = "Apply::is_keep")]
    pub current_complete_now_reason: Apply<String>,
    #[serde(skip_serializing_if = "Apply::is_keep")]
    pub current_start_date: Apply<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub will_require_progress_note: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_duplicate: Option<bool>,

    // Freshly appended ledger entries, keyed by generated entry id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub state_history: BTreeMap<String, HistoryEntry<DeficiencyState>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub due_dates: BTreeMap<String, HistoryEntry<i64>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub deferred_dates: BTreeMap<String, HistoryEntry<i64>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub start_dates: BTreeMap<String, HistoryEntry<i64>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub plans_to_fix: BTreeMap<String, HistoryEntry<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub responsibility_groups: BTreeMap<String, HistoryEntry<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub reasons_incomplete: BTreeMap<String, HistoryEntry<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub progress_notes: BTreeMap<String, HistoryEntry<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub complete_now_reasons: BTreeMap<String, HistoryEntry<String>>,

    /// New or replaced photo entries, merged into the record by id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub completed_photos: BTreeMap<String, CompletedPhoto>,

    /// Stamped iff anything above is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl DeficiencyDiff {
    /// True when the update decided nothing. `updated_at` is ignored: it
    /// is derived from this very predicate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.current_plan_to_fix.is_keep()
            && self.current_responsibility_group.is_keep()
            && self.current_due_date.is_keep()
            && self.current_due_date_day.is_keep()
            && self.current_deferred_date.is_keep()
            && self.current_deferred_date_day.is_keep()
            && self.current_reason_incomplete.is_keep()
            && self.current_complete_now_reason.is_keep()
            && self.current_start_date.is_keep()
            && self.will_require_progress_note.is_none()
            && self.is_duplicate.is_none()
            && self.state_history.is_empty()
            && self.due_dates.is_empty()
            && self.deferred_dates.is_empty()
            && self.start_dates.is_empty()
            && self.plans_to_fix.is_empty()
            && self.responsibility_groups.is_empty()
            && self.reasons_incomplete.is_empty()
            && self.progress_notes.is_empty()
            && self.complete_now_reasons.is_empty()
            && self.completed_photos.is_empty()
    }

    /// Apply the whole diff to an in-memory record as one unit.
    pub fn apply_to(&self, record: &mut Deficiency) {
        if let Some(state) = self.state {
            record.state = state;
        }

        self.current_plan_to_fix.write_to(&mut record.current_plan_to_fix);
        self.current_responsibility_group
            .write_to(&mut record.current_responsibility_group);
        self.current_due_date.write_to(&mut record.current_due_date);
        self.current_due_date_day
            .write_to(&mut record.current_due_date_day);
        self.current_deferred_date
            .write_to(&mut record.current_deferred_date);
        self.current_deferred_date_day
            .write_to(&mut record.current_deferred_date_day);
        self.current_reason_incomplete
            .write_to(&mut record.current_reason_incomplete);
        self.current_complete_now_reason
            .write_to(&mut record.current_complete_now_reason);
        self.current_start_date
            .write_to(&mut record.current_start_date);

        if let Some(flag) = self.will_require_progress_note {
            record.will_require_progress_note = flag;
        }
        if let Some(flag) = self.is_duplicate {
            record.is_duplicate = flag;
        }

        record.state_history.extend_from(&self.state_history);
        record.due_dates.extend_from(&self.due_dates);
        record.deferred_dates.extend_from(&self.deferred_dates);
        record.start_dates.extend_from(&self.start_dates);
        record.plans_to_fix.extend_from(&self.plans_to_fix);
        record
            .responsibility_groups
            .extend_from(&self.responsibility_groups);
        record
            .reasons_incomplete
            .extend_from(&self.reasons_incomplete);
        record.progress_notes.extend_from(&self.progress_notes);
        record
            .complete_now_reasons
            .extend_from(&self.complete_now_reasons);

        for (photo_id, photo) in &self.completed_photos {
            record
                .completed_photos
                .insert(photo_id.clone(), photo.clone());
        }

        if let Some(ts) = self.updated_at {
            record.updated_at = ts;
        }
    }
}
