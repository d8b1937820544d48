//! Change-notification emission.
//!
//! Every state change discovered by a sweep produces one
//! [`StateChangeEvent`]; delivery (chat, webhooks, a notifications table)
//! is the embedder's concern behind the [`Notifier`] trait.

use anyhow::Result;
use serde::Serialize;

use punch_core::engine::DeficiencyDiff;
use punch_core::model::{Deficiency, DeficiencyState};

/// A human-readable record of one state change.
///
/// Current values are the post-update ones: what a reader of the record
/// would see after the diff lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateChangeEvent {
    pub deficiency_id: String,
    pub property_id: String,
    pub title: String,
    pub section_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_section_title: Option<String>,
    pub previous_state: DeficiencyState,
    pub new_state: DeficiencyState,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_plan_to_fix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_responsibility_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_due_date_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_deferred_date_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_progress_note: Option<String>,
}

impl StateChangeEvent {
    /// Build the event for a transition, resolving current values through
    /// the diff that is about to be (or was just) persisted.
    #[must_use]
    pub fn for_transition(
        record: &Deficiency,
        new_state: DeficiencyState,
        diff: &DeficiencyDiff,
    ) -> Self {
        let latest_progress_note = diff
            .progress_notes
            .values()
            .max_by_key(|entry| entry.created_at)
            .map(|entry| entry.value.clone())
            .or_else(|| record.latest_progress_note().map(str::to_string));

        Self {
            deficiency_id: record.id.clone(),
            property_id: record.property_id.clone(),
            title: record.title.clone(),
            section_title: record.section_title.clone(),
            sub_section_title: record.sub_section_title.clone(),
            previous_state: record.state,
            new_state,
            summary: format!("moved from {} to {}", record.state, new_state),
            current_plan_to_fix: diff
                .current_plan_to_fix
                .effective(record.current_plan_to_fix.as_ref())
                .cloned(),
            current_responsibility_group: diff
                .current_responsibility_group
                .effective(record.current_responsibility_group.as_ref())
                .cloned(),
            current_due_date_day: diff
                .current_due_date_day
                .effective(record.current_due_date_day.as_ref())
                .cloned(),
            current_deferred_date_day: diff
                .current_deferred_date_day
                .effective(record.current_deferred_date_day.as_ref())
                .cloned(),
            latest_progress_note,
        }
    }
}

/// Sink for change notifications.
pub trait Notifier {
    /// # Errors
    ///
    /// Returns an error when the event cannot be recorded; the sweep logs
    /// and continues.
    fn emit(&self, event: &StateChangeEvent) -> Result<()>;
}

/// Reference notifier: structured log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn emit(&self, event: &StateChangeEvent) -> Result<()> {
        tracing::info!(
            deficiency = %event.deficiency_id,
            property = %event.property_id,
            title = %event.title,
            from = %event.previous_state,
            to = %event.new_state,
            "deficiency state changed"
        );
        Ok(())
    }
}
