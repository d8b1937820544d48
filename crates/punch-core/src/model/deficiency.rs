//! The deficiency record and its lifecycle states.
//!
//! A deficiency is one inspection-item-level defect tracked through
//! remediation. Mutation happens exclusively through the state engine
//! ([`crate::engine`]); this module only defines the persisted shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, str::FromStr};

use super::history::Timeline;
use super::photo::CompletedPhoto;

/// The nine lifecycle states.
///
/// The wire representation is the kebab-case string (`requires-action`,
/// `go-back`, ...). Transitions between states are decided by the engine;
/// no other code path sets a record's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeficiencyState {
    /// Fresh from inspection: awaiting a plan, owner, and due date.
    #[default]
    RequiresAction,
    /// Remediation postponed to a later date.
    Deferred,
    /// Pending, but a progress note is owed before work may complete.
    RequiresProgressUpdate,
    /// Remediation underway inside its due-date window.
    Pending,
    /// Due date elapsed without completion.
    Overdue,
    /// Acknowledged overdue with a reason recorded.
    Incomplete,
    /// Completion evidence supplied for the current window.
    Completed,
    /// Sent back for rework; planning fields are cleared.
    GoBack,
    /// Retired. Terminal.
    Closed,
}

impl DeficiencyState {
    /// All states in lifecycle order.
    pub const ALL: [Self; 9] = [
        Self::RequiresAction,
        Self::Deferred,
        Self::RequiresProgressUpdate,
        Self::Pending,
        Self::Overdue,
        Self::Incomplete,
        Self::Completed,
        Self::GoBack,
        Self::Closed,
    ];

    /// The canonical kebab-case representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequiresAction => "requires-action",
            Self::Deferred => "deferred",
            Self::RequiresProgressUpdate => "requires-progress-update",
            Self::Pending => "pending",
            Self::Overdue => "overdue",
            Self::Incomplete => "incomplete",
            Self::Completed => "completed",
            Self::GoBack => "go-back",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for DeficiencyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a state from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStateError {
    pub got: String,
}

impl fmt::Display for ParseStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid deficiency state: '{}'", self.got)
    }
}

impl std::error::Error for ParseStateError {}

impl FromStr for DeficiencyState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == normalized)
            .ok_or_else(|| ParseStateError { got: s.to_string() })
    }
}

/// One tracked defect arising from an inspection item.
///
/// The `current_*` fields mirror the newest entry of their corresponding
/// timeline; the engine writes both sides together in a single diff so a
/// reader never observes one without the other. Timestamps are unix
/// seconds; absent is `None`, never 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deficiency {
    pub id: String,
    /// Owning inspection. Immutable after creation.
    pub inspection_id: String,
    /// Owning property. Immutable after creation.
    pub property_id: String,
    /// Source inspection item. Immutable after creation.
    pub item_id: String,

    pub title: String,
    pub section_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_section_title: Option<String>,

    pub state: DeficiencyState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_plan_to_fix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_responsibility_group: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::time::lenient_seconds_opt"
    )]
    pub current_due_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_due_date_day: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::time::lenient_seconds_opt"
    )]
    pub current_deferred_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_deferred_date_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_reason_incomplete: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_complete_now_reason: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::time::lenient_seconds_opt"
    )]
    pub current_start_date: Option<i64>,

    /// Side-state computed on the requires-action/go-back -> pending edge;
    /// cleared whenever a progress note is supplied. Not caller-settable.
    pub will_require_progress_note: bool,
    pub is_duplicate: bool,

    pub completed_photos: BTreeMap<String, CompletedPhoto>,

    pub state_history: Timeline<DeficiencyState>,
    pub due_dates: Timeline<i64>,
    pub deferred_dates: Timeline<i64>,
    pub start_dates: Timeline<i64>,
    pub plans_to_fix: Timeline<String>,
    pub responsibility_groups: Timeline<String>,
    pub reasons_incomplete: Timeline<String>,
    pub progress_notes: Timeline<String>,
    pub complete_now_reasons: Timeline<String>,

    #[serde(deserialize_with = "crate::time::lenient_seconds")]
    pub created_at: i64,
    /// Written only when an update actually changed something.
    #[serde(deserialize_with = "crate::time::lenient_seconds")]
    pub updated_at: i64,
}

impl Default for Deficiency {
    fn default() -> Self {
        Self {
            id: String::new(),
            inspection_id: String::new(),
            property_id: String::new(),
            item_id: String::new(),
            title: String::new(),
            section_title: String::new(),
            sub_section_title: None,
            state: DeficiencyState::RequiresAction,
            current_plan_to_fix: None,
            current_responsibility_group: None,
            current_due_date: None,
            current_due_date_day: None,
            current_deferred_date: None,
            current_deferred_date_day: None,
            current_reason_incomplete: None,
            current_complete_now_reason: None,
            current_start_date: None,
            will_require_progress_note: false,
            is_duplicate: false,
            completed_photos: BTreeMap::new(),
            state_history: Timeline::new(),
            due_dates: Timeline::new(),
            deferred_dates: Timeline::new(),
            start_dates: Timeline::new(),
            plans_to_fix: Timeline::new(),
            responsibility_groups: Timeline::new(),
            reasons_incomplete: Timeline::new(),
            progress_notes: Timeline::new(),
            complete_now_reasons: Timeline::new(),
            created_at: 0,
            updated_at: 0,
        }
    }
}

impl Deficiency {
    /// True when a progress note exists for the given remediation window.
    #[must_use]
    pub fn has_progress_note_for(&self, start_date: i64) -> bool {
        self.progress_notes
            .iter()
            .any(|(_, entry)| entry.start_date == Some(start_date))
    }

    /// True when a completed photo exists for the given remediation window.
    #[must_use]
    pub fn has_completed_photo_for(&self, start_date: i64) -> bool {
        self.completed_photos
            .values()
            .any(|photo| photo.start_date == Some(start_date))
    }

    /// The newest progress note, if any were ever written.
    #[must_use]
    pub fn latest_progress_note(&self) -> Option<&str> {
        self.progress_notes.latest_value().map(String::as_str)
    }
}
