//! The deficiency state engine.
//!
//! [`Engine::compute_update`] is the single mutation path for a
//! deficiency: given the current record, a requested change set, and the
//! caller's clock, it decides the next lifecycle state and produces the
//! exact field updates to persist — current values, freshly appended
//! history entries, flags, photo merges, and the `updated_at` stamp —
//! as one [`DeficiencyDiff`].
//!
//! The computation is a fold over a fixed, ordered list of pure steps.
//! Each step contributes only diff fields no earlier step decided, which
//! is what lets the go-back clears run before the requested-field setters
//! without being overwritten by them. No I/O happens here and the clock
//! is always the caller's `now`; the only injected effect is the entry-id
//! source, so a deterministic source makes the whole engine deterministic.
//!
//! An empty diff is a no-op, not an error: it means no rule fired.

pub mod changes;
pub mod diff;
mod steps;

pub use changes::{Apply, DeficiencyChanges};
pub use diff::DeficiencyDiff;

use std::collections::BTreeMap;

use crate::config::Tuning;
use crate::entry_id::{EntryIdSource, RandomEntryIds};
use crate::model::{CompletedPhoto, Deficiency};

/// One update call: the requested changes plus call metadata.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    pub changes: DeficiencyChanges,
    /// Author recorded on appended history entries.
    pub author: Option<String>,
    /// The caller's clock, unix seconds. Never read internally.
    pub now: i64,
    /// A progress note to append; also clears the owed-note flag.
    pub progress_note: Option<String>,
    /// Completed-photo entries to merge in by id.
    pub photos: Option<BTreeMap<String, CompletedPhoto>>,
}

/// Immutable inputs every step reads.
pub(crate) struct StepCtx<'a> {
    pub current: &'a Deficiency,
    pub req: &'a UpdateRequest,
    pub tuning: &'a Tuning,
}

type Step<I> = fn(&StepCtx<'_>, &mut I, DeficiencyDiff) -> DeficiencyDiff;

/// The state engine: tuning thresholds plus an injected entry-id source.
#[derive(Debug)]
pub struct Engine<I = RandomEntryIds> {
    ids: I,
    tuning: Tuning,
}

impl Engine<RandomEntryIds> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ids(RandomEntryIds::new())
    }
}

impl Default for Engine<RandomEntryIds> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: EntryIdSource> Engine<I> {
    /// Build an engine around a specific id source (deterministic sources
    /// make `compute_update` fully deterministic).
    #[must_use]
    pub fn with_ids(ids: I) -> Self {
        Self {
            ids,
            tuning: Tuning::default(),
        }
    }

    /// Replace the default thresholds.
    #[must_use]
    pub fn tuned(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Compute the diff for one update call. Pure apart from id minting;
    /// never fails for well-typed input.
    pub fn compute_update(&mut self, current: &Deficiency, req: &UpdateRequest) -> DeficiencyDiff {
        let ctx = StepCtx {
            current,
            req,
            tuning: &self.tuning,
        };

        let pipeline: [Step<I>; 7] = [
            steps::resolve_state,
            steps::clear_on_go_back,
            steps::set_requested_fields,
            steps::flag_progress_note,
            steps::append_history,
            steps::merge_photos,
            steps::stamp_updated_at,
        ];

        let diff = pipeline
            .iter()
            .fold(DeficiencyDiff::default(), |acc, step| {
                step(&ctx, &mut self.ids, acc)
            });

        tracing::trace!(
            deficiency = %current.id,
            from = %current.state,
            to = ?diff.state,
            empty = diff.is_empty(),
            "computed update"
        );
        diff
    }
}
