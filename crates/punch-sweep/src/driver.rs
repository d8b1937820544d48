//! The overdue/progress sweep.
//!
//! One [`Sweep::run`] pass: fetch every sweep-eligible record, re-evaluate
//! each against `now` with the engine, persist the non-empty diffs, then
//! fan out the side effects — property aggregate recomputation
//! (deduplicated per property) and change notifications — as best-effort
//! batches after the per-record loop.
//!
//! Failure posture: only the fetch is fatal. A record whose persist fails
//! is logged and skipped; a failed recompute or notification is logged
//! and never rolls back the state change it trails (state transitions are
//! the source of truth, downstream effects are best-effort).

use std::collections::BTreeSet;

use punch_core::classify::{self, SWEEP_ELIGIBLE};
use punch_core::engine::{DeficiencyChanges, UpdateRequest};
use punch_core::entry_id::{EntryIdSource, RandomEntryIds};
use punch_core::model::DeficiencyState;
use punch_core::Engine;

use crate::error::SweepError;
use crate::notify::{Notifier, StateChangeEvent};
use crate::store::{DeficiencyStore, MetaRecomputer};

/// One record's transition, as observed by a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepOutcome {
    pub deficiency_id: String,
    pub property_id: String,
    pub previous_state: DeficiencyState,
    pub new_state: DeficiencyState,
}

/// The sweep driver: boundaries in, outcomes out.
pub struct Sweep<'a, I = RandomEntryIds> {
    store: &'a dyn DeficiencyStore,
    meta: &'a dyn MetaRecomputer,
    notifier: &'a dyn Notifier,
    engine: Engine<I>,
}

impl<'a> Sweep<'a, RandomEntryIds> {
    #[must_use]
    pub fn new(
        store: &'a dyn DeficiencyStore,
        meta: &'a dyn MetaRecomputer,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self::with_engine(store, meta, notifier, Engine::new())
    }
}

impl<'a, I: EntryIdSource> Sweep<'a, I> {
    #[must_use]
    pub fn with_engine(
        store: &'a dyn DeficiencyStore,
        meta: &'a dyn MetaRecomputer,
        notifier: &'a dyn Notifier,
        engine: Engine<I>,
    ) -> Self {
        Self {
            store,
            meta,
            notifier,
            engine,
        }
    }

    /// Run one pass at `now` (unix seconds).
    ///
    /// Results are best-effort, not all-or-nothing: records whose persist
    /// failed are absent from the returned outcomes.
    ///
    /// # Errors
    ///
    /// Only [`SweepError::Fetch`] — the eligible-record load failed and
    /// nothing was evaluated.
    pub fn run(&mut self, now: i64) -> Result<Vec<SweepOutcome>, SweepError> {
        let records = self
            .store
            .load_eligible(&SWEEP_ELIGIBLE)
            .map_err(SweepError::Fetch)?;
        tracing::debug!(fetched = records.len(), "sweep pass starting");

        let mut outcomes = Vec::new();
        let mut stale_properties = BTreeSet::new();
        let mut events = Vec::new();

        for record in &records {
            let mut changes = DeficiencyChanges::default();
            if classify::needs_progress_update(record, now) {
                changes.state = Some(DeficiencyState::RequiresProgressUpdate);
            }
            let req = UpdateRequest {
                changes,
                now,
                ..UpdateRequest::default()
            };

            let diff = self.engine.compute_update(record, &req);
            if diff.is_empty() {
                continue;
            }

            if let Err(err) = self.store.apply_diff(&record.id, &diff) {
                tracing::warn!(
                    deficiency = %record.id,
                    error = %err,
                    "persist failed, skipping record"
                );
                continue;
            }

            let Some(new_state) = diff.state else {
                continue;
            };

            if new_state == DeficiencyState::Overdue {
                stale_properties.insert(record.property_id.clone());
            }
            events.push(StateChangeEvent::for_transition(record, new_state, &diff));
            outcomes.push(SweepOutcome {
                deficiency_id: record.id.clone(),
                property_id: record.property_id.clone(),
                previous_state: record.state,
                new_state,
            });
        }

        for property_id in &stale_properties {
            if let Err(err) = self.meta.recompute(property_id) {
                tracing::warn!(property = %property_id, error = %err, "aggregate recompute failed");
            }
        }

        for event in &events {
            if let Err(err) = self.notifier.emit(event) {
                tracing::warn!(
                    deficiency = %event.deficiency_id,
                    error = %err,
                    "notification emit failed"
                );
            }
        }

        tracing::info!(
            scanned = records.len(),
            transitioned = outcomes.len(),
            properties = stale_properties.len(),
            "sweep complete"
        );
        Ok(outcomes)
    }
}
