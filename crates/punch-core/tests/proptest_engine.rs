//! Property tests for the state engine: determinism, append-only history,
//! sweep idempotence, and bookkeeping invariants.

use proptest::prelude::*;

use punch_core::engine::UpdateRequest;
use punch_core::entry_id::SequentialEntryIds;
use punch_core::Engine;

use generators::{arb_changes, arb_now, arb_record};

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(2000))]

    /// Same inputs and a fixed id source produce identical diffs.
    #[test]
    fn engine_is_deterministic(record in arb_record(), changes in arb_changes(), now in arb_now()) {
        let req = UpdateRequest { changes, now, ..UpdateRequest::default() };

        let first = Engine::with_ids(SequentialEntryIds::new("e")).compute_update(&record, &req);
        let second = Engine::with_ids(SequentialEntryIds::new("e")).compute_update(&record, &req);
        prop_assert_eq!(first, second);
    }

    /// Applying a diff only ever grows each timeline.
    #[test]
    fn history_is_append_only(record in arb_record(), changes in arb_changes(), now in arb_now()) {
        let req = UpdateRequest { changes, now, ..UpdateRequest::default() };
        let diff = Engine::with_ids(SequentialEntryIds::new("e")).compute_update(&record, &req);

        let mut updated = record.clone();
        diff.apply_to(&mut updated);

        prop_assert!(updated.state_history.contains_all(&record.state_history));
        prop_assert!(updated.due_dates.contains_all(&record.due_dates));
        prop_assert!(updated.deferred_dates.contains_all(&record.deferred_dates));
        prop_assert!(updated.start_dates.contains_all(&record.start_dates));
        prop_assert!(updated.plans_to_fix.contains_all(&record.plans_to_fix));
        prop_assert!(updated.responsibility_groups.contains_all(&record.responsibility_groups));
        prop_assert!(updated.reasons_incomplete.contains_all(&record.reasons_incomplete));
        prop_assert!(updated.progress_notes.contains_all(&record.progress_notes));
        prop_assert!(updated.complete_now_reasons.contains_all(&record.complete_now_reasons));
    }

    /// A time-only evaluation settles in one pass: applying its diff and
    /// re-evaluating at the same instant decides nothing further.
    #[test]
    fn time_only_evaluation_is_idempotent(record in arb_record(), now in arb_now()) {
        let req = UpdateRequest { now, ..UpdateRequest::default() };

        let mut engine = Engine::with_ids(SequentialEntryIds::new("e"));
        let first = engine.compute_update(&record, &req);

        let mut updated = record.clone();
        first.apply_to(&mut updated);

        let second = engine.compute_update(&updated, &req);
        prop_assert!(second.is_empty(), "second pass produced {second:?}");
    }

    /// `updated_at` is stamped exactly when something changed.
    #[test]
    fn updated_at_tracks_emptiness(record in arb_record(), changes in arb_changes(), now in arb_now()) {
        let req = UpdateRequest { changes, now, ..UpdateRequest::default() };
        let diff = Engine::with_ids(SequentialEntryIds::new("e")).compute_update(&record, &req);

        prop_assert_eq!(diff.updated_at.is_some(), !diff.is_empty());
        if let Some(ts) = diff.updated_at {
            prop_assert_eq!(ts, now);
        }
    }

    /// The diff never re-states the record's existing state.
    #[test]
    fn diff_state_always_differs(record in arb_record(), changes in arb_changes(), now in arb_now()) {
        let req = UpdateRequest { changes, now, ..UpdateRequest::default() };
        let diff = Engine::with_ids(SequentialEntryIds::new("e")).compute_update(&record, &req);

        if let Some(next) = diff.state {
            prop_assert_ne!(next, record.state);
            // Every transition is recorded in the ledger.
            prop_assert_eq!(diff.state_history.len(), 1);
        } else {
            prop_assert!(diff.state_history.is_empty());
        }
    }
}
