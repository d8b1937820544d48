//! Sweep eligibility.
//!
//! The single source of truth for which states the overdue sweep fetches
//! and re-evaluates. The engine's automatic-overdue rule consults the same
//! set, so the two can never drift apart. Overdue itself is a member: an
//! already-overdue record re-evaluates to an empty diff, which is what
//! makes a repeated sweep idempotent.

use crate::model::{Deficiency, DeficiencyState};

/// States the sweep driver fetches and the engine may auto-transition to
/// overdue from.
pub const SWEEP_ELIGIBLE: [DeficiencyState; 6] = [
    DeficiencyState::RequiresAction,
    DeficiencyState::Pending,
    DeficiencyState::Deferred,
    DeficiencyState::GoBack,
    DeficiencyState::RequiresProgressUpdate,
    DeficiencyState::Overdue,
];

#[must_use]
pub fn is_sweep_eligible(state: DeficiencyState) -> bool {
    SWEEP_ELIGIBLE.contains(&state)
}

/// Whether the sweep should request a pending -> requires-progress-update
/// transition for this record at `now`.
///
/// Fires once the record owes a progress note (`will_require_progress_note`
/// set, none recorded for the current window) and `now` has passed the
/// midpoint of the start-date -> due-date window.
#[must_use]
pub fn needs_progress_update(deficiency: &Deficiency, now: i64) -> bool {
    if deficiency.state != DeficiencyState::Pending || !deficiency.will_require_progress_note {
        return false;
    }
    let (Some(start), Some(due)) = (
        deficiency.current_start_date,
        deficiency.current_due_date,
    ) else {
        return false;
    };
    if due <= start || deficiency.has_progress_note_for(start) {
        return false;
    }

    now >= start + (due - start) / 2
}

#[cfg(test)]
mod tests {
    use super::{SWEEP_ELIGIBLE, is_sweep_eligible, needs_progress_update};
    use crate::model::{Deficiency, DeficiencyState, HistoryEntry};

    fn pending_record(start: i64, due: i64) -> Deficiency {
        Deficiency {
            state: DeficiencyState::Pending,
            will_require_progress_note: true,
            current_start_date: Some(start),
            current_due_date: Some(due),
            ..Deficiency::default()
        }
    }

    #[test]
    fn eligible_set_covers_in_flight_states() {
        for state in SWEEP_ELIGIBLE {
            assert!(is_sweep_eligible(state), "{state} must be eligible");
        }
        assert!(!is_sweep_eligible(DeficiencyState::Closed));
        assert!(!is_sweep_eligible(DeficiencyState::Completed));
        assert!(!is_sweep_eligible(DeficiencyState::Incomplete));
    }

    #[test]
    fn progress_update_fires_past_the_window_midpoint() {
        let record = pending_record(1_000, 11_000);
        assert!(!needs_progress_update(&record, 5_999));
        assert!(needs_progress_update(&record, 6_000));
        assert!(needs_progress_update(&record, 10_500));
    }

    #[test]
    fn progress_update_requires_the_flag() {
        let mut record = pending_record(1_000, 11_000);
        record.will_require_progress_note = false;
        assert!(!needs_progress_update(&record, 10_000));
    }

    #[test]
    fn progress_update_skips_non_pending_states() {
        let mut record = pending_record(1_000, 11_000);
        record.state = DeficiencyState::Overdue;
        assert!(!needs_progress_update(&record, 10_000));
    }

    #[test]
    fn progress_update_skips_records_with_a_note_for_the_window() {
        let mut record = pending_record(1_000, 11_000);
        record.progress_notes.insert("n1", HistoryEntry {
            created_at: 6_500,
            value: "on it".to_string(),
            start_date: Some(1_000),
            user: None,
        });
        assert!(!needs_progress_update(&record, 10_000));

        // A note from an earlier window does not count.
        let mut stale = pending_record(1_000, 11_000);
        stale.progress_notes.insert("n0", HistoryEntry {
            created_at: 500,
            value: "old window".to_string(),
            start_date: Some(400),
            user: None,
        });
        assert!(needs_progress_update(&stale, 10_000));
    }

    #[test]
    fn progress_update_needs_a_sane_window() {
        let mut record = pending_record(1_000, 11_000);
        record.current_start_date = None;
        assert!(!needs_progress_update(&record, 10_000));

        let inverted = pending_record(11_000, 1_000);
        assert!(!needs_progress_update(&inverted, 12_000));
    }
}
