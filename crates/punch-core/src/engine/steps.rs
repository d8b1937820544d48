//! The ordered transformation steps behind `compute_update`.
//!
//! Each step reads the immutable context plus the diff accumulated so far
//! and contributes only fields no earlier step decided. Order matters:
//! state resolution comes first, go-back clears must land before the
//! requested-field setters (so a setter cannot resurrect a cleared
//! field), and history appends read the settled cells.

use std::collections::BTreeMap;

use super::StepCtx;
use super::changes::Apply;
use super::diff::DeficiencyDiff;
use crate::classify;
use crate::entry_id::EntryIdSource;
use crate::model::{Deficiency, DeficiencyState, HistoryEntry};
use crate::time::{calendar_days_between, day_string, present};

pub(super) fn resolve_state<I>(
    ctx: &StepCtx<'_>,
    _ids: &mut I,
    mut diff: DeficiencyDiff,
) -> DeficiencyDiff {
    if let Some(next) = next_state(ctx) {
        if next != ctx.current.state {
            diff.state = Some(next);
        }
    }
    diff
}

/// First matching rule wins. An edge counts as requested either by an
/// explicit target state or — when no target state was named — by the
/// caller supplying that edge's trigger fields (saving a plan/owner/due
/// date requests pending, a deferred date requests deferral, completion
/// evidence requests completion, a reason requests incomplete). An
/// explicit request always wins over implicit triggers. Only overdue
/// fires with no request at all.
fn next_state(ctx: &StepCtx<'_>) -> Option<DeficiencyState> {
    use DeficiencyState as S;

    let current = ctx.current;
    let changes = &ctx.req.changes;
    let requested = changes.state;
    let now = ctx.req.now;
    let implicit = requested.is_none();

    match current.state {
        S::RequiresAction | S::GoBack => {
            let wants_pending = requested == Some(S::Pending)
                || (implicit
                    && (changes.current_plan_to_fix.is_some()
                        || changes.current_responsibility_group.is_some()
                        || changes.current_due_date.is_some()));
            if wants_pending {
                let plan = changes.current_plan_to_fix.is_some()
                    || current.current_plan_to_fix.is_some();
                let group = changes.current_responsibility_group.is_some()
                    || current.current_responsibility_group.is_some();
                if plan
                    && group
                    && clears_lead(effective_due(ctx), now, ctx.tuning.pending_lead_secs)
                {
                    return Some(S::Pending);
                }
            }
        }
        S::RequiresProgressUpdate => {
            let wants_pending = requested == Some(S::Pending)
                || (implicit && ctx.req.progress_note.is_some());
            if wants_pending
                && (ctx.req.progress_note.is_some() || window_evidence_exists(current))
            {
                return Some(S::Pending);
            }
        }
        _ => {}
    }

    let wants_deferred = requested == Some(S::Deferred)
        || (implicit && changes.current_deferred_date.is_some());
    if wants_deferred
        && matches!(current.state, S::RequiresAction | S::GoBack | S::Pending)
        && clears_lead(effective_deferred(ctx), now, ctx.tuning.pending_lead_secs)
    {
        return Some(S::Deferred);
    }

    if requested == Some(S::GoBack)
        && matches!(current.state, S::Deferred | S::Incomplete | S::Completed)
    {
        return Some(S::GoBack);
    }

    if requested == Some(S::Closed)
        && matches!(
            current.state,
            S::RequiresAction | S::Incomplete | S::Deferred | S::Completed
        )
    {
        return Some(S::Closed);
    }

    // Driver-requested; not a user-facing edge.
    if requested == Some(S::RequiresProgressUpdate) && current.state == S::Pending {
        return Some(S::RequiresProgressUpdate);
    }

    let wants_incomplete = requested == Some(S::Incomplete)
        || (implicit && changes.current_reason_incomplete.is_some());
    if wants_incomplete
        && current.state == S::Overdue
        && (changes.current_reason_incomplete.is_some()
            || current.current_reason_incomplete.is_some())
    {
        return Some(S::Incomplete);
    }

    let wants_completed =
        requested == Some(S::Completed) || (implicit && ctx.req.photos.is_some());
    if wants_completed && current.state == S::Pending && completion_photo_exists(ctx) {
        return Some(S::Completed);
    }

    // Automatic: a set due date that has elapsed flips any eligible
    // record to overdue. A record with no due date never auto-overdues.
    if classify::is_sweep_eligible(current.state) {
        if let Some(due) = present(current.current_due_date) {
            if due - now <= 0 {
                return Some(S::Overdue);
            }
        }
    }

    None
}

pub(super) fn clear_on_go_back<I>(
    _ctx: &StepCtx<'_>,
    _ids: &mut I,
    mut diff: DeficiencyDiff,
) -> DeficiencyDiff {
    if diff.state == Some(DeficiencyState::GoBack) {
        diff.current_plan_to_fix = Apply::Clear;
        diff.current_due_date = Apply::Clear;
        diff.current_due_date_day = Apply::Clear;
        diff.current_deferred_date = Apply::Clear;
        diff.current_deferred_date_day = Apply::Clear;
        diff.current_responsibility_group = Apply::Clear;
        diff.current_start_date = Apply::Clear;
        diff.current_complete_now_reason = Apply::Clear;
    }
    diff
}

pub(super) fn set_requested_fields<I>(
    ctx: &StepCtx<'_>,
    _ids: &mut I,
    mut diff: DeficiencyDiff,
) -> DeficiencyDiff {
    let changes = &ctx.req.changes;

    if diff.current_plan_to_fix.is_keep() {
        if let Some(plan) = &changes.current_plan_to_fix {
            diff.current_plan_to_fix = Apply::Set(plan.clone());
        }
    }
    if diff.current_responsibility_group.is_keep() {
        if let Some(group) = &changes.current_responsibility_group {
            diff.current_responsibility_group = Apply::Set(group.clone());
        }
    }
    if diff.current_reason_incomplete.is_keep() {
        if let Some(reason) = &changes.current_reason_incomplete {
            diff.current_reason_incomplete = Apply::Set(reason.clone());
        }
    }
    if diff.current_complete_now_reason.is_keep() {
        if let Some(reason) = &changes.current_complete_now_reason {
            diff.current_complete_now_reason = Apply::Set(reason.clone());
        }
    }

    if diff.current_due_date.is_keep() {
        if let Some(due) = present(changes.current_due_date) {
            diff.current_due_date = Apply::Set(due);
            diff.current_due_date_day = day_string(due).map_or(Apply::Clear, Apply::Set);
        }
    }
    if diff.current_deferred_date.is_keep() {
        if let Some(deferred) = present(changes.current_deferred_date) {
            diff.current_deferred_date = Apply::Set(deferred);
            diff.current_deferred_date_day = day_string(deferred).map_or(Apply::Clear, Apply::Set);
        }
    }
    if diff.current_start_date.is_keep() {
        if let Some(start) = present(changes.current_start_date) {
            diff.current_start_date = Apply::Set(start);
        }
    }

    if let Some(flag) = changes.is_duplicate {
        diff.is_duplicate = Some(flag);
    }

    diff
}

pub(super) fn flag_progress_note<I>(
    ctx: &StepCtx<'_>,
    _ids: &mut I,
    mut diff: DeficiencyDiff,
) -> DeficiencyDiff {
    use DeficiencyState as S;

    let entering_pending = diff.state == Some(S::Pending)
        && matches!(ctx.current.state, S::RequiresAction | S::GoBack);

    if entering_pending {
        let far_out = effective_due(ctx).is_some_and(|due| {
            calendar_days_between(ctx.req.now, due) >= ctx.tuning.progress_note_min_days
        });
        diff.will_require_progress_note = Some(far_out && ctx.req.progress_note.is_none());
    } else if ctx.req.progress_note.is_some() && ctx.current.will_require_progress_note {
        diff.will_require_progress_note = Some(false);
    }

    diff
}

pub(super) fn append_history<I: EntryIdSource>(
    ctx: &StepCtx<'_>,
    ids: &mut I,
    mut diff: DeficiencyDiff,
) -> DeficiencyDiff {
    use DeficiencyState as S;

    let now = ctx.req.now;
    let author = ctx.req.author.as_deref();

    // Entry metadata carries the earliest known start date across the
    // update, so history stays attributable to its remediation window.
    let new_start = diff
        .current_start_date
        .effective(ctx.current.current_start_date.as_ref())
        .copied();
    let entry_start = earliest(new_start, ctx.current.current_start_date);

    if let Some(next) = diff.state {
        let window = if matches!(next, S::Overdue | S::RequiresProgressUpdate) {
            ctx.current.current_start_date
        } else {
            None
        };
        diff.state_history
            .insert(ids.next_id(), entry(now, next, window, author));
    }

    push_if_changed(
        ids,
        &mut diff.due_dates,
        &diff.current_due_date,
        ctx.current.current_due_date.as_ref(),
        now,
        entry_start,
        author,
    );
    push_if_changed(
        ids,
        &mut diff.deferred_dates,
        &diff.current_deferred_date,
        ctx.current.current_deferred_date.as_ref(),
        now,
        entry_start,
        author,
    );
    push_if_changed(
        ids,
        &mut diff.start_dates,
        &diff.current_start_date,
        ctx.current.current_start_date.as_ref(),
        now,
        entry_start,
        author,
    );
    push_if_changed(
        ids,
        &mut diff.plans_to_fix,
        &diff.current_plan_to_fix,
        ctx.current.current_plan_to_fix.as_ref(),
        now,
        entry_start,
        author,
    );
    push_if_changed(
        ids,
        &mut diff.responsibility_groups,
        &diff.current_responsibility_group,
        ctx.current.current_responsibility_group.as_ref(),
        now,
        entry_start,
        author,
    );
    push_if_changed(
        ids,
        &mut diff.reasons_incomplete,
        &diff.current_reason_incomplete,
        ctx.current.current_reason_incomplete.as_ref(),
        now,
        entry_start,
        author,
    );
    push_if_changed(
        ids,
        &mut diff.complete_now_reasons,
        &diff.current_complete_now_reason,
        ctx.current.current_complete_now_reason.as_ref(),
        now,
        entry_start,
        author,
    );

    if let Some(note) = &ctx.req.progress_note {
        diff.progress_notes
            .insert(ids.next_id(), entry(now, note.clone(), entry_start, author));
    }

    diff
}

pub(super) fn merge_photos<I>(
    ctx: &StepCtx<'_>,
    _ids: &mut I,
    mut diff: DeficiencyDiff,
) -> DeficiencyDiff {
    if let Some(photos) = &ctx.req.photos {
        for (photo_id, photo) in photos {
            diff.completed_photos.insert(photo_id.clone(), photo.clone());
        }
    }
    diff
}

pub(super) fn stamp_updated_at<I>(
    ctx: &StepCtx<'_>,
    _ids: &mut I,
    mut diff: DeficiencyDiff,
) -> DeficiencyDiff {
    if !diff.is_empty() {
        diff.updated_at = Some(ctx.req.now);
    }
    diff
}

fn effective_due(ctx: &StepCtx<'_>) -> Option<i64> {
    present(ctx.req.changes.current_due_date).or(present(ctx.current.current_due_date))
}

fn effective_deferred(ctx: &StepCtx<'_>) -> Option<i64> {
    present(ctx.req.changes.current_deferred_date).or(present(ctx.current.current_deferred_date))
}

fn clears_lead(ts: Option<i64>, now: i64, lead_secs: i64) -> bool {
    ts.is_some_and(|t| t - now > lead_secs)
}

/// Evidence tied to the current window: a progress note or a completed
/// photo whose start date matches.
fn window_evidence_exists(record: &Deficiency) -> bool {
    record.current_start_date.is_some_and(|start| {
        record.has_progress_note_for(start) || record.has_completed_photo_for(start)
    })
}

/// A completed photo (incoming or already on the record) for the current
/// window.
fn completion_photo_exists(ctx: &StepCtx<'_>) -> bool {
    let Some(start) = ctx.current.current_start_date else {
        return false;
    };
    let incoming = ctx
        .req
        .photos
        .as_ref()
        .is_some_and(|photos| photos.values().any(|p| p.start_date == Some(start)));

    incoming || ctx.current.has_completed_photo_for(start)
}

fn entry<T>(now: i64, value: T, start_date: Option<i64>, user: Option<&str>) -> HistoryEntry<T> {
    HistoryEntry {
        created_at: now,
        value,
        start_date,
        user: user.map(str::to_string),
    }
}

const fn earliest(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if x < y { x } else { y }),
        (Some(x), None) => Some(x),
        (None, y) => y,
    }
}

fn push_if_changed<I: EntryIdSource, T: Clone + PartialEq>(
    ids: &mut I,
    out: &mut BTreeMap<String, HistoryEntry<T>>,
    cell: &Apply<T>,
    previous: Option<&T>,
    now: i64,
    start_date: Option<i64>,
    user: Option<&str>,
) {
    if let Apply::Set(value) = cell {
        if previous != Some(value) {
            out.insert(ids.next_id(), entry(now, value.clone(), start_date, user));
        }
    }
}
