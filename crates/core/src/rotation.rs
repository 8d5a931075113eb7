// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Timeout recovery: requeueing a participant whose window lapsed.
//!
//! Every requeue raises the participant's attempt count and attempts are
//! capped by policy, so a session with `N` participants and a cap of `k`
//! completes within `N * k` turns even if nobody ever bids.

use crate::apply::Transition;
use crate::error::CoreError;
use crate::lifecycle::{check_completion, clear_current};
use crate::resolver::{assign, best_fit_for};
use shift_bid_audit::{Action, StateSnapshot};
use shift_bid_domain::{Assignment, DomainError, Participant, SessionStatus, UserId};
use time::OffsetDateTime;

/// Requeues the current participant if their window lapsed without a bid.
///
/// Safe to call at any time and any number of times: when there is nothing
/// to do the transition produces no events. Re-reads the participant's state
/// so that a bid that won a race is left alone.
pub(crate) fn check_expiration(t: &mut Transition<'_>) -> Result<(), CoreError> {
    if !t.session.has_expired_window(t.now) {
        return Ok(());
    }
    move_current_to_back(t)
}

/// Requeues the current participant regardless of their window.
pub(crate) fn move_to_back(t: &mut Transition<'_>) -> Result<(), CoreError> {
    if t.session.status != SessionStatus::Active {
        return Err(DomainError::OperationNotPermitted {
            operation: "move a participant to the back",
            status: t.session.status,
        }
        .into());
    }
    move_current_to_back(t)
}

fn move_current_to_back(t: &mut Transition<'_>) -> Result<(), CoreError> {
    let index: usize = t.session.current_participant_index.ok_or_else(|| {
        CoreError::InvariantViolation(String::from("active session has no current participant"))
    })?;
    let before: StateSnapshot = t.session.to_snapshot();
    let now: OffsetDateTime = t.now;
    let max_attempts: u32 = t.policy.max_attempts();

    clear_current(t);
    let participant: &mut Participant = t.session.queue.at_mut(index).ok_or_else(|| {
        CoreError::InvariantViolation(format!("no participant at queue index {index}"))
    })?;
    participant.record_timeout(now);
    let user_id: UserId = participant.user_id().clone();
    let attempts: u32 = participant.attempts;

    t.session.queue.move_to_back(index)?;
    t.record(
        Action::MovedToBack,
        before,
        Some(user_id.clone()),
        format!("Window lapsed; attempt {attempts} of {max_attempts}"),
    );

    if attempts >= max_attempts && t.policy.auto_assign_on_exhaustion() {
        // Exhausted participants get the best remaining slot; with none left
        // they simply stay unassigned
        let best: Option<Assignment> = best_fit_for(t, &user_id)?;
        if let Some(assignment) = best {
            assign(t, &user_id, assignment, true)?;
        }
    }

    check_completion(t)
}
