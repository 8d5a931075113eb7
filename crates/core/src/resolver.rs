// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bid validation and assignment.

use crate::apply::Transition;
use crate::error::CoreError;
use crate::lifecycle::{check_completion, clear_current};
use crate::session::LedgerEffect;
use shift_bid_audit::{Action, StateSnapshot};
use shift_bid_domain::{
    Assignment, DomainError, Participant, SessionStatus, SlotAvailability, TimeWindow, UserId,
    best_fit,
};
use time::OffsetDateTime;

fn require_active(t: &Transition<'_>, operation: &'static str) -> Result<(), CoreError> {
    if t.session.status != SessionStatus::Active {
        return Err(DomainError::OperationNotPermitted {
            operation,
            status: t.session.status,
        }
        .into());
    }
    Ok(())
}

fn find<'s>(t: &'s Transition<'_>, user_id: &UserId) -> Result<&'s Participant, CoreError> {
    t.session
        .queue
        .get(user_id)
        .ok_or_else(|| DomainError::ParticipantNotFound(user_id.clone()).into())
}

/// Validates and records a participant's own bid.
///
/// Checks run in a fixed order so the caller learns the most useful reason
/// first: lifecycle, identity, already bid, turn, window, role, capacity.
pub(crate) fn submit_bid(
    t: &mut Transition<'_>,
    user_id: &UserId,
    assignment: Assignment,
) -> Result<(), CoreError> {
    require_active(t, "submit a bid")?;

    let participant: &Participant = find(t, user_id)?;
    if participant.has_bid {
        return Err(DomainError::AlreadyBid {
            participant: user_id.clone(),
        }
        .into());
    }
    if !t.session.is_current(user_id) {
        return Err(DomainError::NotCurrentParticipant {
            participant: user_id.clone(),
        }
        .into());
    }
    let window: TimeWindow = participant.time_window.ok_or_else(|| DomainError::NoActiveWindow {
        participant: user_id.clone(),
    })?;
    if window.is_expired(t.now) {
        return Err(DomainError::WindowExpired {
            participant: user_id.clone(),
            expired_at: window.end(),
        }
        .into());
    }
    if let Some(qualified) = participant.profile.qualified_role {
        if qualified != assignment.role {
            return Err(DomainError::RoleMismatch {
                participant: user_id.clone(),
                qualified,
                requested: assignment.role,
            }
            .into());
        }
    }
    if !t
        .ledger
        .has_slot(assignment.station, assignment.shift, assignment.role)?
    {
        return Err(DomainError::SlotUnavailable {
            station: assignment.station,
            shift: assignment.shift,
            role: assignment.role,
        }
        .into());
    }

    assign(t, user_id, assignment, false)?;
    check_completion(t)
}

/// Gives the current participant the best-fit slot on an operator's request.
pub(crate) fn auto_assign(t: &mut Transition<'_>, user_id: &UserId) -> Result<(), CoreError> {
    require_active(t, "auto-assign")?;

    let participant: &Participant = find(t, user_id)?;
    if participant.has_bid {
        return Err(DomainError::AlreadyBid {
            participant: user_id.clone(),
        }
        .into());
    }
    if !t.session.is_current(user_id) {
        return Err(DomainError::NotCurrentParticipant {
            participant: user_id.clone(),
        }
        .into());
    }

    let assignment: Assignment =
        best_fit_for(t, user_id)?.ok_or_else(|| DomainError::NoEligibleSlot {
            participant: user_id.clone(),
        })?;
    assign(t, user_id, assignment, true)?;
    check_completion(t)
}

/// Frees a participant's slot. The participant keeps `has_bid`.
pub(crate) fn release_assignment(
    t: &mut Transition<'_>,
    user_id: &UserId,
) -> Result<(), CoreError> {
    let before: StateSnapshot = t.session.to_snapshot();
    let now: OffsetDateTime = t.now;
    let released: Assignment = t
        .session
        .queue
        .get_mut(user_id)
        .ok_or_else(|| DomainError::ParticipantNotFound(user_id.clone()))?
        .release_assignment(now)
        .ok_or_else(|| DomainError::AssignmentNotFound(user_id.clone()))?;

    t.set_ledger_effect(LedgerEffect::Release {
        participant: user_id.clone(),
        assignment: released,
    })?;
    t.record(
        Action::AssignmentReleased,
        before,
        Some(user_id.clone()),
        format!("Released {released}"),
    );
    Ok(())
}

/// Scores the open slots for a participant and picks the best one.
///
/// A participant already holding a slot in another session gets nothing.
pub(crate) fn best_fit_for(
    t: &Transition<'_>,
    user_id: &UserId,
) -> Result<Option<Assignment>, CoreError> {
    let participant: &Participant = find(t, user_id)?;
    if t.ledger.holds_slot(user_id) {
        return Ok(None);
    }
    let slots: Vec<SlotAvailability> = t.ledger.slots();
    Ok(best_fit(&participant.profile, &slots))
}

/// Records an assignment, queues the ledger reservation and ends the
/// participant's turn.
pub(crate) fn assign(
    t: &mut Transition<'_>,
    user_id: &UserId,
    assignment: Assignment,
    auto: bool,
) -> Result<(), CoreError> {
    let before: StateSnapshot = t.session.to_snapshot();
    let now: OffsetDateTime = t.now;
    let is_current: bool = t.session.is_current(user_id);

    t.session
        .queue
        .get_mut(user_id)
        .ok_or_else(|| DomainError::ParticipantNotFound(user_id.clone()))?
        .record_assignment(assignment, now, auto);
    t.session.completed_bids = t.session.completed_bids.saturating_add(1);
    if auto {
        t.session.auto_assignments = t.session.auto_assignments.saturating_add(1);
    }
    if is_current {
        clear_current(t);
    }

    t.set_ledger_effect(LedgerEffect::Reserve {
        participant: user_id.clone(),
        assignment,
    })?;
    let (action, verb) = if auto {
        (Action::AutoAssigned, "Auto-assigned")
    } else {
        (Action::BidSubmitted, "Bid accepted for")
    };
    t.record(action, before, Some(user_id.clone()), format!("{verb} {assignment}"));
    Ok(())
}
