// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session status transitions and window management.
//!
//! ```text
//! draft ─► scheduled ─► active ⇄ paused
//!   │          │          │        │
//!   └──────────┴──► active └───────┴─► completed
//!   (any non-terminal status) ───────► cancelled
//! ```

use crate::apply::Transition;
use crate::error::CoreError;
use shift_bid_audit::{Action, StateSnapshot};
use shift_bid_domain::{
    DomainError, Participant, SessionStatus, TimeWindow, UserId, UserProfile, validate_profile,
    validate_schedule, window_duration,
};
use time::OffsetDateTime;

fn require_roster_changes(t: &Transition<'_>, operation: &'static str) -> Result<(), CoreError> {
    if !t.session.status.allows_roster_changes() {
        return Err(DomainError::OperationNotPermitted {
            operation,
            status: t.session.status,
        }
        .into());
    }
    Ok(())
}

fn require_transition(t: &Transition<'_>, to: SessionStatus) -> Result<(), CoreError> {
    if !t.session.status.can_transition_to(to) {
        return Err(DomainError::InvalidStatusTransition {
            from: t.session.status,
            to,
        }
        .into());
    }
    Ok(())
}

pub(crate) fn add_participant(
    t: &mut Transition<'_>,
    profile: UserProfile,
) -> Result<(), CoreError> {
    require_roster_changes(t, "add a participant")?;
    validate_profile(&profile)?;

    let before: StateSnapshot = t.session.to_snapshot();
    let user_id: UserId = profile.user_id.clone();
    let priority: i64 = profile.priority;
    t.session.queue.insert(profile)?;
    t.record(
        Action::ParticipantAdded,
        before,
        Some(user_id),
        format!("Added with priority {priority}"),
    );
    Ok(())
}

pub(crate) fn remove_participant(
    t: &mut Transition<'_>,
    participant: &UserId,
) -> Result<(), CoreError> {
    require_roster_changes(t, "remove a participant")?;

    let before: StateSnapshot = t.session.to_snapshot();
    t.session.queue.remove(participant)?;
    t.record(
        Action::ParticipantRemoved,
        before,
        Some(participant.clone()),
        String::from("Removed from roster"),
    );
    Ok(())
}

pub(crate) fn schedule(
    t: &mut Transition<'_>,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<(), CoreError> {
    // Rescheduling a scheduled session is allowed
    if t.session.status != SessionStatus::Scheduled {
        require_transition(t, SessionStatus::Scheduled)?;
    }
    validate_schedule(start, end)?;

    let before: StateSnapshot = t.session.to_snapshot();
    t.session.status = SessionStatus::Scheduled;
    t.session.scheduled_start = Some(start);
    t.session.scheduled_end = Some(end);
    t.record(
        Action::SessionScheduled,
        before,
        None,
        format!("Scheduled from {start} to {end}"),
    );
    Ok(())
}

pub(crate) fn start(t: &mut Transition<'_>) -> Result<(), CoreError> {
    if !matches!(
        t.session.status,
        SessionStatus::Draft | SessionStatus::Scheduled
    ) {
        return Err(DomainError::OperationNotPermitted {
            operation: "start",
            status: t.session.status,
        }
        .into());
    }
    if t.session.queue.is_empty() {
        return Err(DomainError::EmptyRoster.into());
    }

    let before: StateSnapshot = t.session.to_snapshot();
    t.session.status = SessionStatus::Active;
    t.session.actual_start = Some(t.now);
    let participants: usize = t.session.queue.len();
    t.record(
        Action::SessionStarted,
        before,
        None,
        format!("Bidding started with {participants} participants"),
    );
    check_completion(t)
}

pub(crate) fn pause(t: &mut Transition<'_>) -> Result<(), CoreError> {
    if t.session.status != SessionStatus::Active {
        return Err(DomainError::OperationNotPermitted {
            operation: "pause",
            status: t.session.status,
        }
        .into());
    }

    let before: StateSnapshot = t.session.to_snapshot();
    t.session.status = SessionStatus::Paused;
    t.record(
        Action::SessionPaused,
        before,
        None,
        String::from("Bidding paused; current window keeps running"),
    );
    Ok(())
}

pub(crate) fn resume(t: &mut Transition<'_>) -> Result<(), CoreError> {
    if t.session.status != SessionStatus::Paused {
        return Err(DomainError::OperationNotPermitted {
            operation: "resume",
            status: t.session.status,
        }
        .into());
    }

    let before: StateSnapshot = t.session.to_snapshot();
    t.session.status = SessionStatus::Active;
    t.record(
        Action::SessionResumed,
        before,
        None,
        String::from("Bidding resumed"),
    );

    // The resumed participant gets a full window, not what was left of the old one
    match t.session.current_participant_index {
        Some(index) => open_window(t, index),
        None => check_completion(t),
    }
}

pub(crate) fn complete(t: &mut Transition<'_>) -> Result<(), CoreError> {
    require_transition(t, SessionStatus::Completed)?;
    finish(t, SessionStatus::Completed, Action::SessionCompleted)
}

pub(crate) fn cancel(t: &mut Transition<'_>) -> Result<(), CoreError> {
    require_transition(t, SessionStatus::Cancelled)?;
    finish(t, SessionStatus::Cancelled, Action::SessionCancelled)
}

/// Moves to a terminal status and clears the current turn.
fn finish(t: &mut Transition<'_>, status: SessionStatus, action: Action) -> Result<(), CoreError> {
    let before: StateSnapshot = t.session.to_snapshot();
    clear_current(t);
    t.session.status = status;
    if status == SessionStatus::Completed {
        t.session.actual_end = Some(t.now);
    }
    let completed_bids: u32 = t.session.completed_bids;
    let participants: usize = t.session.queue.len();
    t.record(
        action,
        before,
        None,
        format!("{completed_bids} of {participants} participants assigned"),
    );
    Ok(())
}

/// Drops the current participant's window and the session's mirror of it.
pub(crate) fn clear_current(t: &mut Transition<'_>) {
    if let Some(index) = t.session.current_participant_index.take() {
        if let Some(participant) = t.session.queue.at_mut(index) {
            participant.time_window = None;
        }
    }
    t.session.current_bid_start = None;
    t.session.current_bid_end = None;
}

/// Opens a full-length window for the participant at `index` and makes
/// them current.
pub(crate) fn open_window(t: &mut Transition<'_>, index: usize) -> Result<(), CoreError> {
    let before: StateSnapshot = t.session.to_snapshot();
    let window: TimeWindow = TimeWindow::open(
        t.now,
        window_duration(t.session.bid_window_duration_minutes),
    );

    let participant: &mut Participant = t.session.queue.at_mut(index).ok_or_else(|| {
        CoreError::InvariantViolation(format!("no participant at queue index {index}"))
    })?;
    participant.time_window = Some(window);
    let user_id: UserId = participant.user_id().clone();

    t.session.current_participant_index = Some(index);
    t.session.current_bid_start = Some(window.start());
    t.session.current_bid_end = Some(window.end());
    t.record(
        Action::WindowOpened,
        before,
        Some(user_id),
        format!("Window open until {}", window.end()),
    );
    Ok(())
}

/// Completes the session if every participant is resolved, otherwise opens
/// a window for the first eligible participant in queue order.
pub(crate) fn check_completion(t: &mut Transition<'_>) -> Result<(), CoreError> {
    let max_attempts: u32 = t.policy.max_attempts();
    match t.session.queue.first_eligible(max_attempts) {
        Some(index) => open_window(t, index),
        None => finish(t, SessionStatus::Completed, Action::SessionCompleted),
    }
}
