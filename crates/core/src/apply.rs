// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::error::CoreError;
use crate::session::{LedgerEffect, Session, TransitionResult};
use crate::{lifecycle, resolver, rotation};
use shift_bid_audit::{Action, Actor, AuditEvent, StateSnapshot};
use shift_bid_domain::{
    SessionId, SessionPolicy, SessionSettings, StationCapacityLedger, UserId,
    validate_session_settings,
};
use time::OffsetDateTime;

/// Working state threaded through one transition.
///
/// Holds a private copy of the session; nothing the caller can see changes
/// until the finished copy is returned.
pub(crate) struct Transition<'a> {
    pub(crate) session: Session,
    pub(crate) ledger: &'a dyn StationCapacityLedger,
    pub(crate) policy: &'a SessionPolicy,
    pub(crate) actor: Actor,
    pub(crate) now: OffsetDateTime,
    pub(crate) events: Vec<AuditEvent>,
    pub(crate) ledger_effect: Option<LedgerEffect>,
}

impl Transition<'_> {
    /// Appends an audit event whose `after` is the current working state.
    pub(crate) fn record(
        &mut self,
        action: Action,
        before: StateSnapshot,
        participant: Option<UserId>,
        details: String,
    ) {
        let mut event: AuditEvent = AuditEvent::new(
            self.actor.clone(),
            action,
            self.now,
            before,
            self.session.to_snapshot(),
        )
        .with_details(details);
        if let Some(participant) = participant {
            event = event.with_participant(participant);
        }
        self.events.push(event);
    }

    /// Queues a ledger change. A transition carries at most one.
    pub(crate) fn set_ledger_effect(&mut self, effect: LedgerEffect) -> Result<(), CoreError> {
        if self.ledger_effect.is_some() {
            return Err(CoreError::InvariantViolation(String::from(
                "transition produced more than one ledger change",
            )));
        }
        self.ledger_effect = Some(effect);
        Ok(())
    }
}

/// Creates a new draft session.
///
/// # Arguments
///
/// * `id` - The identity to give the session
/// * `settings` - Name, year and window configuration
/// * `actor` - The actor creating the session
/// * `now` - The current time
///
/// # Returns
///
/// * `Ok(TransitionResult)` with the new session at version 1 and a
///   `session_created` audit event
///
/// # Errors
///
/// Returns an error if the settings fail validation.
pub fn create_session(
    id: SessionId,
    settings: SessionSettings,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    validate_session_settings(&settings)?;

    let mut session: Session = Session::new(id, settings);
    let before: StateSnapshot = StateSnapshot::new(String::from("none"));
    let event: AuditEvent = AuditEvent::new(
        actor,
        Action::SessionCreated,
        now,
        before,
        session.to_snapshot(),
    )
    .with_details(format!("Created session '{}' for {}", session.name, session.year));

    session.history.push(event.clone());
    session.version = 1;

    Ok(TransitionResult {
        new_session: session,
        audit_events: vec![event],
        ledger_effect: None,
    })
}

/// Applies a command to a session, producing a new session and audit events.
///
/// This function is pure: the input session and ledger are never modified.
/// Any ledger change is returned as a [`LedgerEffect`] the caller must
/// commit together with the new session.
///
/// # Arguments
///
/// * `session` - The current session (immutable)
/// * `ledger` - Read access to station capacity
/// * `policy` - Engine-wide rules
/// * `command` - The command to apply
/// * `actor` - The actor performing this action
/// * `now` - The current time
///
/// # Returns
///
/// * `Ok(TransitionResult)` containing the new session and audit events;
///   the version is bumped only when at least one event was produced
/// * `Err(CoreError)` if the command is invalid
///
/// # Errors
///
/// Returns an error if:
/// - The command is not permitted in the session's status
/// - A turn, capacity or roster rule is violated
/// - The resulting session would break a structural invariant
pub fn apply(
    session: &Session,
    ledger: &dyn StationCapacityLedger,
    policy: &SessionPolicy,
    command: Command,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    let mut transition: Transition<'_> = Transition {
        session: session.clone(),
        ledger,
        policy,
        actor,
        now,
        events: Vec::new(),
        ledger_effect: None,
    };

    match command {
        Command::AddParticipant { profile } => lifecycle::add_participant(&mut transition, profile)?,
        Command::RemoveParticipant { participant } => {
            lifecycle::remove_participant(&mut transition, &participant)?;
        }
        Command::Schedule { start, end } => lifecycle::schedule(&mut transition, start, end)?,
        Command::Start => lifecycle::start(&mut transition)?,
        Command::Pause => lifecycle::pause(&mut transition)?,
        Command::Resume => lifecycle::resume(&mut transition)?,
        Command::Complete => lifecycle::complete(&mut transition)?,
        Command::Cancel => lifecycle::cancel(&mut transition)?,
        Command::SubmitBid {
            participant,
            assignment,
        } => resolver::submit_bid(&mut transition, &participant, assignment)?,
        Command::AutoAssign { participant } => {
            resolver::auto_assign(&mut transition, &participant)?;
        }
        Command::ReleaseAssignment { participant } => {
            resolver::release_assignment(&mut transition, &participant)?;
        }
        Command::CheckExpiration => rotation::check_expiration(&mut transition)?,
        Command::MoveToBack => rotation::move_to_back(&mut transition)?,
    }

    let Transition {
        session: mut new_session,
        events,
        ledger_effect,
        ..
    } = transition;

    if !events.is_empty() {
        new_session
            .verify_invariants(policy.max_attempts())
            .map_err(CoreError::InvariantViolation)?;
        new_session.history.extend(events.iter().cloned());
        new_session.version = session.version.saturating_add(1);
    }

    Ok(TransitionResult {
        new_session,
        audit_events: events,
        ledger_effect,
    })
}
