// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

#[cfg(test)]
mod tests;

use shift_bid_domain::{DomainError, UserId};
use time::OffsetDateTime;

/// The kind of entity performing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    /// A participant acting on their own turn.
    Participant,
    /// An operator managing sessions.
    Admin,
    /// A background process such as the expiration sweeper.
    System,
}

impl ActorKind {
    /// Returns the string representation of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::Admin => "admin",
            Self::System => "system",
        }
    }
}

impl std::str::FromStr for ActorKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "participant" => Ok(Self::Participant),
            "admin" => Ok(Self::Admin),
            "system" => Ok(Self::System),
            _ => Err(DomainError::InvalidInput {
                field: "actor_kind",
                reason: format!("'{s}' is not one of participant, admin, system"),
            }),
        }
    }
}

impl std::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents the entity performing an action.
///
/// An actor is any identifiable entity that initiates a state change:
/// a participant, an operator, or an automated trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The kind of actor.
    pub kind: ActorKind,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `kind` - The kind of actor
    #[must_use]
    pub const fn new(id: String, kind: ActorKind) -> Self {
        Self { id, kind }
    }

    /// Creates a participant actor for a user.
    #[must_use]
    pub fn participant(user_id: &UserId) -> Self {
        Self::new(user_id.value().to_string(), ActorKind::Participant)
    }

    /// Creates an admin actor.
    #[must_use]
    pub fn admin(id: &str) -> Self {
        Self::new(id.to_string(), ActorKind::Admin)
    }

    /// Creates a system actor, named after the process acting.
    #[must_use]
    pub fn system(process: &str) -> Self {
        Self::new(process.to_string(), ActorKind::System)
    }

    /// Returns true if this actor is the given participant.
    #[must_use]
    pub fn is_user(&self, user_id: &UserId) -> bool {
        self.kind == ActorKind::Participant && self.id == user_id.value()
    }

    /// Returns true if this actor may run operator-only commands.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        matches!(self.kind, ActorKind::Admin | ActorKind::System)
    }
}

/// The state change recorded by an audit event.
///
/// Names are stable and appear in the history log and on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// A session was created in draft.
    SessionCreated,
    /// A participant joined the roster.
    ParticipantAdded,
    /// A participant left the roster.
    ParticipantRemoved,
    /// A session was given a planned start and end.
    SessionScheduled,
    /// Bidding began.
    SessionStarted,
    /// Bidding was suspended.
    SessionPaused,
    /// Bidding continued after a pause.
    SessionResumed,
    /// A bid window opened for a participant.
    WindowOpened,
    /// A participant chose a slot.
    BidSubmitted,
    /// The engine chose a slot for a participant.
    AutoAssigned,
    /// A participant's window lapsed and they were requeued.
    MovedToBack,
    /// An operator released a participant's slot.
    AssignmentReleased,
    /// Bidding ended.
    SessionCompleted,
    /// The session was abandoned.
    SessionCancelled,
}

impl Action {
    /// Returns the stable name of this action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SessionCreated => "session_created",
            Self::ParticipantAdded => "participant_added",
            Self::ParticipantRemoved => "participant_removed",
            Self::SessionScheduled => "session_scheduled",
            Self::SessionStarted => "session_started",
            Self::SessionPaused => "session_paused",
            Self::SessionResumed => "session_resumed",
            Self::WindowOpened => "bid_window_opened",
            Self::BidSubmitted => "bid_submitted",
            Self::AutoAssigned => "auto_assigned",
            Self::MovedToBack => "moved_to_back",
            Self::AssignmentReleased => "assignment_released",
            Self::SessionCompleted => "session_completed",
            Self::SessionCancelled => "session_cancelled",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A compact rendering of session state at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    /// A string representation of the state.
    pub data: String,
}

impl StateSnapshot {
    /// Creates a new `StateSnapshot`.
    ///
    /// # Arguments
    ///
    /// * `data` - A string representation of the state
    #[must_use]
    pub const fn new(data: String) -> Self {
        Self { data }
    }
}

/// An immutable audit event representing a state transition.
///
/// Audit events are appended to a session's history and never edited.
/// Each one captures:
/// - Who performed the action (actor)
/// - What action was performed (action)
/// - Which participant it concerned, if any
/// - When it happened
/// - The state before and after the transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// The actor who initiated this state change.
    pub actor: Actor,
    /// The action that was performed.
    pub action: Action,
    /// The participant the action concerned.
    pub participant: Option<UserId>,
    /// Free-form human readable details.
    pub details: Option<String>,
    /// When the transition happened.
    pub timestamp: OffsetDateTime,
    /// The state before the transition.
    pub before: StateSnapshot,
    /// The state after the transition.
    pub after: StateSnapshot,
}

impl AuditEvent {
    /// Creates a new `AuditEvent` with no participant and no details.
    ///
    /// # Arguments
    ///
    /// * `actor` - The actor who initiated the change
    /// * `action` - The action that was performed
    /// * `timestamp` - When the change happened
    /// * `before` - The state before the transition
    /// * `after` - The state after the transition
    #[must_use]
    pub const fn new(
        actor: Actor,
        action: Action,
        timestamp: OffsetDateTime,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> Self {
        Self {
            actor,
            action,
            participant: None,
            details: None,
            timestamp,
            before,
            after,
        }
    }

    /// Attaches the participant this event concerns.
    #[must_use]
    pub fn with_participant(mut self, participant: UserId) -> Self {
        self.participant = Some(participant);
        self
    }

    /// Attaches human readable details.
    #[must_use]
    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}
