// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::{Role, SessionId, SessionStatus, Shift, StationId, UserId};
use time::OffsetDateTime;

/// Classification of domain errors.
///
/// Callers use the kind to decide on a corrective action: fix the input,
/// refetch and retry, or wait for their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input, rejected before any state was touched.
    Validation,
    /// Operation is invalid for the session's lifecycle status.
    State,
    /// The acting participant may not bid right now.
    Turn,
    /// The requested slot is unavailable.
    Capacity,
    /// A concurrent mutation won; refetch and retry.
    ConcurrencyConflict,
    /// Unknown session, participant, station or user.
    NotFound,
}

impl ErrorKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::State => "state",
            Self::Turn => "turn",
            Self::Capacity => "capacity",
            Self::ConcurrencyConflict => "concurrency_conflict",
            Self::NotFound => "not_found",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field failed validation.
    InvalidInput {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// Shift is not one of A, B, C.
    InvalidShift(String),
    /// Role is not part of the fixed role set.
    InvalidRole(String),
    /// Session status string is unknown.
    InvalidStatus(String),
    /// Session policy values are out of range.
    InvalidPolicy(String),
    /// The user already participates in this session.
    DuplicateParticipant(UserId),
    /// The user already holds a slot in the ledger.
    DuplicateReservation(UserId),
    /// The participant is not qualified for the requested role.
    RoleMismatch {
        /// The participant.
        participant: UserId,
        /// The role they are qualified for.
        qualified: Role,
        /// The role they requested.
        requested: Role,
    },
    /// The lifecycle does not allow moving between these statuses.
    InvalidStatusTransition {
        /// Current status.
        from: SessionStatus,
        /// Requested status.
        to: SessionStatus,
    },
    /// The operation cannot run while the session is in this status.
    OperationNotPermitted {
        /// The operation name.
        operation: &'static str,
        /// The current status.
        status: SessionStatus,
    },
    /// A session cannot start without participants.
    EmptyRoster,
    /// The acting participant does not hold the current turn.
    NotCurrentParticipant {
        /// The participant that attempted to act.
        participant: UserId,
    },
    /// The participant has already placed a bid.
    AlreadyBid {
        /// The participant.
        participant: UserId,
    },
    /// The participant has no open bid window.
    NoActiveWindow {
        /// The participant.
        participant: UserId,
    },
    /// The participant's bid window closed before the bid arrived.
    WindowExpired {
        /// The participant.
        participant: UserId,
        /// When the window closed.
        expired_at: OffsetDateTime,
    },
    /// No free slot for the requested station, shift and role.
    SlotUnavailable {
        /// The station.
        station: StationId,
        /// The shift.
        shift: Shift,
        /// The role.
        role: Role,
    },
    /// Auto-assignment found no slot the participant can fill.
    NoEligibleSlot {
        /// The participant.
        participant: UserId,
    },
    /// The session version moved on since the caller last read it.
    VersionConflict {
        /// The version the caller expected.
        expected: u64,
        /// The version currently stored.
        actual: u64,
    },
    /// Session does not exist.
    SessionNotFound(SessionId),
    /// Participant does not exist in the session.
    ParticipantNotFound(UserId),
    /// Station does not exist in the ledger.
    StationNotFound(StationId),
    /// User is unknown to the identity service.
    UserNotFound(UserId),
    /// The participant holds no assignment.
    AssignmentNotFound(UserId),
}

impl DomainError {
    /// Classifies this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. }
            | Self::InvalidShift(_)
            | Self::InvalidRole(_)
            | Self::InvalidStatus(_)
            | Self::InvalidPolicy(_)
            | Self::DuplicateParticipant(_)
            | Self::RoleMismatch { .. } => ErrorKind::Validation,
            Self::InvalidStatusTransition { .. }
            | Self::OperationNotPermitted { .. }
            | Self::EmptyRoster => ErrorKind::State,
            Self::NotCurrentParticipant { .. }
            | Self::AlreadyBid { .. }
            | Self::NoActiveWindow { .. }
            | Self::WindowExpired { .. } => ErrorKind::Turn,
            Self::SlotUnavailable { .. }
            | Self::NoEligibleSlot { .. }
            | Self::DuplicateReservation(_) => ErrorKind::Capacity,
            Self::VersionConflict { .. } => ErrorKind::ConcurrencyConflict,
            Self::SessionNotFound(_)
            | Self::ParticipantNotFound(_)
            | Self::StationNotFound(_)
            | Self::UserNotFound(_)
            | Self::AssignmentNotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Returns a stable machine-readable rule name.
    ///
    /// Rejected bids carry distinct rules so clients can tell "too late"
    /// from "not your turn" from "slot full".
    #[must_use]
    pub const fn rule(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::InvalidShift(_) => "invalid_shift",
            Self::InvalidRole(_) => "invalid_role",
            Self::InvalidStatus(_) => "invalid_status",
            Self::InvalidPolicy(_) => "invalid_policy",
            Self::DuplicateParticipant(_) => "duplicate_participant",
            Self::DuplicateReservation(_) => "duplicate_reservation",
            Self::RoleMismatch { .. } => "role_mismatch",
            Self::InvalidStatusTransition { .. } => "invalid_status_transition",
            Self::OperationNotPermitted { .. } => "operation_not_permitted",
            Self::EmptyRoster => "empty_roster",
            Self::NotCurrentParticipant { .. } => "not_your_turn",
            Self::AlreadyBid { .. } => "already_bid",
            Self::NoActiveWindow { .. } => "no_active_window",
            Self::WindowExpired { .. } => "window_expired",
            Self::SlotUnavailable { .. } => "slot_unavailable",
            Self::NoEligibleSlot { .. } => "no_eligible_slot",
            Self::VersionConflict { .. } => "version_conflict",
            Self::SessionNotFound(_) => "session_not_found",
            Self::ParticipantNotFound(_) => "participant_not_found",
            Self::StationNotFound(_) => "station_not_found",
            Self::UserNotFound(_) => "user_not_found",
            Self::AssignmentNotFound(_) => "assignment_not_found",
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { field, reason } => {
                write!(f, "Invalid value for '{field}': {reason}")
            }
            Self::InvalidShift(value) => {
                write!(f, "Invalid shift '{value}'. Must be one of A, B, C")
            }
            Self::InvalidRole(value) => write!(f, "Invalid role '{value}'"),
            Self::InvalidStatus(value) => write!(f, "Invalid session status '{value}'"),
            Self::InvalidPolicy(msg) => write!(f, "Invalid session policy: {msg}"),
            Self::DuplicateParticipant(user) => {
                write!(f, "User '{user}' is already a participant in this session")
            }
            Self::DuplicateReservation(user) => {
                write!(f, "User '{user}' already holds a slot")
            }
            Self::RoleMismatch {
                participant,
                qualified,
                requested,
            } => {
                write!(
                    f,
                    "Participant '{participant}' is qualified as {qualified} and cannot bid for {requested}"
                )
            }
            Self::InvalidStatusTransition { from, to } => {
                write!(f, "Cannot move session from {from} to {to}")
            }
            Self::OperationNotPermitted { operation, status } => {
                write!(f, "Cannot {operation} while the session is {status}")
            }
            Self::EmptyRoster => write!(f, "Session has no participants"),
            Self::NotCurrentParticipant { participant } => {
                write!(f, "It is not participant '{participant}''s turn")
            }
            Self::AlreadyBid { participant } => {
                write!(f, "Participant '{participant}' has already bid")
            }
            Self::NoActiveWindow { participant } => {
                write!(f, "Participant '{participant}' has no open bid window")
            }
            Self::WindowExpired {
                participant,
                expired_at,
            } => {
                write!(
                    f,
                    "Bid window for participant '{participant}' expired at {expired_at}"
                )
            }
            Self::SlotUnavailable {
                station,
                shift,
                role,
            } => {
                write!(f, "No free {role} slot on {station} Shift {shift}")
            }
            Self::NoEligibleSlot { participant } => {
                write!(
                    f,
                    "No free slot available for auto-assigning participant '{participant}'"
                )
            }
            Self::VersionConflict { expected, actual } => {
                write!(
                    f,
                    "Session was modified concurrently (expected version {expected}, found {actual})"
                )
            }
            Self::SessionNotFound(id) => write!(f, "Session {id} not found"),
            Self::ParticipantNotFound(user) => write!(f, "Participant '{user}' not found"),
            Self::StationNotFound(station) => write!(f, "{station} not found"),
            Self::UserNotFound(user) => write!(f, "User '{user}' not found"),
            Self::AssignmentNotFound(user) => {
                write!(f, "Participant '{user}' holds no assignment")
            }
        }
    }
}

impl std::error::Error for DomainError {}
