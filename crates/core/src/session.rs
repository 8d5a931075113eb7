// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use shift_bid_audit::{AuditEvent, StateSnapshot};
use shift_bid_domain::{
    Assignment, DomainError, Participant, ParticipantQueue, SessionId, SessionSettings,
    SessionStatus, StationCapacityLedger, UserId,
};
use time::OffsetDateTime;

/// One round of turn-based bidding for a group of participants.
///
/// A session is a value: transitions clone it, mutate the clone and hand it
/// back in a [`TransitionResult`]. The caller decides whether to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The session's identity.
    pub id: SessionId,
    /// Display name.
    pub name: String,
    /// The year the bid covers.
    pub year: u16,
    /// Optional free text.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Planned start, set by scheduling.
    pub scheduled_start: Option<OffsetDateTime>,
    /// Planned end, set by scheduling.
    pub scheduled_end: Option<OffsetDateTime>,
    /// When bidding actually began.
    pub actual_start: Option<OffsetDateTime>,
    /// When bidding actually finished.
    pub actual_end: Option<OffsetDateTime>,
    /// Length of each participant's bid window.
    pub bid_window_duration_minutes: u32,
    /// Configured auto-assign timeout, reported to clients.
    pub auto_assign_timeout_minutes: u32,
    /// The participants in turn order.
    pub queue: ParticipantQueue,
    /// 0-based index of the current participant, `None` when nobody is current.
    pub current_participant_index: Option<usize>,
    /// Mirror of the current window's start.
    pub current_bid_start: Option<OffsetDateTime>,
    /// Mirror of the current window's end.
    pub current_bid_end: Option<OffsetDateTime>,
    /// Assignments made, manual and automatic.
    pub completed_bids: u32,
    /// Assignments made by the engine.
    pub auto_assignments: u32,
    /// Append-only log of state changes.
    pub history: Vec<AuditEvent>,
    /// Bumped on every committed change.
    pub version: u64,
}

impl Session {
    /// Creates an empty draft session at version 0.
    ///
    /// Settings are assumed to be validated.
    #[must_use]
    pub fn new(id: SessionId, settings: SessionSettings) -> Self {
        Self {
            id,
            name: settings.name,
            year: settings.year,
            description: settings.description,
            status: SessionStatus::Draft,
            scheduled_start: None,
            scheduled_end: None,
            actual_start: None,
            actual_end: None,
            bid_window_duration_minutes: settings.bid_window_duration_minutes,
            auto_assign_timeout_minutes: settings.auto_assign_timeout_minutes,
            queue: ParticipantQueue::new(),
            current_participant_index: None,
            current_bid_start: None,
            current_bid_end: None,
            completed_bids: 0,
            auto_assignments: 0,
            history: Vec::new(),
            version: 0,
        }
    }

    /// Returns the current participant, if any.
    #[must_use]
    pub fn current_participant(&self) -> Option<&Participant> {
        self.current_participant_index
            .and_then(|index| self.queue.at(index))
    }

    /// Returns true if the user is the current participant.
    #[must_use]
    pub fn is_current(&self, user_id: &UserId) -> bool {
        self.current_participant()
            .is_some_and(|p| p.user_id() == user_id)
    }

    /// Returns true if the sweeper has work to do on this session at `now`:
    /// it is active and the current participant's window lapsed without a bid.
    #[must_use]
    pub fn has_expired_window(&self, now: OffsetDateTime) -> bool {
        self.status == SessionStatus::Active
            && self.current_participant().is_some_and(|p| {
                !p.has_bid && p.time_window.is_some_and(|w| w.is_expired(now))
            })
    }

    /// Converts the session to a snapshot for audit purposes.
    #[must_use]
    pub fn to_snapshot(&self) -> StateSnapshot {
        let current: String = self
            .current_participant()
            .map_or_else(|| String::from("-"), |p| p.user_id().to_string());
        StateSnapshot::new(format!(
            "status={},current={},completed_bids={},auto_assignments={},participants={}",
            self.status,
            current,
            self.completed_bids,
            self.auto_assignments,
            self.queue.len()
        ))
    }

    /// Checks the invariants every committed session must satisfy.
    ///
    /// # Errors
    ///
    /// Returns a description of the first broken invariant.
    pub fn verify_invariants(&self, max_attempts: u32) -> Result<(), String> {
        if !self.queue.positions_are_contiguous() {
            return Err(String::from("queue positions are not contiguous"));
        }
        if self.auto_assignments > self.completed_bids {
            return Err(String::from("more auto assignments than completed bids"));
        }

        match self.status {
            SessionStatus::Active | SessionStatus::Paused => {
                let current: &Participant = self
                    .current_participant()
                    .ok_or_else(|| format!("{} session has no current participant", self.status))?;
                let Some(window) = current.time_window else {
                    return Err(format!("current participant {} has no window", current.user_id()));
                };
                if !current.is_eligible(max_attempts) {
                    return Err(format!(
                        "current participant {} is not eligible",
                        current.user_id()
                    ));
                }
                if self.current_bid_start != Some(window.start())
                    || self.current_bid_end != Some(window.end())
                {
                    return Err(String::from("session window does not mirror participant window"));
                }
            }
            SessionStatus::Draft
            | SessionStatus::Scheduled
            | SessionStatus::Completed
            | SessionStatus::Cancelled => {
                if self.current_participant_index.is_some() {
                    return Err(format!("{} session has a current participant", self.status));
                }
            }
        }
        Ok(())
    }
}

/// A ledger change that must commit together with a session transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEffect {
    /// Take a slot for a participant.
    Reserve {
        /// Who takes the slot.
        participant: UserId,
        /// The slot.
        assignment: Assignment,
    },
    /// Give a participant's slot back.
    Release {
        /// Who held the slot.
        participant: UserId,
        /// The slot.
        assignment: Assignment,
    },
}

impl LedgerEffect {
    /// Applies the effect to a ledger.
    ///
    /// # Errors
    ///
    /// Returns the ledger's error if the reservation or release is refused.
    pub fn commit(&self, ledger: &mut dyn StationCapacityLedger) -> Result<(), DomainError> {
        match self {
            Self::Reserve {
                participant,
                assignment,
            } => ledger.reserve_slot(
                assignment.station,
                assignment.shift,
                assignment.role,
                participant,
            ),
            Self::Release {
                participant,
                assignment,
            } => ledger.release_slot(
                assignment.station,
                assignment.shift,
                assignment.role,
                participant,
            ),
        }
    }
}

/// The result of a successful state transition.
///
/// Transitions are atomic: they either succeed completely or fail without
/// side effects. An empty `audit_events` list means the command was a no-op
/// and `new_session` equals the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The new session after the transition.
    pub new_session: Session,
    /// The audit events recording this transition, in order.
    pub audit_events: Vec<AuditEvent>,
    /// A ledger change to commit with the session, if any.
    pub ledger_effect: Option<LedgerEffect>,
}

impl TransitionResult {
    /// Returns true if the transition changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.audit_events.is_empty()
    }
}
