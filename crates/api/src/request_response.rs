// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.

use shift_bid::Session;
use shift_bid_audit::AuditEvent;
use shift_bid_domain::{Assignment, Participant, SessionSettings, SlotAvailability};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Renders a timestamp as RFC 3339.
#[must_use]
pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

fn format_optional(at: Option<OffsetDateTime>) -> Option<String> {
    at.map(format_timestamp)
}

/// API request to create a new session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CreateSessionRequest {
    /// Display name.
    pub name: String,
    /// The year the bid covers.
    pub year: u16,
    /// Optional free text.
    #[serde(default)]
    pub description: Option<String>,
    /// Length of each participant's bid window.
    pub bid_window_duration_minutes: u32,
    /// Configured auto-assign timeout.
    pub auto_assign_timeout_minutes: u32,
}

impl From<CreateSessionRequest> for SessionSettings {
    fn from(request: CreateSessionRequest) -> Self {
        Self {
            name: request.name,
            year: request.year,
            description: request.description,
            bid_window_duration_minutes: request.bid_window_duration_minutes,
            auto_assign_timeout_minutes: request.auto_assign_timeout_minutes,
        }
    }
}

/// One participant as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParticipantSummary {
    /// The participant's user id.
    pub user_id: String,
    /// Display name.
    pub display_name: String,
    /// Ordering key.
    pub priority: i64,
    /// 0-based position in the queue.
    pub queue_position: usize,
    /// Whether the participant has bid.
    pub has_bid: bool,
    /// The slot the participant holds.
    pub assignment: Option<Assignment>,
    /// Whether the slot was chosen by the engine.
    pub auto_assigned: bool,
    /// Whether the participant was ever moved to the back.
    pub moved_to_back: bool,
    /// Lapsed windows so far.
    pub attempts: u32,
    /// Start of the participant's open window.
    pub window_start: Option<String>,
    /// End of the participant's open window.
    pub window_end: Option<String>,
}

impl From<&Participant> for ParticipantSummary {
    fn from(participant: &Participant) -> Self {
        Self {
            user_id: participant.user_id().to_string(),
            display_name: participant.profile.display_name.clone(),
            priority: participant.priority(),
            queue_position: participant.queue_position,
            has_bid: participant.has_bid,
            assignment: participant.assignment,
            auto_assigned: participant.auto_assigned,
            moved_to_back: participant.moved_to_back,
            attempts: participant.attempts,
            window_start: format_optional(participant.time_window.map(|w| w.start())),
            window_end: format_optional(participant.time_window.map(|w| w.end())),
        }
    }
}

/// A session as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionSummary {
    /// The session id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// The year the bid covers.
    pub year: u16,
    /// Optional free text.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// 0-based index of the current participant.
    pub current_participant_index: Option<usize>,
    /// User id of the current participant.
    pub current_participant: Option<String>,
    /// Start of the current window.
    pub current_bid_start: Option<String>,
    /// End of the current window.
    pub current_bid_end: Option<String>,
    /// Planned start.
    pub scheduled_start: Option<String>,
    /// Planned end.
    pub scheduled_end: Option<String>,
    /// When bidding began.
    pub actual_start: Option<String>,
    /// When bidding finished.
    pub actual_end: Option<String>,
    /// Length of each bid window.
    pub bid_window_duration_minutes: u32,
    /// Configured auto-assign timeout.
    pub auto_assign_timeout_minutes: u32,
    /// Participants in turn order.
    pub participants: Vec<ParticipantSummary>,
    /// Assignments made, manual and automatic.
    pub completed_bids: u32,
    /// Assignments made by the engine.
    pub auto_assignments: u32,
    /// Participants ever moved to the back.
    pub moved_to_back_count: usize,
    /// Version to pass back as `expected_version`.
    pub version: u64,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.value(),
            name: session.name.clone(),
            year: session.year,
            description: session.description.clone(),
            status: session.status.to_string(),
            current_participant_index: session.current_participant_index,
            current_participant: session
                .current_participant()
                .map(|p| p.user_id().to_string()),
            current_bid_start: format_optional(session.current_bid_start),
            current_bid_end: format_optional(session.current_bid_end),
            scheduled_start: format_optional(session.scheduled_start),
            scheduled_end: format_optional(session.scheduled_end),
            actual_start: format_optional(session.actual_start),
            actual_end: format_optional(session.actual_end),
            bid_window_duration_minutes: session.bid_window_duration_minutes,
            auto_assign_timeout_minutes: session.auto_assign_timeout_minutes,
            participants: session.queue.iter().map(ParticipantSummary::from).collect(),
            completed_bids: session.completed_bids,
            auto_assignments: session.auto_assignments,
            moved_to_back_count: session.queue.moved_to_back_count(),
            version: session.version,
        }
    }
}

/// One entry of a session's history.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoryEntryResponse {
    /// The action name.
    pub action: String,
    /// Who acted.
    pub actor_id: String,
    /// The kind of actor.
    pub actor_kind: String,
    /// The participant concerned.
    pub participant: Option<String>,
    /// Human readable details.
    pub details: Option<String>,
    /// When it happened.
    pub timestamp: String,
    /// State before.
    pub before: String,
    /// State after.
    pub after: String,
}

impl From<&AuditEvent> for HistoryEntryResponse {
    fn from(event: &AuditEvent) -> Self {
        Self {
            action: event.action.to_string(),
            actor_id: event.actor.id.clone(),
            actor_kind: event.actor.kind.to_string(),
            participant: event.participant.as_ref().map(ToString::to_string),
            details: event.details.clone(),
            timestamp: format_timestamp(event.timestamp),
            before: event.before.data.clone(),
            after: event.after.data.clone(),
        }
    }
}

/// Occupancy of one slot.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SlotSummary {
    /// The shift.
    pub shift: String,
    /// The role.
    pub role: String,
    /// Total positions.
    pub capacity: u32,
    /// Positions taken.
    pub occupied: u32,
}

/// Occupancy of one active station.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StationSummary {
    /// The station number.
    pub station: u32,
    /// Its slots, by shift then role.
    pub slots: Vec<SlotSummary>,
}

impl StationSummary {
    /// Groups ledger slots by station. Input must be ordered by station.
    #[must_use]
    pub fn group(slots: &[SlotAvailability]) -> Vec<Self> {
        let mut stations: Vec<Self> = Vec::new();
        for slot in slots {
            let number: u32 = slot.assignment.station.number();
            let summary: SlotSummary = SlotSummary {
                shift: slot.assignment.shift.to_string(),
                role: slot.assignment.role.to_string(),
                capacity: slot.capacity,
                occupied: slot.occupied,
            };
            match stations.last_mut() {
                Some(last) if last.station == number => last.slots.push(summary),
                _ => stations.push(Self {
                    station: number,
                    slots: vec![summary],
                }),
            }
        }
        stations
    }
}

/// Outcome of one sweep over all sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SweepReport {
    /// Active sessions looked at.
    pub scanned: usize,
    /// Sessions where a participant was moved to the back.
    pub moved: usize,
    /// Sessions whose participant was resolved before the sweeper got the lock.
    pub skipped: usize,
    /// Sessions where the check failed.
    pub failed: usize,
}
