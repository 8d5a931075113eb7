// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Change notifications emitted after committed transitions.

use crate::request_response::{SessionSummary, format_timestamp};
use shift_bid::Session;
use shift_bid_audit::{Action, AuditEvent};
use shift_bid_domain::{Participant, window_duration};

/// A notification about one session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session changed; carries the new summary.
    SessionUpdated {
        /// The session.
        session_id: u64,
        /// The summary after the change.
        summary: Box<SessionSummary>,
    },
    /// A participant's bid window opened.
    BidWindowOpened {
        /// The session.
        session_id: u64,
        /// The participant whose turn it is.
        participant: String,
        /// When the window closes.
        window_end: String,
    },
    /// A participant's window lapsed and they were requeued.
    MovedToBack {
        /// The session.
        session_id: u64,
        /// The requeued participant.
        participant: String,
        /// Lapsed windows so far.
        attempts: u32,
    },
}

impl SessionEvent {
    /// Returns the session this event concerns.
    #[must_use]
    pub const fn session_id(&self) -> u64 {
        match self {
            Self::SessionUpdated { session_id, .. }
            | Self::BidWindowOpened { session_id, .. }
            | Self::MovedToBack { session_id, .. } => *session_id,
        }
    }

    /// Builds the notifications for a committed transition: one per opened
    /// window and requeue, followed by a single `session_updated`.
    #[must_use]
    pub fn from_transition(session: &Session, audit_events: &[AuditEvent]) -> Vec<Self> {
        let session_id: u64 = session.id.value();
        let mut events: Vec<Self> = audit_events
            .iter()
            .filter_map(|event| {
                let participant: &Participant = session.queue.get(event.participant.as_ref()?)?;
                match event.action {
                    Action::WindowOpened => Some(Self::BidWindowOpened {
                        session_id,
                        participant: participant.user_id().to_string(),
                        window_end: format_timestamp(
                            event.timestamp + window_duration(session.bid_window_duration_minutes),
                        ),
                    }),
                    Action::MovedToBack => Some(Self::MovedToBack {
                        session_id,
                        participant: participant.user_id().to_string(),
                        attempts: participant.attempts,
                    }),
                    _ => None,
                }
            })
            .collect();
        events.push(Self::SessionUpdated {
            session_id,
            summary: Box::new(SessionSummary::from(session)),
        });
        events
    }
}

/// Fire-and-forget delivery of session notifications.
///
/// Implementations must not block; the engine never waits on delivery.
pub trait EventSink {
    /// Delivers one event.
    fn publish(&self, event: SessionEvent);
}
