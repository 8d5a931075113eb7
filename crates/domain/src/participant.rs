// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::time_window::TimeWindow;
use crate::types::{Assignment, Role, Shift, StationId, UserId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Seniority and preference data supplied by the identity service.
///
/// Read once when a participant is added; never re-queried mid-session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user's identity.
    pub user_id: UserId,
    /// Display name.
    pub display_name: String,
    /// Ordering key; higher bids earlier.
    pub priority: i64,
    /// The station the user currently works at.
    pub home_station: Option<StationId>,
    /// The shift the user would like.
    pub preferred_shift: Option<Shift>,
    /// The role the user is qualified for. `None` means any role.
    pub qualified_role: Option<Role>,
}

/// How a bid attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidOutcome {
    /// Participant chose a slot.
    Accepted,
    /// The engine chose a slot on the participant's behalf.
    AutoAssigned,
    /// The window lapsed without a bid.
    TimedOut,
    /// An operator released the previously held slot.
    Released,
}

/// One entry in a participant's bid history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidAttempt {
    /// When the attempt was recorded.
    pub at: OffsetDateTime,
    /// The slot involved, if any.
    pub assignment: Option<Assignment>,
    /// How it ended.
    pub outcome: BidOutcome,
}

/// One user's position and state within a session's queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// The participant's profile as captured at add time.
    pub profile: UserProfile,
    /// 0-based position in the queue.
    pub queue_position: usize,
    /// The open bid window; `None` when not current.
    pub time_window: Option<TimeWindow>,
    /// Set once the participant has an assignment. Never reset.
    pub has_bid: bool,
    /// The slot the participant holds.
    pub assignment: Option<Assignment>,
    /// Whether the assignment was made by the engine.
    pub auto_assigned: bool,
    /// Whether the participant was ever moved to the back.
    pub moved_to_back: bool,
    /// Number of lapsed windows.
    pub attempts: u32,
    /// Append-only audit of attempts.
    pub bid_history: Vec<BidAttempt>,
}

impl Participant {
    /// Creates a participant from a user profile.
    #[must_use]
    pub const fn new(profile: UserProfile, queue_position: usize) -> Self {
        Self {
            profile,
            queue_position,
            time_window: None,
            has_bid: false,
            assignment: None,
            auto_assigned: false,
            moved_to_back: false,
            attempts: 0,
            bid_history: Vec::new(),
        }
    }

    /// Returns the participant's user id.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.profile.user_id
    }

    /// Returns the participant's priority.
    #[must_use]
    pub const fn priority(&self) -> i64 {
        self.profile.priority
    }

    /// A participant may take a turn until they bid or run out of attempts.
    #[must_use]
    pub const fn is_eligible(&self, max_attempts: u32) -> bool {
        !self.has_bid && self.attempts < max_attempts
    }

    /// Returns true if the participant needs no further turns.
    #[must_use]
    pub const fn is_resolved(&self, max_attempts: u32) -> bool {
        !self.is_eligible(max_attempts)
    }

    /// Records a successful bid or auto-assignment.
    pub fn record_assignment(&mut self, assignment: Assignment, at: OffsetDateTime, auto: bool) {
        self.has_bid = true;
        self.assignment = Some(assignment);
        self.auto_assigned = auto;
        self.time_window = None;
        self.bid_history.push(BidAttempt {
            at,
            assignment: Some(assignment),
            outcome: if auto {
                BidOutcome::AutoAssigned
            } else {
                BidOutcome::Accepted
            },
        });
    }

    /// Records a lapsed window.
    pub fn record_timeout(&mut self, at: OffsetDateTime) {
        self.attempts = self.attempts.saturating_add(1);
        self.moved_to_back = true;
        self.time_window = None;
        self.bid_history.push(BidAttempt {
            at,
            assignment: None,
            outcome: BidOutcome::TimedOut,
        });
    }

    /// Clears the held slot. `has_bid` stays set.
    ///
    /// Returns the released assignment, if there was one.
    pub fn release_assignment(&mut self, at: OffsetDateTime) -> Option<Assignment> {
        let released: Assignment = self.assignment.take()?;
        self.bid_history.push(BidAttempt {
            at,
            assignment: Some(released),
            outcome: BidOutcome::Released,
        });
        Some(released)
    }
}
