// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use shift_bid_domain::{Assignment, UserId, UserProfile};
use time::OffsetDateTime;

/// A command represents user or system intent as data only.
///
/// Commands are the only way to request session state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a participant to a draft or scheduled session.
    AddParticipant {
        /// The participant's profile, read from the user directory.
        profile: UserProfile,
    },
    /// Remove a participant from a draft or scheduled session.
    RemoveParticipant {
        /// The participant to remove.
        participant: UserId,
    },
    /// Plan the session's start and end.
    Schedule {
        /// Planned start.
        start: OffsetDateTime,
        /// Planned end.
        end: OffsetDateTime,
    },
    /// Begin bidding and open the first window.
    Start,
    /// Suspend bidding. The current window keeps running.
    Pause,
    /// Continue bidding with a fresh window for the current participant.
    Resume,
    /// Claim a slot for the current participant.
    SubmitBid {
        /// The bidding participant.
        participant: UserId,
        /// The requested slot.
        assignment: Assignment,
    },
    /// Give the current participant the best-fit slot.
    AutoAssign {
        /// The participant to assign.
        participant: UserId,
    },
    /// Move the current participant to the back if their window lapsed.
    /// A no-op otherwise.
    CheckExpiration,
    /// Move the current participant to the back unconditionally.
    MoveToBack,
    /// End bidding.
    Complete,
    /// Abandon the session.
    Cancel,
    /// Give back a participant's slot.
    ReleaseAssignment {
        /// The participant whose slot is released.
        participant: UserId,
    },
}

impl Command {
    /// Returns the command's name for logs and authorization messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddParticipant { .. } => "add_participant",
            Self::RemoveParticipant { .. } => "remove_participant",
            Self::Schedule { .. } => "schedule",
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::SubmitBid { .. } => "submit_bid",
            Self::AutoAssign { .. } => "auto_assign",
            Self::CheckExpiration => "check_expiration",
            Self::MoveToBack => "move_to_back",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::ReleaseAssignment { .. } => "release_assignment",
        }
    }

    /// Returns true if only operators may issue this command.
    ///
    /// Participants may submit their own bids and trigger an expiration
    /// check; everything else is an operator action.
    #[must_use]
    pub const fn requires_admin(&self) -> bool {
        !matches!(self, Self::SubmitBid { .. } | Self::CheckExpiration)
    }
}
