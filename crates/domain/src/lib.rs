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

mod auto_assign;
mod capacity;
mod error;
mod participant;
mod policy;
mod queue;
mod time_window;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use auto_assign::{best_fit, fit_score};
pub use capacity::{InMemoryLedger, SlotAvailability, Station, StationCapacityLedger};
pub use error::{DomainError, ErrorKind};
pub use participant::{BidAttempt, BidOutcome, Participant, UserProfile};
pub use policy::{DEFAULT_MAX_ATTEMPTS, SessionPolicy};
pub use queue::ParticipantQueue;
pub use time_window::{TimeWindow, window_duration};
pub use types::{Assignment, Role, SessionId, SessionStatus, Shift, StationId, UserId};
pub use validation::{
    MAX_AUTO_ASSIGN_TIMEOUT_MINUTES, MAX_BID_WINDOW_MINUTES, SessionSettings, validate_profile,
    validate_schedule, validate_session_settings,
};
