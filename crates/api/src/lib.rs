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

mod directory;
mod error;
mod events;
mod request_response;
mod service;

#[cfg(test)]
mod tests;

pub use directory::{InMemoryUserDirectory, UserDirectory};
pub use error::{ApiError, translate_core_error, translate_domain_error};
pub use events::{EventSink, SessionEvent};
pub use request_response::{
    CreateSessionRequest, HistoryEntryResponse, ParticipantSummary, SessionSummary, SlotSummary,
    StationSummary, SweepReport, format_timestamp,
};
pub use service::{SWEEPER_ACTOR, SessionService, SharedLedger};
