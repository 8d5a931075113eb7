// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bounded decision windows for the current participant.
//!
//! ## Invariants
//!
//! - A window is only ever created by [`TimeWindow::open`]
//! - Windows are never shortened or extended; reopening replaces them
//! - Expiry is wall-clock based: `now > end`, so a window is still open at
//!   exactly its end instant
//! - Pausing a session does not stop a window from expiring

use time::{Duration, OffsetDateTime};

/// A bid window for one participant's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl TimeWindow {
    /// Opens a window starting at `now` and lasting `duration`.
    #[must_use]
    pub fn open(now: OffsetDateTime, duration: Duration) -> Self {
        Self {
            start: now,
            end: now + duration,
        }
    }

    /// Returns the window start.
    #[must_use]
    pub const fn start(&self) -> OffsetDateTime {
        self.start
    }

    /// Returns the window end.
    #[must_use]
    pub const fn end(&self) -> OffsetDateTime {
        self.end
    }

    /// Returns true iff `now` is strictly after the window end.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.end
    }

    /// Time left before expiry, zero once expired.
    #[must_use]
    pub fn remaining(&self, now: OffsetDateTime) -> Duration {
        if self.is_expired(now) {
            Duration::ZERO
        } else {
            self.end - now
        }
    }
}

/// Converts a configured minute count into a window duration.
#[must_use]
pub fn window_duration(minutes: u32) -> Duration {
    Duration::minutes(i64::from(minutes))
}
