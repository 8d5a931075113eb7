// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Best-fit slot selection for auto-assignment.
//!
//! ## Scoring
//!
//! For each free slot the participant may fill:
//!
//! ```text
//! score = 10 (shift matches preferred shift)
//!       +  5 (station matches home station)
//!       + (capacity - occupied)
//! ```
//!
//! ## Tie-breaking
//!
//! Equal scores resolve to the lowest station number, then the earliest
//! shift (A < B < C), then the earliest role in declaration order. The
//! result never depends on ledger iteration order.

use crate::capacity::SlotAvailability;
use crate::participant::UserProfile;
use crate::types::{Assignment, Role, Shift};
use std::cmp::Ordering;

const PREFERRED_SHIFT_BONUS: u64 = 10;
const HOME_STATION_BONUS: u64 = 5;

/// Computes the fit score of a slot for a participant.
#[must_use]
pub fn fit_score(profile: &UserProfile, slot: &SlotAvailability) -> u64 {
    let mut score: u64 = u64::from(slot.free());
    if profile.preferred_shift == Some(slot.assignment.shift) {
        score += PREFERRED_SHIFT_BONUS;
    }
    if profile.home_station == Some(slot.assignment.station) {
        score += HOME_STATION_BONUS;
    }
    score
}

/// Selects the best free slot for a participant.
///
/// Slots that are full, or whose role the participant is not qualified
/// for, are skipped. Returns `None` if nothing fits.
#[must_use]
pub fn best_fit(profile: &UserProfile, slots: &[SlotAvailability]) -> Option<Assignment> {
    slots
        .iter()
        .filter(|slot| slot.free() > 0)
        .filter(|slot| {
            profile
                .qualified_role
                .is_none_or(|role| role == slot.assignment.role)
        })
        .map(|slot| (fit_score(profile, slot), slot.assignment))
        .max_by(|(score_a, a), (score_b, b)| match score_a.cmp(score_b) {
            // Lower tie-break key wins, so it must compare as greater
            Ordering::Equal => tie_break_key(b).cmp(&tie_break_key(a)),
            other => other,
        })
        .map(|(_, assignment)| assignment)
}

fn tie_break_key(assignment: &Assignment) -> (u32, Shift, Role) {
    (
        assignment.station.number(),
        assignment.shift,
        assignment.role,
    )
}
