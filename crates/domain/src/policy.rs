// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;

/// Default number of lapsed windows before a participant is skipped for good.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Engine-wide rules applied to every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    max_attempts: u32,
    auto_assign_on_exhaustion: bool,
}

impl SessionPolicy {
    /// Creates a validated policy.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Lapsed windows allowed per participant (at least 1)
    /// * `auto_assign_on_exhaustion` - Auto-assign a participant whose last
    ///   window lapses instead of leaving them unassigned
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPolicy` if `max_attempts` is zero.
    pub fn new(max_attempts: u32, auto_assign_on_exhaustion: bool) -> Result<Self, DomainError> {
        if max_attempts == 0 {
            return Err(DomainError::InvalidPolicy(String::from(
                "max_attempts must be at least 1",
            )));
        }
        Ok(Self {
            max_attempts,
            auto_assign_on_exhaustion,
        })
    }

    /// Lapsed windows allowed per participant.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether exhausted participants are auto-assigned.
    #[must_use]
    pub const fn auto_assign_on_exhaustion(&self) -> bool {
        self.auto_assign_on_exhaustion
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            auto_assign_on_exhaustion: false,
        }
    }
}
