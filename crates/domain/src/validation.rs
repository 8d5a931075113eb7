// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::participant::UserProfile;
use time::OffsetDateTime;

/// Longest allowed bid window: one day.
pub const MAX_BID_WINDOW_MINUTES: u32 = 24 * 60;

/// Longest allowed auto-assign timeout: one week.
pub const MAX_AUTO_ASSIGN_TIMEOUT_MINUTES: u32 = 7 * 24 * 60;

/// Descriptive and timing settings for a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Display name. Opaque to the engine.
    pub name: String,
    /// Bid year. Opaque to the engine.
    pub year: u16,
    /// Free-form description. Opaque to the engine.
    pub description: Option<String>,
    /// Length of each participant's bid window.
    pub bid_window_duration_minutes: u32,
    /// Operator-facing auto-assign timeout, carried for display.
    pub auto_assign_timeout_minutes: u32,
}

/// Validates settings for a new session.
///
/// # Arguments
///
/// * `settings` - The settings to validate
///
/// # Errors
///
/// Returns an error if:
/// - The name is empty
/// - The year is outside 1900-2200
/// - The bid window is zero or longer than a day
/// - The auto-assign timeout is zero or longer than a week
pub fn validate_session_settings(settings: &SessionSettings) -> Result<(), DomainError> {
    if settings.name.trim().is_empty() {
        return Err(DomainError::InvalidInput {
            field: "name",
            reason: String::from("Name cannot be empty"),
        });
    }

    if !(1900..=2200).contains(&settings.year) {
        return Err(DomainError::InvalidInput {
            field: "year",
            reason: format!("Year must be between 1900 and 2200, got {}", settings.year),
        });
    }

    if !(1..=MAX_BID_WINDOW_MINUTES).contains(&settings.bid_window_duration_minutes) {
        return Err(DomainError::InvalidInput {
            field: "bid_window_duration_minutes",
            reason: format!(
                "Must be between 1 and {MAX_BID_WINDOW_MINUTES}, got {}",
                settings.bid_window_duration_minutes
            ),
        });
    }

    if !(1..=MAX_AUTO_ASSIGN_TIMEOUT_MINUTES).contains(&settings.auto_assign_timeout_minutes) {
        return Err(DomainError::InvalidInput {
            field: "auto_assign_timeout_minutes",
            reason: format!(
                "Must be between 1 and {MAX_AUTO_ASSIGN_TIMEOUT_MINUTES}, got {}",
                settings.auto_assign_timeout_minutes
            ),
        });
    }

    Ok(())
}

/// Validates a scheduled start/end pair.
///
/// # Errors
///
/// Returns an error if `start` is not strictly before `end`.
pub fn validate_schedule(start: OffsetDateTime, end: OffsetDateTime) -> Result<(), DomainError> {
    if start >= end {
        return Err(DomainError::InvalidInput {
            field: "scheduled_end",
            reason: String::from("Scheduled end must be after scheduled start"),
        });
    }
    Ok(())
}

/// Validates a profile returned by the identity service.
///
/// # Errors
///
/// Returns an error if the user id or display name is empty.
pub fn validate_profile(profile: &UserProfile) -> Result<(), DomainError> {
    if profile.user_id.value().is_empty() {
        return Err(DomainError::InvalidInput {
            field: "user_id",
            reason: String::from("User id cannot be empty"),
        });
    }
    if profile.display_name.trim().is_empty() {
        return Err(DomainError::InvalidInput {
            field: "display_name",
            reason: String::from("Display name cannot be empty"),
        });
    }
    Ok(())
}
