// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifies a bidding session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a new `SessionId`.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to a user identity owned by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId {
    value: String,
}

impl UserId {
    /// Creates a new `UserId`.
    ///
    /// Surrounding whitespace is trimmed so that header and body values compare equal.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            value: value.trim().to_string(),
        }
    }

    /// Returns the identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Station identifier.
///
/// Stations are identified by their station number, which also defines
/// their ordering for deterministic tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(u32);

impl StationId {
    /// Creates a new `StationId` from a station number.
    #[must_use]
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    /// Returns the station number.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Station {}", self.0)
    }
}

/// A rotating shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Shift {
    A,
    B,
    C,
}

impl Shift {
    /// All shifts in tie-break order.
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];

    /// Returns the string representation of the shift.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

impl FromStr for Shift {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            _ => Err(DomainError::InvalidShift(s.to_string())),
        }
    }
}

impl std::fmt::Display for Shift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The position a participant fills on a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Captain,
    Engineer,
    Firefighter,
    Paramedic,
}

impl Role {
    /// All roles in tie-break order.
    pub const ALL: [Self; 4] = [
        Self::Captain,
        Self::Engineer,
        Self::Firefighter,
        Self::Paramedic,
    ];

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Captain => "captain",
            Self::Engineer => "engineer",
            Self::Firefighter => "firefighter",
            Self::Paramedic => "paramedic",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "captain" => Ok(Self::Captain),
            "engineer" => Ok(Self::Engineer),
            "firefighter" => Ok(Self::Firefighter),
            "paramedic" => Ok(Self::Paramedic),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A concrete work assignment: one slot on a station's shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    /// The station.
    pub station: StationId,
    /// The shift.
    pub shift: Shift,
    /// The role filled.
    pub role: Role,
}

impl Assignment {
    /// Creates a new `Assignment`.
    #[must_use]
    pub const fn new(station: StationId, shift: Shift, role: Role) -> Self {
        Self {
            station,
            shift,
            role,
        }
    }
}

impl std::fmt::Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / Shift {} / {}", self.station, self.shift, self.role)
    }
}

/// Lifecycle state of a bidding session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created; roster may still change.
    #[default]
    Draft,
    /// Start and end dates published; roster may still change.
    Scheduled,
    /// Turns are running.
    Active,
    /// Turns are suspended.
    Paused,
    /// Every participant is resolved or an operator closed the session.
    Completed,
    /// Abandoned by an operator.
    Cancelled,
}

impl SessionStatus {
    /// Converts this status to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Checks if a transition from this status to another is valid.
    ///
    /// Valid transitions are:
    /// - Draft → Scheduled
    /// - Draft | Scheduled → Active
    /// - Active ⇄ Paused
    /// - Active | Paused → Completed
    /// - any non-terminal status → Cancelled
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Scheduled | Self::Active)
                | (Self::Scheduled | Self::Paused, Self::Active)
                | (Self::Active, Self::Paused)
                | (Self::Active | Self::Paused, Self::Completed)
                | (
                    Self::Draft | Self::Scheduled | Self::Active | Self::Paused,
                    Self::Cancelled
                )
        )
    }

    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns whether participants may be added or removed.
    #[must_use]
    pub const fn allows_roster_changes(&self) -> bool {
        matches!(self, Self::Draft | Self::Scheduled)
    }

    /// Returns whether the session may be deleted.
    ///
    /// Running and completed sessions are retained.
    #[must_use]
    pub const fn is_deletable(&self) -> bool {
        !matches!(self, Self::Active | Self::Completed)
    }
}

impl FromStr for SessionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
