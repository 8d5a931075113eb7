// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Seed data for the station ledger and the user directory.
//!
//! Both are plain JSON arrays. Stations:
//!
//! ```json
//! [{ "id": 1, "name": "Downtown", "slots": [{ "shift": "A", "role": "captain", "capacity": 1 }] }]
//! ```
//!
//! Users are serialized `UserProfile` values.

use serde::Deserialize;
use shift_bid_domain::{
    InMemoryLedger, Role, Shift, Station, StationId, UserProfile, validate_profile,
};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading seed data.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The file is not valid JSON for its seed type.
    #[error("Failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_json::Error,
    },

    /// The seed parsed but describes an impossible setup.
    #[error("Invalid seed data in {origin}: {reason}")]
    Invalid { origin: String, reason: String },
}

/// One station entry in a seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct StationSeed {
    /// Station number.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Whether the station accepts assignments.
    #[serde(default = "active_by_default")]
    pub active: bool,
    /// Slot capacities.
    #[serde(default)]
    pub slots: Vec<SlotSeed>,
}

/// Capacity of one (shift, role) slot.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SlotSeed {
    pub shift: Shift,
    pub role: Role,
    pub capacity: u32,
}

const fn active_by_default() -> bool {
    true
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Loads a station seed file into a ledger.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or lists a
/// station number twice.
pub fn load_stations(path: &Path) -> Result<InMemoryLedger, ConfigError> {
    parse_stations(&read(path)?, &path.display().to_string())
}

/// Builds a ledger from station seed JSON.
///
/// # Arguments
///
/// * `json` - The seed document
/// * `origin` - Where the document came from, for error messages
///
/// # Errors
///
/// Returns an error if the JSON is malformed or lists a station number
/// twice.
pub fn parse_stations(json: &str, origin: &str) -> Result<InMemoryLedger, ConfigError> {
    let seeds: Vec<StationSeed> =
        serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;

    let mut ledger: InMemoryLedger = InMemoryLedger::new();
    let mut seen: BTreeSet<u32> = BTreeSet::new();
    for seed in seeds {
        if !seen.insert(seed.id) {
            return Err(ConfigError::Invalid {
                origin: origin.to_string(),
                reason: format!("station {} is listed twice", seed.id),
            });
        }
        let mut station: Station = Station::new(StationId::new(seed.id), &seed.name);
        for slot in seed.slots {
            station.set_capacity(slot.shift, slot.role, slot.capacity);
        }
        station.set_active(seed.active);
        ledger.add_station(station);
    }
    Ok(ledger)
}

/// Loads a user seed file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a profile is
/// invalid, or a user id repeats.
pub fn load_users(path: &Path) -> Result<Vec<UserProfile>, ConfigError> {
    parse_users(&read(path)?, &path.display().to_string())
}

/// Parses and validates user seed JSON.
///
/// # Errors
///
/// Returns an error if the JSON is malformed, a profile is invalid, or a
/// user id repeats.
pub fn parse_users(json: &str, origin: &str) -> Result<Vec<UserProfile>, ConfigError> {
    let profiles: Vec<UserProfile> =
        serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for profile in &profiles {
        validate_profile(profile).map_err(|err| ConfigError::Invalid {
            origin: origin.to_string(),
            reason: err.to_string(),
        })?;
        if !seen.insert(profile.user_id.value()) {
            return Err(ConfigError::Invalid {
                origin: origin.to_string(),
                reason: format!("user '{}' is listed twice", profile.user_id),
            });
        }
    }
    Ok(profiles)
}
