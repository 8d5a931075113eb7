// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Station capacity ledger.
//!
//! Tracks, per station, shift and role, how many slots exist and who holds
//! them. The ledger is shared by every session; callers must hold exclusive
//! access across a check-then-reserve sequence.
//!
//! ## Invariants
//!
//! - Holders of a slot never exceed its capacity
//! - A user holds at most one slot across the whole ledger

use crate::error::DomainError;
use crate::types::{Assignment, Role, Shift, StationId, UserId};
use std::collections::BTreeMap;

/// Availability of one (station, shift, role) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAvailability {
    /// The slot.
    pub assignment: Assignment,
    /// Total positions.
    pub capacity: u32,
    /// Positions taken.
    pub occupied: u32,
}

impl SlotAvailability {
    /// Free positions remaining.
    #[must_use]
    pub const fn free(&self) -> u32 {
        self.capacity.saturating_sub(self.occupied)
    }
}

/// Capacity operations consumed by the bidding engine.
pub trait StationCapacityLedger {
    /// Returns true if the slot has a free position.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StationNotFound` for unknown or inactive stations.
    fn has_slot(&self, station: StationId, shift: Shift, role: Role) -> Result<bool, DomainError>;

    /// Takes a position in the slot for `participant`.
    ///
    /// # Errors
    ///
    /// Returns an error if the station is unknown, the slot is full, or the
    /// participant already holds a slot.
    fn reserve_slot(
        &mut self,
        station: StationId,
        shift: Shift,
        role: Role,
        participant: &UserId,
    ) -> Result<(), DomainError>;

    /// Gives back a position held by `participant`.
    ///
    /// # Errors
    ///
    /// Returns an error if the station is unknown or the participant does not
    /// hold the slot.
    fn release_slot(
        &mut self,
        station: StationId,
        shift: Shift,
        role: Role,
        participant: &UserId,
    ) -> Result<(), DomainError>;

    /// Lists every slot on active stations, ordered by station number,
    /// then shift, then role.
    fn slots(&self) -> Vec<SlotAvailability>;

    /// Returns true if `participant` holds a slot on any station.
    fn holds_slot(&self, participant: &UserId) -> bool;
}

/// A single slot's capacity and holders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Slot {
    capacity: u32,
    holders: Vec<UserId>,
}

/// A station and its per-shift, per-role slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    id: StationId,
    name: String,
    active: bool,
    slots: BTreeMap<(Shift, Role), Slot>,
}

impl Station {
    /// Creates an active station with no slots.
    #[must_use]
    pub fn new(id: StationId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            active: true,
            slots: BTreeMap::new(),
        }
    }

    /// Sets the capacity of one slot, builder style.
    #[must_use]
    pub fn with_capacity(mut self, shift: Shift, role: Role, capacity: u32) -> Self {
        self.set_capacity(shift, role, capacity);
        self
    }

    /// Sets the capacity of one slot.
    ///
    /// Existing holders are kept even if they now exceed the capacity; new
    /// reservations are refused until enough are released.
    pub fn set_capacity(&mut self, shift: Shift, role: Role, capacity: u32) {
        self.slots.entry((shift, role)).or_default().capacity = capacity;
    }

    /// Marks the station as active or inactive.
    pub const fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Returns the station id.
    #[must_use]
    pub const fn id(&self) -> StationId {
        self.id
    }

    /// Returns the station name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the station accepts assignments.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Occupancy of every slot on this station.
    #[must_use]
    pub fn availability(&self) -> Vec<SlotAvailability> {
        self.slots
            .iter()
            .map(|((shift, role), slot)| SlotAvailability {
                assignment: Assignment::new(self.id, *shift, *role),
                capacity: slot.capacity,
                occupied: u32::try_from(slot.holders.len()).unwrap_or(u32::MAX),
            })
            .collect()
    }

    fn holds(&self, participant: &UserId) -> bool {
        self.slots
            .values()
            .any(|slot| slot.holders.contains(participant))
    }
}

/// In-process ledger keyed by station number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryLedger {
    stations: BTreeMap<StationId, Station>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stations: BTreeMap::new(),
        }
    }

    /// Adds or replaces a station.
    pub fn add_station(&mut self, station: Station) {
        self.stations.insert(station.id(), station);
    }

    /// Returns a station.
    #[must_use]
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    /// Returns a station, mutably.
    pub fn station_mut(&mut self, id: StationId) -> Option<&mut Station> {
        self.stations.get_mut(&id)
    }

    /// Iterates stations by ascending number.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// Returns `(occupied, capacity)` for a slot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StationNotFound` if the station is unknown.
    pub fn occupancy(
        &self,
        station: StationId,
        shift: Shift,
        role: Role,
    ) -> Result<(u32, u32), DomainError> {
        let found: &Station = self
            .stations
            .get(&station)
            .ok_or(DomainError::StationNotFound(station))?;
        Ok(found
            .slots
            .get(&(shift, role))
            .map_or((0, 0), |slot| {
                (
                    u32::try_from(slot.holders.len()).unwrap_or(u32::MAX),
                    slot.capacity,
                )
            }))
    }

    fn active_station(&self, station: StationId) -> Result<&Station, DomainError> {
        self.stations
            .get(&station)
            .filter(|s| s.is_active())
            .ok_or(DomainError::StationNotFound(station))
    }
}

impl StationCapacityLedger for InMemoryLedger {
    fn has_slot(&self, station: StationId, shift: Shift, role: Role) -> Result<bool, DomainError> {
        let found: &Station = self.active_station(station)?;
        Ok(found
            .slots
            .get(&(shift, role))
            .is_some_and(|slot| slot.holders.len() < slot.capacity as usize))
    }

    fn reserve_slot(
        &mut self,
        station: StationId,
        shift: Shift,
        role: Role,
        participant: &UserId,
    ) -> Result<(), DomainError> {
        self.active_station(station)?;
        if self.holds_slot(participant) {
            return Err(DomainError::DuplicateReservation(participant.clone()));
        }

        let slot: &mut Slot = self
            .stations
            .get_mut(&station)
            .and_then(|s| s.slots.get_mut(&(shift, role)))
            .filter(|slot| slot.holders.len() < slot.capacity as usize)
            .ok_or(DomainError::SlotUnavailable {
                station,
                shift,
                role,
            })?;

        slot.holders.push(participant.clone());
        Ok(())
    }

    fn release_slot(
        &mut self,
        station: StationId,
        shift: Shift,
        role: Role,
        participant: &UserId,
    ) -> Result<(), DomainError> {
        let slot: &mut Slot = self
            .stations
            .get_mut(&station)
            .ok_or(DomainError::StationNotFound(station))?
            .slots
            .get_mut(&(shift, role))
            .ok_or_else(|| DomainError::AssignmentNotFound(participant.clone()))?;

        let before: usize = slot.holders.len();
        slot.holders.retain(|holder| holder != participant);
        if slot.holders.len() == before {
            return Err(DomainError::AssignmentNotFound(participant.clone()));
        }
        Ok(())
    }

    fn slots(&self) -> Vec<SlotAvailability> {
        self.stations
            .values()
            .filter(|s| s.is_active())
            .flat_map(Station::availability)
            .collect()
    }

    fn holds_slot(&self, participant: &UserId) -> bool {
        self.stations.values().any(|s| s.holds(participant))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ledger() -> InMemoryLedger {
        let mut ledger: InMemoryLedger = InMemoryLedger::new();
        ledger.add_station(
            Station::new(StationId::new(1), "Downtown")
                .with_capacity(Shift::A, Role::Captain, 1)
                .with_capacity(Shift::B, Role::Firefighter, 2),
        );
        ledger
    }

    #[test]
    fn test_reserve_until_full() {
        let mut ledger: InMemoryLedger = ledger();
        let station: StationId = StationId::new(1);

        assert!(ledger.has_slot(station, Shift::A, Role::Captain).unwrap());
        ledger
            .reserve_slot(station, Shift::A, Role::Captain, &UserId::new("u1"))
            .unwrap();

        assert!(!ledger.has_slot(station, Shift::A, Role::Captain).unwrap());
        assert_eq!(
            ledger.occupancy(station, Shift::A, Role::Captain).unwrap(),
            (1, 1)
        );
        let result = ledger.reserve_slot(station, Shift::A, Role::Captain, &UserId::new("u2"));
        assert!(matches!(result, Err(DomainError::SlotUnavailable { .. })));
    }

    #[test]
    fn test_holds_slot_follows_reserve_and_release() {
        let mut ledger: InMemoryLedger = ledger();
        let station: StationId = StationId::new(1);
        let user: UserId = UserId::new("u1");

        assert!(!ledger.holds_slot(&user));
        ledger
            .reserve_slot(station, Shift::B, Role::Firefighter, &user)
            .unwrap();
        assert!(ledger.holds_slot(&user));
        assert!(!ledger.holds_slot(&UserId::new("u2")));

        ledger
            .release_slot(station, Shift::B, Role::Firefighter, &user)
            .unwrap();
        assert!(!ledger.holds_slot(&user));
    }

    #[test]
    fn test_unknown_slot_has_no_capacity() {
        let ledger: InMemoryLedger = ledger();
        assert!(
            !ledger
                .has_slot(StationId::new(1), Shift::C, Role::Paramedic)
                .unwrap()
        );
    }

    #[test]
    fn test_unknown_station_is_not_found() {
        let ledger: InMemoryLedger = ledger();
        let result = ledger.has_slot(StationId::new(9), Shift::A, Role::Captain);
        assert_eq!(result, Err(DomainError::StationNotFound(StationId::new(9))));
    }

    #[test]
    fn test_inactive_station_rejects_reservations() {
        let mut ledger: InMemoryLedger = ledger();
        ledger.station_mut(StationId::new(1)).unwrap().set_active(false);

        assert!(ledger.slots().is_empty());
        let result = ledger.reserve_slot(
            StationId::new(1),
            Shift::B,
            Role::Firefighter,
            &UserId::new("u1"),
        );
        assert!(matches!(result, Err(DomainError::StationNotFound(_))));
    }

    #[test]
    fn test_user_holds_at_most_one_slot() {
        let mut ledger: InMemoryLedger = ledger();
        let user: UserId = UserId::new("u1");
        ledger
            .reserve_slot(StationId::new(1), Shift::B, Role::Firefighter, &user)
            .unwrap();

        let result = ledger.reserve_slot(StationId::new(1), Shift::A, Role::Captain, &user);
        assert_eq!(result, Err(DomainError::DuplicateReservation(user)));
    }

    #[test]
    fn test_release_frees_position() {
        let mut ledger: InMemoryLedger = ledger();
        let user: UserId = UserId::new("u1");
        let station: StationId = StationId::new(1);
        ledger
            .reserve_slot(station, Shift::A, Role::Captain, &user)
            .unwrap();

        ledger
            .release_slot(station, Shift::A, Role::Captain, &user)
            .unwrap();

        assert!(ledger.has_slot(station, Shift::A, Role::Captain).unwrap());
        assert!(
            ledger
                .release_slot(station, Shift::A, Role::Captain, &user)
                .is_err()
        );
    }

    #[test]
    fn test_slots_are_ordered() {
        let ledger: InMemoryLedger = ledger();
        let slots: Vec<SlotAvailability> = ledger.slots();

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].assignment.shift, Shift::A);
        assert_eq!(slots[1].assignment.shift, Shift::B);
        assert_eq!(slots[1].free(), 2);
    }
}
