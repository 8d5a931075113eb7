// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Ordered participant queue.
//!
//! Participants live in an arena that is never reordered while a session
//! runs; turn order is a separate list of arena slots. Moving a participant
//! to the back only touches the order list, so arena slots stay valid.
//!
//! ## Invariants
//!
//! - `queue_position` values form a contiguous permutation of `0..len`
//! - Each user appears at most once
//! - Initial order is priority descending; equal priorities keep insertion order

use crate::error::DomainError;
use crate::participant::{Participant, UserProfile};
use crate::types::UserId;

/// Ordered collection of participants with stable identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantQueue {
    arena: Vec<Participant>,
    order: Vec<usize>,
}

impl ParticipantQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            arena: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Number of participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if the queue has no participants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Adds a participant and re-sorts the queue by priority.
    ///
    /// Only valid before the session starts.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DuplicateParticipant` if the user is already queued.
    pub fn insert(&mut self, profile: UserProfile) -> Result<(), DomainError> {
        if self.contains(&profile.user_id) {
            return Err(DomainError::DuplicateParticipant(profile.user_id));
        }

        self.arena.push(Participant::new(profile, self.arena.len()));
        self.order.push(self.arena.len() - 1);

        // Stable sort: equal priorities keep insertion order
        let arena: &[Participant] = &self.arena;
        self.order
            .sort_by(|a, b| arena[*b].priority().cmp(&arena[*a].priority()));
        self.renumber();
        Ok(())
    }

    /// Removes a participant. Only valid before the session starts.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ParticipantNotFound` if the user is not queued.
    pub fn remove(&mut self, user_id: &UserId) -> Result<Participant, DomainError> {
        let slot: usize = self
            .slot_of(user_id)
            .ok_or_else(|| DomainError::ParticipantNotFound(user_id.clone()))?;

        let removed: Participant = self.arena.remove(slot);
        self.order.retain(|s| *s != slot);
        for s in &mut self.order {
            if *s > slot {
                *s -= 1;
            }
        }
        self.renumber();
        Ok(removed)
    }

    /// Returns true if the user is queued.
    #[must_use]
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.slot_of(user_id).is_some()
    }

    /// Iterates participants in turn order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.order.iter().map(|slot| &self.arena[*slot])
    }

    /// Returns the participant at a queue index.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Participant> {
        self.order.get(index).map(|slot| &self.arena[*slot])
    }

    /// Returns the participant at a queue index, mutably.
    pub fn at_mut(&mut self, index: usize) -> Option<&mut Participant> {
        let slot: usize = *self.order.get(index)?;
        self.arena.get_mut(slot)
    }

    /// Looks up a participant by user id.
    #[must_use]
    pub fn get(&self, user_id: &UserId) -> Option<&Participant> {
        self.slot_of(user_id).map(|slot| &self.arena[slot])
    }

    /// Looks up a participant by user id, mutably.
    pub fn get_mut(&mut self, user_id: &UserId) -> Option<&mut Participant> {
        let slot: usize = self.slot_of(user_id)?;
        self.arena.get_mut(slot)
    }

    /// Returns the queue index of a user.
    #[must_use]
    pub fn index_of(&self, user_id: &UserId) -> Option<usize> {
        let slot: usize = self.slot_of(user_id)?;
        self.order.iter().position(|s| *s == slot)
    }

    /// Finds the first participant in turn order that may still bid.
    #[must_use]
    pub fn first_eligible(&self, max_attempts: u32) -> Option<usize> {
        self.iter().position(|p| p.is_eligible(max_attempts))
    }

    /// Returns true if every participant has bid or exhausted their attempts.
    #[must_use]
    pub fn all_resolved(&self, max_attempts: u32) -> bool {
        self.iter().all(|p| p.is_resolved(max_attempts))
    }

    /// Moves the participant at `index` to the end of the queue and
    /// recomputes every position.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidInput` if `index` is out of range.
    pub fn move_to_back(&mut self, index: usize) -> Result<(), DomainError> {
        if index >= self.order.len() {
            return Err(DomainError::InvalidInput {
                field: "queue_index",
                reason: format!("{index} is outside a queue of {}", self.order.len()),
            });
        }
        let slot: usize = self.order.remove(index);
        self.order.push(slot);
        self.renumber();
        Ok(())
    }

    /// Number of participants that were moved to the back at least once.
    #[must_use]
    pub fn moved_to_back_count(&self) -> usize {
        self.arena.iter().filter(|p| p.moved_to_back).count()
    }

    /// Checks that positions form a contiguous permutation of `0..len`.
    #[must_use]
    pub fn positions_are_contiguous(&self) -> bool {
        let mut seen: Vec<bool> = vec![false; self.order.len()];
        for participant in &self.arena {
            match seen.get_mut(participant.queue_position) {
                Some(flag) if !*flag => *flag = true,
                _ => return false,
            }
        }
        self.arena.len() == self.order.len() && seen.iter().all(|f| *f)
    }

    fn slot_of(&self, user_id: &UserId) -> Option<usize> {
        self.arena.iter().position(|p| p.user_id() == user_id)
    }

    fn renumber(&mut self) {
        for (position, slot) in self.order.iter().enumerate() {
            self.arena[*slot].queue_position = position;
        }
    }
}
