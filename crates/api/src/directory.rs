// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Identity and seniority lookup.

use shift_bid_domain::{UserId, UserProfile};
use std::collections::BTreeMap;

/// Source of user profiles.
///
/// Consulted only when a participant is added; sessions keep their own copy
/// of the profile afterwards.
pub trait UserDirectory {
    /// Looks up a user's profile.
    fn get_user(&self, user_id: &UserId) -> Option<UserProfile>;
}

/// A fixed directory held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: BTreeMap<UserId, UserProfile>,
}

impl InMemoryUserDirectory {
    /// Creates a directory from a list of profiles. Later duplicates win.
    #[must_use]
    pub fn new(profiles: Vec<UserProfile>) -> Self {
        Self {
            users: profiles
                .into_iter()
                .map(|profile| (profile.user_id.clone(), profile))
                .collect(),
        }
    }

    /// Number of known users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns true if the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn get_user(&self, user_id: &UserId) -> Option<UserProfile> {
        self.users.get(user_id).cloned()
    }
}
