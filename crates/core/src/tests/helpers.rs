// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Command, CoreError, Session, TransitionResult, apply, create_session};
use shift_bid_audit::Actor;
use shift_bid_domain::{
    Assignment, InMemoryLedger, Role, SessionId, SessionPolicy, SessionSettings, Shift, Station, StationId,
    UserId, UserProfile,
};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

pub const WINDOW_MINUTES: u32 = 30;

pub fn t0() -> OffsetDateTime {
    datetime!(2026-03-02 08:00 UTC)
}

/// A moment just after a window opened at `opened` has lapsed.
pub fn after_window(opened: OffsetDateTime) -> OffsetDateTime {
    opened + Duration::minutes(i64::from(WINDOW_MINUTES)) + Duration::milliseconds(1)
}

pub fn create_test_actor() -> Actor {
    Actor::admin("admin-1")
}

pub fn create_test_settings() -> SessionSettings {
    SessionSettings {
        name: String::from("Spring 2026 Shift Bid"),
        year: 2026,
        description: None,
        bid_window_duration_minutes: WINDOW_MINUTES,
        auto_assign_timeout_minutes: 60,
    }
}

pub fn create_test_profile(id: &str, priority: i64) -> UserProfile {
    UserProfile {
        user_id: UserId::new(id),
        display_name: format!("Firefighter {id}"),
        priority,
        home_station: None,
        preferred_shift: None,
        qualified_role: None,
    }
}

/// Station 1: Shift A captain x1, Shift A firefighter x2, Shift B engineer x1.
/// Station 2: Shift C paramedic x1.
pub fn create_test_ledger() -> InMemoryLedger {
    let mut ledger: InMemoryLedger = InMemoryLedger::new();
    ledger.add_station(
        Station::new(StationId::new(1), "Downtown")
            .with_capacity(Shift::A, Role::Captain, 1)
            .with_capacity(Shift::A, Role::Firefighter, 2)
            .with_capacity(Shift::B, Role::Engineer, 1),
    );
    ledger.add_station(
        Station::new(StationId::new(2), "Harbor").with_capacity(Shift::C, Role::Paramedic, 1),
    );
    ledger
}

/// A session plus the ledger and policy it runs against.
///
/// `run` commits the ledger effect and swaps in the new session the way
/// the service layer does.
pub struct Harness {
    pub session: Session,
    pub ledger: InMemoryLedger,
    pub policy: SessionPolicy,
}

impl Harness {
    /// A draft session with `P0 > P1 > ...` by priority.
    pub fn draft(participants: usize) -> Self {
        let mut harness: Self = Self {
            session: create_session(
                SessionId::new(1),
                create_test_settings(),
                create_test_actor(),
                t0(),
            )
            .unwrap()
            .new_session,
            ledger: create_test_ledger(),
            policy: SessionPolicy::default(),
        };
        for i in 0..participants {
            let priority: i64 = 100 - i64::try_from(i).unwrap();
            harness
                .admin(
                    Command::AddParticipant {
                        profile: create_test_profile(&format!("P{i}"), priority),
                    },
                    t0(),
                )
                .unwrap();
        }
        harness
    }

    /// An active session started at `t0()`.
    pub fn started(participants: usize) -> Self {
        let mut harness: Self = Self::draft(participants);
        harness.admin(Command::Start, t0()).unwrap();
        harness
    }

    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn run(
        &mut self,
        command: Command,
        actor: Actor,
        now: OffsetDateTime,
    ) -> Result<TransitionResult, CoreError> {
        let result: TransitionResult = apply(
            &self.session,
            &self.ledger,
            &self.policy,
            command,
            actor,
            now,
        )?;
        if let Some(effect) = &result.ledger_effect {
            effect.commit(&mut self.ledger).unwrap();
        }
        self.session = result.new_session.clone();
        Ok(result)
    }

    pub fn admin(
        &mut self,
        command: Command,
        now: OffsetDateTime,
    ) -> Result<TransitionResult, CoreError> {
        self.run(command, create_test_actor(), now)
    }

    pub fn bid(
        &mut self,
        participant: &str,
        assignment: Assignment,
        now: OffsetDateTime,
    ) -> Result<TransitionResult, CoreError> {
        let user_id: UserId = UserId::new(participant);
        self.run(
            Command::SubmitBid {
                participant: user_id.clone(),
                assignment,
            },
            Actor::participant(&user_id),
            now,
        )
    }

    pub fn current_id(&self) -> Option<String> {
        self.session
            .current_participant()
            .map(|p| p.user_id().to_string())
    }

    pub fn order(&self) -> Vec<String> {
        self.session
            .queue
            .iter()
            .map(|p| p.user_id().to_string())
            .collect()
    }

    /// Opening time of the current window.
    pub fn window_start(&self) -> OffsetDateTime {
        self.session.current_bid_start.unwrap()
    }
}
