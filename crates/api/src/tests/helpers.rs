// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use crate::{
    CreateSessionRequest, EventSink, InMemoryUserDirectory, SessionEvent, SessionService,
    SessionSummary,
};
use shift_bid::Command;
use shift_bid_audit::Actor;
use shift_bid_domain::{
    InMemoryLedger, Role, SessionId, SessionPolicy, Shift, Station, StationId, UserId,
    UserProfile,
};
use std::sync::{Arc, Mutex};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

pub const WINDOW_MINUTES: u32 = 30;

pub fn t0() -> OffsetDateTime {
    datetime!(2026-03-02 08:00 UTC)
}

pub fn after_window(opened: OffsetDateTime) -> OffsetDateTime {
    opened + Duration::minutes(i64::from(WINDOW_MINUTES)) + Duration::milliseconds(1)
}

pub fn create_test_admin() -> Actor {
    Actor::admin("admin-123")
}

pub fn participant(id: &str) -> Actor {
    Actor::participant(&UserId::new(id))
}

pub fn create_test_request() -> CreateSessionRequest {
    CreateSessionRequest {
        name: String::from("Spring 2026 Shift Bid"),
        year: 2026,
        description: Some(String::from("Annual station bid")),
        bid_window_duration_minutes: WINDOW_MINUTES,
        auto_assign_timeout_minutes: 60,
    }
}

/// Users `P0` to `P9`, in descending priority.
pub fn create_test_directory() -> InMemoryUserDirectory {
    InMemoryUserDirectory::new(
        (0..10)
            .map(|i: i64| UserProfile {
                user_id: UserId::new(&format!("P{i}")),
                display_name: format!("Firefighter {i}"),
                priority: 100 - i,
                home_station: None,
                preferred_shift: None,
                qualified_role: None,
            })
            .collect(),
    )
}

/// Station 1: Shift A captain x1, Shift A firefighter x2, Shift B engineer x1.
pub fn create_test_ledger() -> InMemoryLedger {
    let mut ledger: InMemoryLedger = InMemoryLedger::new();
    ledger.add_station(
        Station::new(StationId::new(1), "Downtown")
            .with_capacity(Shift::A, Role::Captain, 1)
            .with_capacity(Shift::A, Role::Firefighter, 2)
            .with_capacity(Shift::B, Role::Engineer, 1),
    );
    ledger
}

/// Records every published event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: SessionEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct TestContext {
    pub service: Arc<SessionService>,
    pub sink: Arc<RecordingSink>,
}

pub fn create_test_context() -> TestContext {
    create_test_context_with_policy(SessionPolicy::default())
}

pub fn create_test_context_with_policy(policy: SessionPolicy) -> TestContext {
    let sink: Arc<RecordingSink> = Arc::new(RecordingSink::default());
    let service: SessionService = SessionService::new(
        Box::new(create_test_ledger()),
        Arc::new(create_test_directory()),
        sink.clone(),
        policy,
    );
    TestContext {
        service: Arc::new(service),
        sink,
    }
}

impl TestContext {
    /// A draft session with the given participants.
    pub async fn draft_with(&self, participants: &[&str]) -> SessionId {
        let summary: SessionSummary = self
            .service
            .create_session(create_test_request(), create_test_admin(), t0())
            .await
            .unwrap();
        let id: SessionId = SessionId::new(summary.id);
        for user in participants {
            self.service
                .add_participant(id, &UserId::new(user), create_test_admin(), t0(), None)
                .await
                .unwrap();
        }
        id
    }

    /// An active session started at `t0()`.
    pub async fn started_with(&self, participants: &[&str]) -> SessionId {
        let id: SessionId = self.draft_with(participants).await;
        self.admin(id, Command::Start, t0()).await.unwrap();
        id
    }

    pub async fn admin(
        &self,
        id: SessionId,
        command: Command,
        now: OffsetDateTime,
    ) -> Result<SessionSummary, crate::ApiError> {
        self.service
            .execute(id, command, create_test_admin(), now, None)
            .await
    }

    pub async fn summary(&self, id: SessionId) -> SessionSummary {
        self.service.get_summary(id).await.unwrap()
    }
}
