// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{TestContext, after_window, create_test_context, participant, t0};
use crate::{ApiError, SessionSummary, StationSummary};
use shift_bid_domain::{Assignment, Role, SessionId, Shift, StationId, UserId};
use time::{Duration, OffsetDateTime};

fn slot(shift: Shift, role: Role) -> Assignment {
    Assignment::new(StationId::new(1), shift, role)
}

async fn bid(
    ctx: &TestContext,
    id: SessionId,
    user: &str,
    assignment: Assignment,
    now: OffsetDateTime,
) -> Result<SessionSummary, ApiError> {
    ctx.service
        .submit_bid(id, UserId::new(user), assignment, participant(user), now, None)
        .await
}

fn occupied(stations: &[StationSummary], shift: &str, role: &str) -> u32 {
    stations[0]
        .slots
        .iter()
        .find(|s| s.shift == shift && s.role == role)
        .map_or(0, |s| s.occupied)
}

#[tokio::test]
async fn test_self_bid_reserves_slot_and_advances() {
    let ctx: TestContext = create_test_context();
    let id: SessionId = ctx.started_with(&["P0", "P1"]).await;

    let summary: SessionSummary = bid(
        &ctx,
        id,
        "P0",
        slot(Shift::A, Role::Captain),
        t0() + Duration::minutes(3),
    )
    .await
    .unwrap();

    assert_eq!(summary.completed_bids, 1);
    assert_eq!(summary.current_participant.as_deref(), Some("P1"));
    assert!(summary.participants[0].has_bid);
    assert_eq!(
        summary.participants[0].assignment,
        Some(slot(Shift::A, Role::Captain))
    );
    let stations: Vec<StationSummary> = ctx.service.list_stations().await;
    assert_eq!(occupied(&stations, "A", "captain"), 1);
}

#[tokio::test]
async fn test_out_of_turn_bid_is_refused() {
    let ctx: TestContext = create_test_context();
    let id: SessionId = ctx.started_with(&["P0", "P1"]).await;

    let err: ApiError = bid(&ctx, id, "P1", slot(Shift::A, Role::Captain), t0())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "turn");
    assert_eq!(err.rule(), Some("not_your_turn"));
}

#[tokio::test]
async fn test_late_bid_reports_window_expired() {
    let ctx: TestContext = create_test_context();
    let id: SessionId = ctx.started_with(&["P0", "P1"]).await;

    let err: ApiError = bid(
        &ctx,
        id,
        "P0",
        slot(Shift::A, Role::Captain),
        after_window(t0()),
    )
    .await
    .unwrap_err();

    assert_eq!(err.rule(), Some("window_expired"));
    let summary: SessionSummary = ctx.summary(id).await;
    assert_eq!(summary.current_participant.as_deref(), Some("P0"));
    assert_eq!(summary.participants[0].attempts, 0);
}

#[tokio::test]
async fn test_full_slot_is_capacity_error() {
    let ctx: TestContext = create_test_context();
    let id: SessionId = ctx.started_with(&["P0", "P1"]).await;
    bid(&ctx, id, "P0", slot(Shift::A, Role::Captain), t0())
        .await
        .unwrap();
    let version: u64 = ctx.summary(id).await.version;

    let err: ApiError = bid(&ctx, id, "P1", slot(Shift::A, Role::Captain), t0())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "capacity");
    assert_eq!(err.rule(), Some("slot_unavailable"));
    let summary: SessionSummary = ctx.summary(id).await;
    assert_eq!(summary.version, version);
    assert_eq!(summary.current_participant.as_deref(), Some("P1"));
}

#[tokio::test]
async fn test_unknown_slot_is_capacity_error() {
    let ctx: TestContext = create_test_context();
    let id: SessionId = ctx.started_with(&["P0"]).await;

    let err: ApiError = bid(&ctx, id, "P0", slot(Shift::C, Role::Paramedic), t0())
        .await
        .unwrap_err();

    assert_eq!(err.rule(), Some("slot_unavailable"));
}

#[tokio::test]
async fn test_last_bid_completes_session() {
    let ctx: TestContext = create_test_context();
    let id: SessionId = ctx.started_with(&["P0", "P1"]).await;
    bid(&ctx, id, "P0", slot(Shift::A, Role::Firefighter), t0())
        .await
        .unwrap();

    let summary: SessionSummary = bid(&ctx, id, "P1", slot(Shift::A, Role::Firefighter), t0())
        .await
        .unwrap();

    assert_eq!(summary.status, "completed");
    assert_eq!(summary.current_participant_index, None);
    assert!(summary.actual_end.is_some());
    let stations: Vec<StationSummary> = ctx.service.list_stations().await;
    assert_eq!(occupied(&stations, "A", "firefighter"), 2);
}

#[tokio::test]
async fn test_user_holding_slot_elsewhere_leaves_session_unchanged() {
    let ctx: TestContext = create_test_context();
    let first: SessionId = ctx.started_with(&["P0"]).await;
    let second: SessionId = ctx.started_with(&["P0", "P1"]).await;
    bid(&ctx, first, "P0", slot(Shift::A, Role::Firefighter), t0())
        .await
        .unwrap();
    let before: SessionSummary = ctx.summary(second).await;

    let err: ApiError = bid(&ctx, second, "P0", slot(Shift::B, Role::Engineer), t0())
        .await
        .unwrap_err();

    assert_eq!(err.rule(), Some("duplicate_reservation"));
    assert_eq!(ctx.summary(second).await, before);
    let stations: Vec<StationSummary> = ctx.service.list_stations().await;
    assert_eq!(occupied(&stations, "B", "engineer"), 0);
}

#[tokio::test]
async fn test_duplicate_submission_is_already_bid() {
    let ctx: TestContext = create_test_context();
    let id: SessionId = ctx.started_with(&["P0", "P1"]).await;
    bid(&ctx, id, "P0", slot(Shift::A, Role::Captain), t0())
        .await
        .unwrap();

    let err: ApiError = bid(&ctx, id, "P0", slot(Shift::A, Role::Firefighter), t0())
        .await
        .unwrap_err();

    assert_eq!(err.rule(), Some("already_bid"));
    assert_eq!(ctx.summary(id).await.completed_bids, 1);
}
