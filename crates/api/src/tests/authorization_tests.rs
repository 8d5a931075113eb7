// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{
    TestContext, create_test_context, create_test_request, participant, t0,
};
use crate::ApiError;
use shift_bid::Command;
use shift_bid_audit::Actor;
use shift_bid_domain::{Assignment, Role, SessionId, Shift, StationId, UserId};
use time::Duration;

fn captain_a() -> Assignment {
    Assignment::new(StationId::new(1), Shift::A, Role::Captain)
}

#[tokio::test]
async fn test_participant_cannot_create_session() {
    let ctx: TestContext = create_test_context();

    let result = ctx
        .service
        .create_session(create_test_request(), participant("P0"), t0())
        .await;

    assert!(matches!(
        result,
        Err(ApiError::Unauthorized { ref action, .. }) if action == "create_session"
    ));
}

#[tokio::test]
async fn test_participant_cannot_run_admin_commands() {
    let ctx: TestContext = create_test_context();
    let id: SessionId = ctx.started_with(&["P0", "P1"]).await;

    for command in [
        Command::Pause,
        Command::MoveToBack,
        Command::Complete,
        Command::Cancel,
        Command::AutoAssign {
            participant: UserId::new("P0"),
        },
    ] {
        let err: ApiError = ctx
            .service
            .execute(id, command, participant("P0"), t0(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unauthorized");
    }

    assert_eq!(ctx.summary(id).await.status, "active");
}

#[tokio::test]
async fn test_participant_cannot_start_session() {
    let ctx: TestContext = create_test_context();
    let id: SessionId = ctx.draft_with(&["P0"]).await;

    let result = ctx
        .service
        .execute(id, Command::Start, participant("P0"), t0(), None)
        .await;

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    assert_eq!(ctx.summary(id).await.status, "draft");
}

#[tokio::test]
async fn test_participant_cannot_delete_session() {
    let ctx: TestContext = create_test_context();
    let id: SessionId = ctx.draft_with(&[]).await;

    let result = ctx.service.delete_session(id, &participant("P0")).await;

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    assert!(ctx.service.get_summary(id).await.is_ok());
}

#[tokio::test]
async fn test_participant_cannot_bid_for_someone_else() {
    let ctx: TestContext = create_test_context();
    let id: SessionId = ctx.started_with(&["P0", "P1"]).await;

    let result = ctx
        .service
        .submit_bid(
            id,
            UserId::new("P0"),
            captain_a(),
            participant("P1"),
            t0() + Duration::minutes(1),
            None,
        )
        .await;

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    assert_eq!(ctx.summary(id).await.completed_bids, 0);
}

#[tokio::test]
async fn test_admin_may_bid_on_behalf_of_current_participant() {
    let ctx: TestContext = create_test_context();
    let id: SessionId = ctx.started_with(&["P0", "P1"]).await;

    let summary = ctx
        .service
        .submit_bid(
            id,
            UserId::new("P0"),
            captain_a(),
            Actor::admin("dispatch"),
            t0() + Duration::minutes(1),
            None,
        )
        .await
        .unwrap();

    assert_eq!(summary.completed_bids, 1);
    assert_eq!(summary.current_participant.as_deref(), Some("P1"));
}

#[tokio::test]
async fn test_anyone_may_trigger_expiration_check() {
    let ctx: TestContext = create_test_context();
    let id: SessionId = ctx.started_with(&["P0", "P1"]).await;

    let summary = ctx
        .service
        .execute(
            id,
            Command::CheckExpiration,
            participant("P1"),
            t0() + Duration::minutes(5),
            None,
        )
        .await
        .unwrap();

    assert_eq!(summary.current_participant.as_deref(), Some("P0"));
}
