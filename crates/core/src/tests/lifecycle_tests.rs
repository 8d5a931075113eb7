// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{
    Harness, WINDOW_MINUTES, create_test_actor, create_test_profile, create_test_settings, t0,
};
use crate::{Command, CoreError, TransitionResult, create_session};
use shift_bid_audit::Action;
use shift_bid_domain::{DomainError, SessionId, SessionSettings, SessionStatus, UserId};
use time::{Duration, OffsetDateTime};

fn actions(result: &TransitionResult) -> Vec<Action> {
    result.audit_events.iter().map(|e| e.action).collect()
}

#[test]
fn test_create_session_starts_in_draft() {
    let result: TransitionResult = create_session(
        SessionId::new(7),
        create_test_settings(),
        create_test_actor(),
        t0(),
    )
    .unwrap();

    assert_eq!(result.new_session.status, SessionStatus::Draft);
    assert_eq!(result.new_session.version, 1);
    assert_eq!(result.new_session.current_participant_index, None);
    assert_eq!(actions(&result), vec![Action::SessionCreated]);
    assert_eq!(result.new_session.history.len(), 1);
}

#[test]
fn test_create_session_rejects_invalid_settings() {
    let mut settings: SessionSettings = create_test_settings();
    settings.bid_window_duration_minutes = 0;

    let result = create_session(SessionId::new(7), settings, create_test_actor(), t0());
    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(DomainError::InvalidInput { .. }))
    ));
}

#[test]
fn test_start_opens_first_window() {
    let mut harness: Harness = Harness::draft(3);
    let version: u64 = harness.session.version;

    let result: TransitionResult = harness.admin(Command::Start, t0()).unwrap();

    assert_eq!(
        actions(&result),
        vec![Action::SessionStarted, Action::WindowOpened]
    );
    assert_eq!(harness.session.status, SessionStatus::Active);
    assert_eq!(harness.session.actual_start, Some(t0()));
    assert_eq!(harness.session.current_participant_index, Some(0));
    assert_eq!(harness.current_id().as_deref(), Some("P0"));
    assert_eq!(harness.session.current_bid_start, Some(t0()));
    assert_eq!(
        harness.session.current_bid_end,
        Some(t0() + Duration::minutes(i64::from(WINDOW_MINUTES)))
    );
    assert_eq!(harness.session.version, version + 1);
}

#[test]
fn test_start_requires_participants() {
    let mut harness: Harness = Harness::draft(0);

    let result = harness.admin(Command::Start, t0());
    assert_eq!(
        result.unwrap_err(),
        CoreError::DomainViolation(DomainError::EmptyRoster)
    );
    assert_eq!(harness.session.status, SessionStatus::Draft);
}

#[test]
fn test_start_twice_is_rejected() {
    let mut harness: Harness = Harness::started(2);

    let result = harness.admin(Command::Start, t0());
    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(
            DomainError::OperationNotPermitted {
                operation: "start",
                status: SessionStatus::Active
            }
        ))
    ));
}

#[test]
fn test_start_from_scheduled() {
    let mut harness: Harness = Harness::draft(2);
    harness
        .admin(
            Command::Schedule {
                start: t0(),
                end: t0() + Duration::days(5),
            },
            t0(),
        )
        .unwrap();
    assert_eq!(harness.session.status, SessionStatus::Scheduled);
    assert_eq!(harness.session.scheduled_end, Some(t0() + Duration::days(5)));

    harness.admin(Command::Start, t0()).unwrap();
    assert_eq!(harness.session.status, SessionStatus::Active);
}

#[test]
fn test_schedule_rejects_reversed_range() {
    let mut harness: Harness = Harness::draft(1);

    let result = harness.admin(
        Command::Schedule {
            start: t0(),
            end: t0() - Duration::hours(1),
        },
        t0(),
    );
    assert!(result.is_err());
    assert_eq!(harness.session.status, SessionStatus::Draft);
}

#[test]
fn test_schedule_active_session_rejected() {
    let mut harness: Harness = Harness::started(1);

    let result = harness.admin(
        Command::Schedule {
            start: t0(),
            end: t0() + Duration::days(1),
        },
        t0(),
    );
    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(
            DomainError::InvalidStatusTransition { .. }
        ))
    ));
}

#[test]
fn test_pause_draft_is_state_error() {
    let mut harness: Harness = Harness::draft(2);

    let err: CoreError = harness.admin(Command::Pause, t0()).unwrap_err();
    let CoreError::DomainViolation(domain) = err else {
        panic!("expected a domain violation");
    };
    assert_eq!(domain.kind(), shift_bid_domain::ErrorKind::State);
}

#[test]
fn test_pause_keeps_current_window() {
    let mut harness: Harness = Harness::started(2);
    let end: Option<OffsetDateTime> = harness.session.current_bid_end;

    harness
        .admin(Command::Pause, t0() + Duration::minutes(5))
        .unwrap();

    assert_eq!(harness.session.status, SessionStatus::Paused);
    assert_eq!(harness.session.current_bid_end, end);
    assert_eq!(harness.current_id().as_deref(), Some("P0"));
    assert!(
        harness
            .session
            .current_participant()
            .unwrap()
            .time_window
            .is_some()
    );
}

#[test]
fn test_resume_opens_fresh_full_window() {
    let mut harness: Harness = Harness::started(2);
    harness
        .admin(Command::Pause, t0() + Duration::minutes(10))
        .unwrap();

    let resumed_at: OffsetDateTime = t0() + Duration::minutes(45);
    let result: TransitionResult = harness.admin(Command::Resume, resumed_at).unwrap();

    assert_eq!(
        actions(&result),
        vec![Action::SessionResumed, Action::WindowOpened]
    );
    assert_eq!(harness.session.status, SessionStatus::Active);
    assert_eq!(harness.current_id().as_deref(), Some("P0"));
    assert_eq!(harness.session.current_bid_start, Some(resumed_at));
    assert_eq!(
        harness.session.current_bid_end,
        Some(resumed_at + Duration::minutes(i64::from(WINDOW_MINUTES)))
    );
}

#[test]
fn test_resume_requires_paused() {
    let mut harness: Harness = Harness::started(1);

    assert!(harness.admin(Command::Resume, t0()).is_err());
}

#[test]
fn test_manual_complete_clears_current() {
    let mut harness: Harness = Harness::started(3);
    let at: OffsetDateTime = t0() + Duration::minutes(3);

    harness.admin(Command::Complete, at).unwrap();

    assert_eq!(harness.session.status, SessionStatus::Completed);
    assert_eq!(harness.session.actual_end, Some(at));
    assert_eq!(harness.session.current_participant_index, None);
    assert_eq!(harness.session.current_bid_start, None);
    assert!(harness.session.queue.iter().all(|p| p.time_window.is_none()));
}

#[test]
fn test_complete_from_paused() {
    let mut harness: Harness = Harness::started(2);
    harness.admin(Command::Pause, t0()).unwrap();

    harness.admin(Command::Complete, t0()).unwrap();
    assert_eq!(harness.session.status, SessionStatus::Completed);
}

#[test]
fn test_complete_draft_rejected() {
    let mut harness: Harness = Harness::draft(2);

    let result = harness.admin(Command::Complete, t0());
    assert_eq!(
        result.unwrap_err(),
        CoreError::DomainViolation(DomainError::InvalidStatusTransition {
            from: SessionStatus::Draft,
            to: SessionStatus::Completed,
        })
    );
}

#[test]
fn test_cancel_active_session() {
    let mut harness: Harness = Harness::started(2);

    harness.admin(Command::Cancel, t0()).unwrap();

    assert_eq!(harness.session.status, SessionStatus::Cancelled);
    assert_eq!(harness.session.current_participant_index, None);
    assert_eq!(harness.session.actual_end, None);
    assert!(harness.admin(Command::Cancel, t0()).is_err());
    assert!(harness.admin(Command::Start, t0()).is_err());
}

#[test]
fn test_roster_frozen_once_started() {
    let mut harness: Harness = Harness::started(2);

    let result = harness.admin(
        Command::AddParticipant {
            profile: create_test_profile("late", 500),
        },
        t0(),
    );
    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(
            DomainError::OperationNotPermitted {
                operation: "add a participant",
                ..
            }
        ))
    ));
    assert!(
        harness
            .admin(
                Command::RemoveParticipant {
                    participant: UserId::new("P1")
                },
                t0()
            )
            .is_err()
    );
}

#[test]
fn test_add_participant_sorts_by_priority() {
    let mut harness: Harness = Harness::draft(2);

    harness
        .admin(
            Command::AddParticipant {
                profile: create_test_profile("senior", 1_000),
            },
            t0(),
        )
        .unwrap();

    assert_eq!(harness.order(), vec!["senior", "P0", "P1"]);
    assert!(harness.session.queue.positions_are_contiguous());
}

#[test]
fn test_add_duplicate_participant_rejected() {
    let mut harness: Harness = Harness::draft(2);

    let result = harness.admin(
        Command::AddParticipant {
            profile: create_test_profile("P1", 3),
        },
        t0(),
    );
    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(
            DomainError::DuplicateParticipant(_)
        ))
    ));
}

#[test]
fn test_remove_participant_renumbers() {
    let mut harness: Harness = Harness::draft(3);

    harness
        .admin(
            Command::RemoveParticipant {
                participant: UserId::new("P0"),
            },
            t0(),
        )
        .unwrap();

    assert_eq!(harness.order(), vec!["P1", "P2"]);
    assert_eq!(
        harness
            .session
            .queue
            .get(&UserId::new("P1"))
            .unwrap()
            .queue_position,
        0
    );
}

#[test]
fn test_history_is_append_only() {
    let mut harness: Harness = Harness::draft(2);
    let before: usize = harness.session.history.len();

    harness.admin(Command::Start, t0()).unwrap();
    assert!(harness.admin(Command::Resume, t0()).is_err());

    assert_eq!(harness.session.history.len(), before + 2);
    assert_eq!(harness.session.history[0].action, Action::SessionCreated);
}
