// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Background expiration sweeper.
//!
//! Windows lapse on the wall clock whether or not anyone is watching, so a
//! periodic task asks the service to check every active session. The check
//! is idempotent; a sweep that loses the race to a bid does nothing.

use shift_bid_api::{SessionService, SweepReport};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Periodically moves participants whose windows lapsed.
pub struct ExpirationSweeper {
    service: Arc<SessionService>,
    interval: Duration,
}

impl ExpirationSweeper {
    /// Creates a sweeper.
    ///
    /// # Arguments
    ///
    /// * `service` - The session service to sweep
    /// * `interval` - Time between sweeps
    #[must_use]
    pub const fn new(service: Arc<SessionService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Sweeps on every tick until `shutdown` turns true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs_f64(),
            "Starting expiration sweeper"
        );

        let mut interval: tokio::time::Interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Expiration sweeper shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Runs a single sweep at the current time.
    pub async fn sweep_once(&self) -> SweepReport {
        let report: SweepReport = self
            .service
            .sweep_expired(OffsetDateTime::now_utc())
            .await;
        debug!(scanned = report.scanned, moved = report.moved, "Sweep tick");
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use shift_bid::Command;
    use shift_bid_api::{
        CreateSessionRequest, EventSink, InMemoryUserDirectory, SessionEvent, SessionSummary,
    };
    use shift_bid_audit::Actor;
    use shift_bid_domain::{InMemoryLedger, SessionId, SessionPolicy, UserId, UserProfile};

    struct NullSink;

    impl EventSink for NullSink {
        fn publish(&self, _event: SessionEvent) {}
    }

    fn profile(id: &str, priority: i64) -> UserProfile {
        UserProfile {
            user_id: UserId::new(id),
            display_name: format!("User {id}"),
            priority,
            home_station: None,
            preferred_shift: None,
            qualified_role: None,
        }
    }

    /// A session whose first window closed an hour ago.
    async fn lapsed_session() -> (Arc<SessionService>, SessionId) {
        let service: Arc<SessionService> = Arc::new(SessionService::new(
            Box::new(InMemoryLedger::new()),
            Arc::new(InMemoryUserDirectory::new(vec![
                profile("u1", 2),
                profile("u2", 1),
            ])),
            Arc::new(NullSink),
            SessionPolicy::default(),
        ));
        let admin: Actor = Actor::admin("ops");
        let started: OffsetDateTime = OffsetDateTime::now_utc() - time::Duration::hours(2);
        let summary: SessionSummary = service
            .create_session(
                CreateSessionRequest {
                    name: String::from("Night bid"),
                    year: 2026,
                    description: None,
                    bid_window_duration_minutes: 60,
                    auto_assign_timeout_minutes: 60,
                },
                admin.clone(),
                started,
            )
            .await
            .unwrap();
        let id: SessionId = SessionId::new(summary.id);
        for user in ["u1", "u2"] {
            service
                .add_participant(id, &UserId::new(user), admin.clone(), started, None)
                .await
                .unwrap();
        }
        service
            .execute(id, Command::Start, admin, started, None)
            .await
            .unwrap();
        (service, id)
    }

    #[tokio::test]
    async fn test_sweep_once_moves_lapsed_participant() {
        let (service, id) = lapsed_session().await;
        let sweeper: ExpirationSweeper =
            ExpirationSweeper::new(Arc::clone(&service), Duration::from_secs(15));

        let report: SweepReport = sweeper.sweep_once().await;

        assert_eq!(report.moved, 1);
        let summary: SessionSummary = service.get_summary(id).await.unwrap();
        assert_eq!(summary.current_participant.as_deref(), Some("u2"));
    }

    #[tokio::test]
    async fn test_run_sweeps_until_shutdown() {
        let (service, id) = lapsed_session().await;
        let sweeper: ExpirationSweeper =
            ExpirationSweeper::new(Arc::clone(&service), Duration::from_millis(10));
        let (tx, rx) = watch::channel(false);
        let task: tokio::task::JoinHandle<()> = tokio::spawn(async move { sweeper.run(rx).await });

        let mut moved: bool = false;
        for _ in 0..200 {
            let summary: SessionSummary = service.get_summary(id).await.unwrap();
            if summary.moved_to_back_count == 1 {
                moved = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(moved, "sweeper never moved the lapsed participant");
    }
}
