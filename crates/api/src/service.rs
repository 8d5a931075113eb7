// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The session service: the only place sessions are mutated.
//!
//! ## Concurrency
//!
//! Every session sits behind its own mutex. A mutation locks the session,
//! then the shared ledger, runs the pure transition, commits the ledger
//! effect and swaps in the new session before releasing either lock. Two
//! racing mutations of one session therefore run one after the other, and
//! the loser sees the winner's committed state.
//!
//! Locks are always taken in the order session map, session, ledger, and
//! the map lock is never held while waiting on a session except in delete.
//!
//! Deleting a session empties its slot before unmapping it. A command that
//! fetched the handle earlier and was queued on the lock finds the slot
//! empty and fails as if the session never existed.

use crate::directory::UserDirectory;
use crate::error::ApiError;
use crate::events::{EventSink, SessionEvent};
use crate::request_response::{
    CreateSessionRequest, HistoryEntryResponse, SessionSummary, StationSummary, SweepReport,
};
use shift_bid::{Command, Session, TransitionResult, apply, create_session};
use shift_bid_audit::Actor;
use shift_bid_domain::{
    Assignment, DomainError, SessionId, SessionPolicy, SessionSettings, SessionStatus,
    StationCapacityLedger, UserId, UserProfile,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard, RwLock, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

/// Shared handle to a ledger.
pub type SharedLedger = Box<dyn StationCapacityLedger + Send>;

/// The actor name the expiration sweeper acts under.
pub const SWEEPER_ACTOR: &str = "expiration_sweeper";

/// A session slot; `None` once the session has been deleted.
pub(crate) type SessionHandle = Arc<Mutex<Option<Session>>>;

/// Result of one guarded command.
pub(crate) struct Outcome {
    pub(crate) summary: SessionSummary,
    pub(crate) changed: bool,
}

/// Owns all sessions and serializes their mutations.
pub struct SessionService {
    sessions: RwLock<BTreeMap<SessionId, SessionHandle>>,
    next_id: AtomicU64,
    ledger: Mutex<SharedLedger>,
    directory: Arc<dyn UserDirectory + Send + Sync>,
    events: Arc<dyn EventSink + Send + Sync>,
    policy: SessionPolicy,
}

impl SessionService {
    /// Creates a service with no sessions.
    ///
    /// # Arguments
    ///
    /// * `ledger` - Station capacity shared by every session
    /// * `directory` - Source of participant profiles
    /// * `events` - Where change notifications go
    /// * `policy` - Engine-wide rules
    #[must_use]
    pub fn new(
        ledger: SharedLedger,
        directory: Arc<dyn UserDirectory + Send + Sync>,
        events: Arc<dyn EventSink + Send + Sync>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            ledger: Mutex::new(ledger),
            directory,
            events,
            policy,
        }
    }

    /// Returns the engine policy.
    #[must_use]
    pub const fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Creates a draft session.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an operator or the settings are
    /// invalid.
    pub async fn create_session(
        &self,
        request: CreateSessionRequest,
        actor: Actor,
        now: OffsetDateTime,
    ) -> Result<SessionSummary, ApiError> {
        require_privileged(&actor, "create_session")?;

        let settings: SessionSettings = SessionSettings::from(request);
        let id: SessionId = SessionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let result: TransitionResult = create_session(id, settings, actor, now)?;
        let summary: SessionSummary = SessionSummary::from(&result.new_session);
        let events: Vec<SessionEvent> =
            SessionEvent::from_transition(&result.new_session, &result.audit_events);

        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(Some(result.new_session))));
        info!(session_id = %id, name = %summary.name, "Created session");

        self.publish(events);
        Ok(summary)
    }

    /// Adds a user to a draft or scheduled session, reading their profile
    /// from the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is unknown or the roster is frozen.
    pub async fn add_participant(
        &self,
        id: SessionId,
        user_id: &UserId,
        actor: Actor,
        now: OffsetDateTime,
        expected_version: Option<u64>,
    ) -> Result<SessionSummary, ApiError> {
        let profile: UserProfile = self
            .directory
            .get_user(user_id)
            .ok_or_else(|| DomainError::UserNotFound(user_id.clone()))?;
        self.execute(
            id,
            Command::AddParticipant { profile },
            actor,
            now,
            expected_version,
        )
        .await
    }

    /// Submits a bid. Participants may only bid for themselves; operators
    /// may bid on a participant's behalf.
    ///
    /// # Errors
    ///
    /// Returns a turn, capacity, state or not-found error describing why the
    /// bid was refused.
    pub async fn submit_bid(
        &self,
        id: SessionId,
        participant: UserId,
        assignment: Assignment,
        actor: Actor,
        now: OffsetDateTime,
        expected_version: Option<u64>,
    ) -> Result<SessionSummary, ApiError> {
        self.execute(
            id,
            Command::SubmitBid {
                participant,
                assignment,
            },
            actor,
            now,
            expected_version,
        )
        .await
    }

    /// Runs a command against a session under its lock.
    ///
    /// # Arguments
    ///
    /// * `id` - The session
    /// * `command` - The command to run
    /// * `actor` - Who is acting
    /// * `now` - The current time
    /// * `expected_version` - If set, the command is refused unless the
    ///   session is still at this version
    ///
    /// # Errors
    ///
    /// Returns an error if the actor may not run the command, the session is
    /// unknown, the version does not match or the transition is refused.
    pub async fn execute(
        &self,
        id: SessionId,
        command: Command,
        actor: Actor,
        now: OffsetDateTime,
        expected_version: Option<u64>,
    ) -> Result<SessionSummary, ApiError> {
        self.execute_guarded(id, command, actor, now, expected_version)
            .await
            .map(|outcome| outcome.summary)
    }

    async fn execute_guarded(
        &self,
        id: SessionId,
        command: Command,
        actor: Actor,
        now: OffsetDateTime,
        expected_version: Option<u64>,
    ) -> Result<Outcome, ApiError> {
        authorize(&actor, &command)?;
        let handle: SessionHandle = self.handle(id).await?;
        self.execute_on(id, &handle, command, actor, now, expected_version)
            .await
    }

    /// Runs an authorized command on a handle fetched earlier. The handle
    /// may have been deleted in the meantime.
    pub(crate) async fn execute_on(
        &self,
        id: SessionId,
        handle: &SessionHandle,
        command: Command,
        actor: Actor,
        now: OffsetDateTime,
        expected_version: Option<u64>,
    ) -> Result<Outcome, ApiError> {
        let name: &'static str = command.name();
        let mut slot: MutexGuard<'_, Option<Session>> = handle.lock().await;
        let session: &mut Session = slot.as_mut().ok_or(DomainError::SessionNotFound(id))?;
        if let Some(expected) = expected_version {
            if expected != session.version {
                debug!(session_id = %id, command = name, expected, actual = session.version, "Version conflict");
                return Err(DomainError::VersionConflict {
                    expected,
                    actual: session.version,
                }
                .into());
            }
        }

        let mut ledger: MutexGuard<'_, SharedLedger> = self.ledger.lock().await;
        let result: TransitionResult =
            match apply(session, &**ledger, &self.policy, command, actor, now) {
                Ok(result) => result,
                Err(err) => {
                    let api_err: ApiError = ApiError::from(err);
                    if matches!(api_err, ApiError::Internal { .. }) {
                        error!(session_id = %id, command = name, error = %api_err, "Transition failed");
                    } else {
                        debug!(session_id = %id, command = name, error = %api_err, "Command rejected");
                    }
                    return Err(api_err);
                }
            };

        if result.is_noop() {
            return Ok(Outcome {
                summary: SessionSummary::from(&*session),
                changed: false,
            });
        }

        // Ledger first: if it refuses, the session is left as it was
        if let Some(effect) = &result.ledger_effect {
            if let Err(err) = effect.commit(&mut **ledger) {
                warn!(session_id = %id, command = name, error = %err, "Ledger refused change");
                return Err(err.into());
            }
        }
        drop(ledger);

        *session = result.new_session;
        let summary: SessionSummary = SessionSummary::from(&*session);
        let events: Vec<SessionEvent> =
            SessionEvent::from_transition(session, &result.audit_events);
        drop(slot);

        info!(
            session_id = %id,
            command = name,
            version = summary.version,
            status = %summary.status,
            "Committed transition"
        );
        self.publish(events);
        Ok(Outcome {
            summary,
            changed: true,
        })
    }

    /// Deletes a session that is neither active nor completed, releasing
    /// any slots its participants still hold.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an operator, the session is
    /// unknown or its status forbids deletion.
    pub async fn delete_session(&self, id: SessionId, actor: &Actor) -> Result<(), ApiError> {
        require_privileged(actor, "delete_session")?;

        let mut sessions: RwLockWriteGuard<'_, BTreeMap<SessionId, SessionHandle>> =
            self.sessions.write().await;
        let handle: SessionHandle = sessions
            .get(&id)
            .cloned()
            .ok_or(DomainError::SessionNotFound(id))?;
        let mut slot: MutexGuard<'_, Option<Session>> = handle.lock().await;
        let session: &Session = slot.as_ref().ok_or(DomainError::SessionNotFound(id))?;
        if !session.status.is_deletable() {
            return Err(DomainError::OperationNotPermitted {
                operation: "delete",
                status: session.status,
            }
            .into());
        }

        let mut ledger: MutexGuard<'_, SharedLedger> = self.ledger.lock().await;
        for participant in session.queue.iter() {
            if let Some(assignment) = participant.assignment {
                if let Err(err) = ledger.release_slot(
                    assignment.station,
                    assignment.shift,
                    assignment.role,
                    participant.user_id(),
                ) {
                    warn!(session_id = %id, participant = %participant.user_id(), error = %err, "Could not release slot");
                }
            }
        }
        drop(ledger);

        *slot = None;
        drop(slot);
        sessions.remove(&id);
        info!(session_id = %id, actor = %actor.id, "Deleted session");
        Ok(())
    }

    /// Returns a session's summary. Reads may be stale by the time they
    /// reach the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown.
    pub async fn get_summary(&self, id: SessionId) -> Result<SessionSummary, ApiError> {
        let handle: SessionHandle = self.handle(id).await?;
        let slot: MutexGuard<'_, Option<Session>> = handle.lock().await;
        let session: &Session = slot.as_ref().ok_or(DomainError::SessionNotFound(id))?;
        Ok(SessionSummary::from(session))
    }

    /// Returns a session's history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown.
    pub async fn get_history(&self, id: SessionId) -> Result<Vec<HistoryEntryResponse>, ApiError> {
        let handle: SessionHandle = self.handle(id).await?;
        let slot: MutexGuard<'_, Option<Session>> = handle.lock().await;
        let session: &Session = slot.as_ref().ok_or(DomainError::SessionNotFound(id))?;
        Ok(session
            .history
            .iter()
            .map(HistoryEntryResponse::from)
            .collect())
    }

    /// Lists every session by id.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = Vec::new();
        for handle in self.handles().await {
            if let Some(session) = handle.lock().await.as_ref() {
                summaries.push(SessionSummary::from(session));
            }
        }
        summaries
    }

    /// Lists slot occupancy on every active station.
    pub async fn list_stations(&self) -> Vec<StationSummary> {
        let ledger: MutexGuard<'_, SharedLedger> = self.ledger.lock().await;
        StationSummary::group(&ledger.slots())
    }

    /// Runs an expiration check on every active session whose current
    /// window has lapsed.
    ///
    /// Candidates are found without holding any session lock; the check
    /// itself runs under the lock and re-reads the participant, so a bid
    /// that got there first turns the check into a no-op.
    pub async fn sweep_expired(&self, now: OffsetDateTime) -> SweepReport {
        let mut report: SweepReport = SweepReport::default();

        for handle in self.handles().await {
            let (id, expired): (SessionId, bool) = {
                let slot: MutexGuard<'_, Option<Session>> = handle.lock().await;
                let Some(session) = slot.as_ref() else {
                    continue;
                };
                if session.status != SessionStatus::Active {
                    continue;
                }
                (session.id, session.has_expired_window(now))
            };
            report.scanned += 1;
            if !expired {
                continue;
            }

            match self
                .execute_guarded(
                    id,
                    Command::CheckExpiration,
                    Actor::system(SWEEPER_ACTOR),
                    now,
                    None,
                )
                .await
            {
                Ok(outcome) if outcome.changed => report.moved += 1,
                Ok(_) => {
                    debug!(session_id = %id, "Participant resolved before sweep; nothing to do");
                    report.skipped += 1;
                }
                Err(err) => {
                    error!(session_id = %id, error = %err, "Expiration check failed");
                    report.failed += 1;
                }
            }
        }

        if report.moved > 0 || report.failed > 0 {
            info!(
                scanned = report.scanned,
                moved = report.moved,
                skipped = report.skipped,
                failed = report.failed,
                "Expiration sweep finished"
            );
        }
        report
    }

    pub(crate) async fn handle(&self, id: SessionId) -> Result<SessionHandle, ApiError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::SessionNotFound(id).into())
    }

    async fn handles(&self) -> Vec<SessionHandle> {
        self.sessions.read().await.values().cloned().collect()
    }

    fn publish(&self, events: Vec<SessionEvent>) {
        for event in events {
            self.events.publish(event);
        }
    }
}

fn require_privileged(actor: &Actor, action: &str) -> Result<(), ApiError> {
    if !actor.is_privileged() {
        return Err(ApiError::Unauthorized {
            action: action.to_string(),
            required_role: String::from("admin"),
        });
    }
    Ok(())
}

/// Checks whether an actor may run a command at all. Turn order is the
/// engine's business, not this function's.
fn authorize(actor: &Actor, command: &Command) -> Result<(), ApiError> {
    if command.requires_admin() {
        return require_privileged(actor, command.name());
    }
    if let Command::SubmitBid { participant, .. } = command {
        if !actor.is_privileged() && !actor.is_user(participant) {
            return Err(ApiError::Unauthorized {
                action: String::from("submit_bid for another participant"),
                required_role: String::from("admin"),
            });
        }
    }
    Ok(())
}
