// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod actor;
mod config;
mod live;
mod sweeper;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use shift_bid::Command;
use shift_bid_api::{
    ApiError, CreateSessionRequest, HistoryEntryResponse, InMemoryUserDirectory, SessionService,
    SessionSummary, StationSummary,
};
use shift_bid_audit::Actor;
use shift_bid_domain::{
    Assignment, InMemoryLedger, Role, SessionId, SessionPolicy, Shift, StationId, UserId,
    UserProfile,
};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::actor::RequestActor;
use crate::live::{LiveEventBroadcaster, live_session_handler};
use crate::sweeper::ExpirationSweeper;

/// Shift Bid Server - HTTP server for seniority-ordered shift bidding
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Seconds between expiration sweeps
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..=300))]
    sweep_interval_secs: u64,

    /// Lapsed windows a participant may accumulate before losing their turn
    #[arg(long, default_value_t = shift_bid_domain::DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Give exhausted participants the best remaining slot instead of none
    #[arg(long)]
    auto_assign_on_exhaustion: bool,

    /// JSON file describing stations and slot capacities
    #[arg(long)]
    stations: Option<PathBuf>,

    /// JSON file listing user profiles
    #[arg(long)]
    users: Option<PathBuf>,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// The session service; the only writer of session state.
    service: Arc<SessionService>,
    /// Fan-out for live session streams.
    broadcaster: Arc<LiveEventBroadcaster>,
}

/// Optimistic concurrency guard accepted by every mutating endpoint.
#[derive(Debug, Default, Deserialize)]
struct VersionQuery {
    /// Refuse the change unless the session is still at this version.
    expected_version: Option<u64>,
}

/// API request for adding a participant.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct AddParticipantApiRequest {
    /// The user to add.
    user_id: String,
}

/// API request for scheduling a session.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ScheduleApiRequest {
    /// Planned start (RFC 3339).
    #[serde(with = "time::serde::rfc3339")]
    start: OffsetDateTime,
    /// Planned end (RFC 3339).
    #[serde(with = "time::serde::rfc3339")]
    end: OffsetDateTime,
}

/// API request for submitting a bid.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct SubmitBidApiRequest {
    /// The bidding participant. Defaults to the acting user.
    #[serde(default)]
    participant: Option<String>,
    /// Station number.
    station: u32,
    /// Requested shift.
    shift: Shift,
    /// Requested role.
    role: Role,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Machine-readable category.
    kind: String,
    /// The violated rule, for domain rule violations.
    #[serde(skip_serializing_if = "Option::is_none")]
    rule: Option<String>,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The response body.
    body: ErrorResponse,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match err {
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::DomainRuleViolation { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            body: ErrorResponse {
                error: true,
                kind: err.kind().to_string(),
                rule: err.rule().map(ToString::to_string),
                message: err.to_string(),
            },
        }
    }
}

/// Runs a command and returns the new summary.
async fn run_command(
    app_state: &AppState,
    id: u64,
    command: Command,
    actor: Actor,
    query: VersionQuery,
) -> Result<Json<SessionSummary>, HttpError> {
    info!(
        session_id = id,
        command = command.name(),
        actor_id = %actor.id,
        role = %actor.kind,
        "Handling session command"
    );
    let summary: SessionSummary = app_state
        .service
        .execute(
            SessionId::new(id),
            command,
            actor,
            OffsetDateTime::now_utc(),
            query.expected_version,
        )
        .await?;
    Ok(Json(summary))
}

/// Handler for POST `/sessions`.
async fn handle_create_session(
    AxumState(app_state): AxumState<AppState>,
    RequestActor(actor): RequestActor,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<SessionSummary>, HttpError> {
    info!(actor_id = %actor.id, name = %req.name, "Handling create_session request");
    let summary: SessionSummary = app_state
        .service
        .create_session(req, actor, OffsetDateTime::now_utc())
        .await?;
    Ok(Json(summary))
}

/// Handler for GET `/sessions`.
async fn handle_list_sessions(
    AxumState(app_state): AxumState<AppState>,
) -> Json<Vec<SessionSummary>> {
    Json(app_state.service.list_sessions().await)
}

/// Handler for GET `/sessions/{id}`.
async fn handle_get_session(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SessionSummary>, HttpError> {
    Ok(Json(
        app_state.service.get_summary(SessionId::new(id)).await?,
    ))
}

/// Handler for DELETE `/sessions/{id}`.
async fn handle_delete_session(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<u64>,
    RequestActor(actor): RequestActor,
) -> Result<StatusCode, HttpError> {
    info!(session_id = id, actor_id = %actor.id, "Handling delete_session request");
    app_state
        .service
        .delete_session(SessionId::new(id), &actor)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET `/sessions/{id}/history`.
async fn handle_get_history(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<HistoryEntryResponse>>, HttpError> {
    Ok(Json(
        app_state.service.get_history(SessionId::new(id)).await?,
    ))
}

/// Handler for POST `/sessions/{id}/participants`.
async fn handle_add_participant(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<VersionQuery>,
    RequestActor(actor): RequestActor,
    Json(req): Json<AddParticipantApiRequest>,
) -> Result<Json<SessionSummary>, HttpError> {
    info!(session_id = id, user_id = %req.user_id, "Handling add_participant request");
    let summary: SessionSummary = app_state
        .service
        .add_participant(
            SessionId::new(id),
            &UserId::new(&req.user_id),
            actor,
            OffsetDateTime::now_utc(),
            query.expected_version,
        )
        .await?;
    Ok(Json(summary))
}

/// Handler for DELETE `/sessions/{id}/participants/{user_id}`.
async fn handle_remove_participant(
    AxumState(app_state): AxumState<AppState>,
    Path((id, user_id)): Path<(u64, String)>,
    Query(query): Query<VersionQuery>,
    RequestActor(actor): RequestActor,
) -> Result<Json<SessionSummary>, HttpError> {
    let command: Command = Command::RemoveParticipant {
        participant: UserId::new(&user_id),
    };
    run_command(&app_state, id, command, actor, query).await
}

/// Handler for POST `/sessions/{id}/participants/{user_id}/auto-assign`.
async fn handle_auto_assign(
    AxumState(app_state): AxumState<AppState>,
    Path((id, user_id)): Path<(u64, String)>,
    Query(query): Query<VersionQuery>,
    RequestActor(actor): RequestActor,
) -> Result<Json<SessionSummary>, HttpError> {
    let command: Command = Command::AutoAssign {
        participant: UserId::new(&user_id),
    };
    run_command(&app_state, id, command, actor, query).await
}

/// Handler for POST `/sessions/{id}/participants/{user_id}/release`.
async fn handle_release_assignment(
    AxumState(app_state): AxumState<AppState>,
    Path((id, user_id)): Path<(u64, String)>,
    Query(query): Query<VersionQuery>,
    RequestActor(actor): RequestActor,
) -> Result<Json<SessionSummary>, HttpError> {
    let command: Command = Command::ReleaseAssignment {
        participant: UserId::new(&user_id),
    };
    run_command(&app_state, id, command, actor, query).await
}

/// Handler for POST `/sessions/{id}/schedule`.
async fn handle_schedule(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<VersionQuery>,
    RequestActor(actor): RequestActor,
    Json(req): Json<ScheduleApiRequest>,
) -> Result<Json<SessionSummary>, HttpError> {
    let command: Command = Command::Schedule {
        start: req.start,
        end: req.end,
    };
    run_command(&app_state, id, command, actor, query).await
}

/// Handler for POST `/sessions/{id}/bids`.
///
/// A participant bids for themselves; an operator names the participant.
async fn handle_submit_bid(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<VersionQuery>,
    RequestActor(actor): RequestActor,
    Json(req): Json<SubmitBidApiRequest>,
) -> Result<Json<SessionSummary>, HttpError> {
    let participant: UserId = UserId::new(req.participant.as_deref().unwrap_or(&actor.id));
    let command: Command = Command::SubmitBid {
        participant,
        assignment: Assignment::new(StationId::new(req.station), req.shift, req.role),
    };
    run_command(&app_state, id, command, actor, query).await
}

/// Defines a handler for a body-less session command.
macro_rules! command_handler {
    ($name:ident, $command:expr, $route:literal) => {
        #[doc = concat!("Handler for POST `", $route, "`.")]
        async fn $name(
            AxumState(app_state): AxumState<AppState>,
            Path(id): Path<u64>,
            Query(query): Query<VersionQuery>,
            RequestActor(actor): RequestActor,
        ) -> Result<Json<SessionSummary>, HttpError> {
            run_command(&app_state, id, $command, actor, query).await
        }
    };
}

command_handler!(handle_start, Command::Start, "/sessions/{id}/start");
command_handler!(handle_pause, Command::Pause, "/sessions/{id}/pause");
command_handler!(handle_resume, Command::Resume, "/sessions/{id}/resume");
command_handler!(handle_complete, Command::Complete, "/sessions/{id}/complete");
command_handler!(handle_cancel, Command::Cancel, "/sessions/{id}/cancel");
command_handler!(
    handle_move_to_back,
    Command::MoveToBack,
    "/sessions/{id}/move-to-back"
);
command_handler!(
    handle_check_expiration,
    Command::CheckExpiration,
    "/sessions/{id}/check-expiration"
);

/// Handler for GET `/stations`.
async fn handle_list_stations(
    AxumState(app_state): AxumState<AppState>,
) -> Json<Vec<StationSummary>> {
    Json(app_state.service.list_stations().await)
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/sessions",
            get(handle_list_sessions).post(handle_create_session),
        )
        .route(
            "/sessions/{id}",
            get(handle_get_session).delete(handle_delete_session),
        )
        .route("/sessions/{id}/history", get(handle_get_history))
        .route("/sessions/{id}/live", get(live_session_handler))
        .route("/sessions/{id}/participants", post(handle_add_participant))
        .route(
            "/sessions/{id}/participants/{user_id}",
            axum::routing::delete(handle_remove_participant),
        )
        .route(
            "/sessions/{id}/participants/{user_id}/auto-assign",
            post(handle_auto_assign),
        )
        .route(
            "/sessions/{id}/participants/{user_id}/release",
            post(handle_release_assignment),
        )
        .route("/sessions/{id}/schedule", post(handle_schedule))
        .route("/sessions/{id}/start", post(handle_start))
        .route("/sessions/{id}/pause", post(handle_pause))
        .route("/sessions/{id}/resume", post(handle_resume))
        .route("/sessions/{id}/complete", post(handle_complete))
        .route("/sessions/{id}/cancel", post(handle_cancel))
        .route("/sessions/{id}/bids", post(handle_submit_bid))
        .route("/sessions/{id}/move-to-back", post(handle_move_to_back))
        .route(
            "/sessions/{id}/check-expiration",
            post(handle_check_expiration),
        )
        .route("/stations", get(handle_list_stations))
        .with_state(app_state)
}

/// Builds the shared state from seed data.
fn build_app_state(
    ledger: InMemoryLedger,
    users: Vec<UserProfile>,
    policy: SessionPolicy,
) -> AppState {
    let broadcaster: Arc<LiveEventBroadcaster> = Arc::new(LiveEventBroadcaster::new());
    let service: SessionService = SessionService::new(
        Box::new(ledger),
        Arc::new(InMemoryUserDirectory::new(users)),
        broadcaster.clone(),
        policy,
    );
    AppState {
        service: Arc::new(service),
        broadcaster,
    }
}

/// Waits for Ctrl-C, then tells background tasks to stop.
async fn shutdown_signal(shutdown: watch::Sender<bool>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
    }
    info!("Shutdown requested");
    request_shutdown(&shutdown);
}

/// Flags shutdown to every watcher.
fn request_shutdown(shutdown: &watch::Sender<bool>) {
    if shutdown.send(true).is_err() {
        debug!("No background tasks left to notify of shutdown");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Shift Bid Server");

    let policy: SessionPolicy =
        SessionPolicy::new(args.max_attempts, args.auto_assign_on_exhaustion)?;

    let ledger: InMemoryLedger = if let Some(path) = &args.stations {
        info!(path = %path.display(), "Loading stations");
        config::load_stations(path)?
    } else {
        warn!("No station file given; every bid will find its slot unavailable");
        InMemoryLedger::new()
    };

    let users: Vec<UserProfile> = if let Some(path) = &args.users {
        info!(path = %path.display(), "Loading users");
        config::load_users(path)?
    } else {
        warn!("No user file given; participants cannot be added");
        Vec::new()
    };
    info!(
        users = users.len(),
        max_attempts = policy.max_attempts(),
        auto_assign_on_exhaustion = policy.auto_assign_on_exhaustion(),
        "Engine configured"
    );

    let app_state: AppState = build_app_state(ledger, users, policy);

    // Start the expiration sweeper
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper: ExpirationSweeper = ExpirationSweeper::new(
        Arc::clone(&app_state.service),
        std::time::Duration::from_secs(args.sweep_interval_secs),
    );
    let sweeper_task: tokio::task::JoinHandle<()> =
        tokio::spawn(async move { sweeper.run(shutdown_rx).await });

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: SocketAddr = SocketAddr::new(args.bind, args.port);
    info!("Server listening on {}", addr);

    // Run server
    let listener: tokio::net::TcpListener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    sweeper_task.await?;
    info!("Server stopped");
    Ok(())
}
