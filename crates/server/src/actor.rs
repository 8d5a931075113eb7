// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Actor extraction at the server boundary.
//!
//! Identity is owned by an upstream gateway, which forwards the caller as
//! two headers:
//!
//! - `X-Actor-Id`: the user id, or the operator's login
//! - `X-Actor-Role`: `participant` or `admin`
//!
//! The system role is reserved for in-process callers such as the
//! expiration sweeper and is refused here.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use shift_bid_audit::{Actor, ActorKind};
use tracing::{debug, warn};

use crate::ErrorResponse;

/// Header carrying the actor id.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the actor role.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Extractor for the acting user.
///
/// # Usage
///
/// ```ignore
/// async fn my_handler(RequestActor(actor): RequestActor) -> impl IntoResponse {
///     // actor: shift_bid_audit::Actor
/// }
/// ```
///
/// # Errors
///
/// Rejects with HTTP 401 when either header is missing, is not valid
/// text, or names an unknown role.
pub struct RequestActor(pub Actor);

impl<S: Send + Sync> FromRequestParts<S> for RequestActor {
    type Rejection = ActorError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id: &str = header(&parts.headers, ACTOR_ID_HEADER)?;
        let role: &str = header(&parts.headers, ACTOR_ROLE_HEADER)?;

        let kind: ActorKind = role.parse().map_err(|_| {
            warn!(role, "Unknown actor role");
            ActorError::InvalidRole(role.to_string())
        })?;
        if kind == ActorKind::System {
            warn!(actor_id = id, "Refusing system actor from HTTP");
            return Err(ActorError::InvalidRole(role.to_string()));
        }

        debug!(actor_id = id, role = %kind, "Actor identified");
        Ok(Self(Actor::new(id.to_string(), kind)))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, ActorError> {
    let value: &str = headers
        .get(name)
        .ok_or(ActorError::MissingHeader(name))?
        .to_str()
        .map_err(|_| ActorError::InvalidHeader(name))?
        .trim();
    if value.is_empty() {
        return Err(ActorError::MissingHeader(name));
    }
    Ok(value)
}

/// Actor extraction errors.
#[derive(Debug, PartialEq, Eq)]
pub enum ActorError {
    /// A required header is absent or blank.
    MissingHeader(&'static str),
    /// A header is not valid visible ASCII.
    InvalidHeader(&'static str),
    /// The role is not `participant` or `admin`.
    InvalidRole(String),
}

impl IntoResponse for ActorError {
    fn into_response(self) -> Response {
        let message: String = match self {
            Self::MissingHeader(name) => format!("Missing {name} header"),
            Self::InvalidHeader(name) => format!("Invalid {name} header encoding"),
            Self::InvalidRole(role) => {
                format!("Invalid role '{role}'. Must be 'participant' or 'admin'")
            }
        };
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            kind: String::from("unauthenticated"),
            rule: None,
            message,
        });
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
