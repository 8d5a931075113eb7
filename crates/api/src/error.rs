// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use shift_bid::CoreError;
use shift_bid_domain::{DomainError, ErrorKind};

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// A lifecycle, turn, capacity or concurrency rule was violated.
    DomainRuleViolation {
        /// The category of the violation.
        kind: ErrorKind,
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl ApiError {
    /// Returns the machine-readable error category.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::DomainRuleViolation { kind, .. } => kind.as_str(),
            Self::InvalidInput { .. } => ErrorKind::Validation.as_str(),
            Self::ResourceNotFound { .. } => ErrorKind::NotFound.as_str(),
            Self::Internal { .. } => "internal",
        }
    }

    /// Returns the violated rule, if this error came from a domain rule.
    #[must_use]
    pub fn rule(&self) -> Option<&str> {
        match self {
            Self::DomainRuleViolation { rule, .. } => Some(rule),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::DomainRuleViolation { rule, message, .. } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        translate_domain_error(err)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        translate_core_error(err)
    }
}

fn resource_type(err: &DomainError) -> &'static str {
    match err {
        DomainError::SessionNotFound(_) => "Session",
        DomainError::ParticipantNotFound(_) => "Participant",
        DomainError::StationNotFound(_) => "Station",
        DomainError::UserNotFound(_) => "User",
        _ => "Assignment",
    }
}

fn input_field(err: &DomainError) -> String {
    match err {
        DomainError::InvalidInput { field, .. } => (*field).to_string(),
        DomainError::InvalidShift(_) => String::from("shift"),
        DomainError::InvalidRole(_) | DomainError::RoleMismatch { .. } => String::from("role"),
        DomainError::InvalidStatus(_) => String::from("status"),
        DomainError::InvalidPolicy(_) => String::from("policy"),
        _ => String::from("user_id"),
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked
/// directly. The rule name is kept so that clients can tell a lapsed window
/// from a turn violation from a full slot.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let kind: ErrorKind = err.kind();
    match kind {
        ErrorKind::Validation => ApiError::InvalidInput {
            field: input_field(&err),
            message: err.to_string(),
        },
        ErrorKind::NotFound => ApiError::ResourceNotFound {
            resource_type: resource_type(&err).to_string(),
            message: err.to_string(),
        },
        ErrorKind::State | ErrorKind::Turn | ErrorKind::Capacity | ErrorKind::ConcurrencyConflict => {
            ApiError::DomainRuleViolation {
                kind,
                rule: err.rule().to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Translates a core error into an API error.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::InvariantViolation(msg) => ApiError::Internal {
            message: format!("Invariant violation: {msg}"),
        },
    }
}
