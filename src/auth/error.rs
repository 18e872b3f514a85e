// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.
//!
//! Lower layers report precise failures (`KeyError`, `TokenError`,
//! `LookupError`). Everything that leaves the subsystem is an [`AuthError`],
//! whose client-facing rendering lives in [`crate::error`].

use std::collections::BTreeSet;

use axum::response::{IntoResponse, Response};

use super::{roles::Role, rules::AuthorizationRule};
use crate::error::ApiError;

/// Key lookup failure.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// The store has no key under this kid
    #[error("kid {0} not found")]
    NotFound(String),
    /// The store could not be reached or answered with an error
    #[error("key store unavailable for kid {kid}: {reason}")]
    Unavailable { kid: String, reason: String },
    /// Key material exists but cannot be used
    #[error("key {kid} is malformed: {reason}")]
    Malformed { kid: String, reason: String },
    /// Reading key files from disk failed
    #[error("reading key material: {0}")]
    Io(#[from] std::io::Error),
}

/// Token issuance or verification failure.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("key unavailable: {0}")]
    KeyUnavailable(#[source] KeyError),
    #[error("signing failure: {0}")]
    Signing(String),
    #[error("claims carry no roles")]
    NoRoles,
    /// Requested token lifetime cannot be represented
    #[error("invalid token lifetime: {0}")]
    Lifetime(String),
    /// Malformed, forged, expired or otherwise unacceptable token.
    /// The detail is for logs only.
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Resource lookup failure reported by the persistence seam.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("not found")]
    NotFound,
    #[error("transient lookup failure: {0}")]
    Transient(String),
}

/// Failure produced at the boundary of the auth subsystem.
///
/// `Unauthenticated`, `Unauthorized` and `BadRequest` are the client-facing
/// cases. `NotFound` keeps a missing resource distinct from a denial.
/// `KeyUnavailable` and `Transient` are infrastructure failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("not authorized for that action, claims[{roles:?}] rule[{rule}]")]
    Unauthorized {
        roles: BTreeSet<Role>,
        rule: AuthorizationRule,
    },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("transient failure: {0}")]
    Transient(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated(_) => "unauthenticated",
            AuthError::Unauthorized { .. } => "unauthorized",
            AuthError::BadRequest(_) => "bad_request",
            AuthError::NotFound { .. } => "not_found",
            AuthError::KeyUnavailable(_) => "key_unavailable",
            AuthError::Transient(_) => "transient",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::KeyUnavailable(e) => AuthError::KeyUnavailable(e.to_string()),
            other => AuthError::Unauthenticated(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
