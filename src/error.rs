// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error translation to HTTP responses.
//!
//! Auth failures carry server-side detail (kid, rule, roles). That detail is
//! logged here and replaced by a generic client message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;

/// Client message for malformed resource identifiers.
pub const INVALID_ID_MESSAGE: &str = "ID is not in its proper form";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthenticated")
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Unauthorized")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let api = match &err {
            AuthError::Unauthenticated(_) => ApiError::unauthenticated(),
            AuthError::Unauthorized { .. } => ApiError::unauthorized(),
            AuthError::BadRequest(_) => ApiError::bad_request(INVALID_ID_MESSAGE),
            AuthError::NotFound { kind, .. } => ApiError::not_found(format!("{kind} not found")),
            AuthError::KeyUnavailable(_) | AuthError::Transient(_) => ApiError::internal(),
        };

        if api.status.is_server_error() {
            tracing::error!(error = %err, code = err.error_code(), "Request failed");
        } else {
            tracing::warn!(error = %err, code = err.error_code(), "Request rejected");
        }

        api
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
