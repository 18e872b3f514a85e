// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and rule middleware for Axum.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route(
//!         "/users",
//!         get(list_users).layer(axum::middleware::from_fn_with_state(
//!             AuthorizationRule::AdminOnly,
//!             authorize,
//!         )),
//!     )
//!     .layer(axum::middleware::from_fn_with_state(
//!         authenticator.clone(),
//!         authenticate,
//!     ));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use super::{
    authenticator::Authenticator,
    claims::Claims,
    error::AuthError,
    rules::{self, AuthorizationRule},
};

/// Verify the bearer token and attach the claims to the request.
pub async fn authenticate(
    State(authenticator): State<Arc<Authenticator>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map(str::to_owned).map_err(|_| {
            AuthError::Unauthenticated("authorization header is not valid ASCII".to_string())
        })?),
        None => None,
    };

    let claims = authenticator.authenticate(header.as_deref()).await?;

    tracing::debug!(
        subject = %claims.subject,
        roles = ?claims.roles,
        "Request authenticated"
    );
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Evaluate a fixed rule for a route that targets no specific resource.
pub async fn authorize(
    State(rule): State<AuthorizationRule>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    rules::evaluate(request.extensions().get::<Claims>(), None, rule)?;
    Ok(next.run(request).await)
}
