// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the request identity and the authorized resource.
//!
//! The middleware chain attaches both to the request; handlers receive them
//! as typed arguments:
//!
//! ```rust,ignore
//! async fn update_product(
//!     Identity(claims): Identity,
//!     Loaded(product): Loaded<Product>,
//! ) -> impl IntoResponse {
//!     // claims.subject is the caller, product was loaded and authorized
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{claims::Claims, error::AuthError, ownership::OwnedResource};

/// Verified claims of the caller.
///
/// Requires the `authenticate` middleware on the route.
#[derive(Debug, Clone)]
pub struct Identity(pub Claims);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(Identity)
            .ok_or_else(|| AuthError::Unauthenticated("no claims on request".to_string()))
    }
}

/// Resource loaded and authorized by the ownership middleware.
#[derive(Debug, Clone)]
pub struct Loaded<R>(pub R);

impl<S, R> FromRequestParts<S> for Loaded<R>
where
    S: Send + Sync,
    R: OwnedResource,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Loaded<R>>().cloned().ok_or_else(|| {
            AuthError::Transient(format!(
                "{} was not loaded; route is missing its ownership guard",
                R::KIND
            ))
        })
    }
}
