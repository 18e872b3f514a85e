// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership-aware authorization for resource routes.
//!
//! One generic middleware serves every resource kind. A kind plugs in by
//! implementing [`OwnedResource`] (how to parse its id, who owns it) and
//! providing a [`ResourceLookup`] (how to load it).
//!
//! ## Per-request flow
//!
//! 1. Read the kind's path parameter, if the route has one, and parse it.
//!    A malformed id is a `BadRequest`; no lookup happens.
//! 2. Load the resource. A missing resource is `NotFound`, never a denial.
//! 3. Evaluate the route's rule with the owner as target subject, or with
//!    no target on collection routes.
//! 4. On allow, attach the resource as [`Loaded<R>`] and run the handler.
//!    On deny, stop with `Unauthorized`.
//!
//! Ownership is resolved fresh on every request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{
        rejection::RawPathParamsRejection, FromRequestParts, RawPathParams, Request, State,
    },
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::{
    claims::Claims,
    error::{AuthError, LookupError},
    extractor::Loaded,
    keys::DEFAULT_LOOKUP_TIMEOUT,
    rules::{self, AuthorizationRule},
};

/// A resource kind whose instances have an owning user.
pub trait OwnedResource: Clone + Send + Sync + 'static {
    /// Kind name used in logs and not-found responses
    const KIND: &'static str;
    /// Path parameter carrying the resource id
    const PATH_PARAM: &'static str;

    type Id: std::fmt::Display + Send + Sync + 'static;

    /// Parse the raw path parameter, `None` if malformed.
    fn parse_id(raw: &str) -> Option<Self::Id>;

    /// User who owns this instance.
    fn owner_id(&self) -> Uuid;
}

/// Persistence seam: load one resource by id.
#[async_trait]
pub trait ResourceLookup<R: OwnedResource>: Send + Sync {
    async fn lookup_by_id(&self, id: &R::Id) -> Result<R, LookupError>;
}

/// Middleware state binding a rule and a lookup to one resource kind.
pub struct OwnershipGuard<R: OwnedResource> {
    lookup: Arc<dyn ResourceLookup<R>>,
    rule: AuthorizationRule,
    timeout: Duration,
}

impl<R: OwnedResource> Clone for OwnershipGuard<R> {
    fn clone(&self) -> Self {
        Self {
            lookup: self.lookup.clone(),
            rule: self.rule,
            timeout: self.timeout,
        }
    }
}

impl<R: OwnedResource> OwnershipGuard<R> {
    pub fn new(lookup: Arc<dyn ResourceLookup<R>>, rule: AuthorizationRule) -> Self {
        Self {
            lookup,
            rule,
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Bound on the resource lookup.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn rule(&self) -> AuthorizationRule {
        self.rule
    }

    /// Decide the request. Returns the loaded resource when an id was given.
    pub async fn check(
        &self,
        claims: Option<&Claims>,
        raw_id: Option<&str>,
    ) -> Result<Option<R>, AuthError> {
        let Some(raw_id) = raw_id else {
            rules::evaluate(claims, None, self.rule)?;
            return Ok(None);
        };

        let id = R::parse_id(raw_id).ok_or_else(|| {
            AuthError::BadRequest(format!("{} id {raw_id:?} is not in its proper form", R::KIND))
        })?;

        let resource = self.load(&id).await?;
        let owner = resource.owner_id();

        rules::evaluate(claims, Some(owner), self.rule)?;

        tracing::debug!(
            kind = R::KIND,
            id = %id,
            owner = %owner,
            rule = %self.rule,
            "Resource access authorized"
        );
        Ok(Some(resource))
    }

    async fn load(&self, id: &R::Id) -> Result<R, AuthError> {
        let result = tokio::time::timeout(self.timeout, self.lookup.lookup_by_id(id))
            .await
            .map_err(|_| {
                AuthError::Transient(format!(
                    "{} {id} lookup exceeded {:?}",
                    R::KIND,
                    self.timeout
                ))
            })?;

        result.map_err(|e| match e {
            LookupError::NotFound => AuthError::NotFound {
                kind: R::KIND,
                id: id.to_string(),
            },
            LookupError::Transient(reason) => {
                AuthError::Transient(format!("{} {id} lookup: {reason}", R::KIND))
            }
        })
    }
}

/// Ownership middleware.
///
/// # Usage
///
/// ```rust,ignore
/// let guard = OwnershipGuard::<Product>::new(lookup, AuthorizationRule::AdminOrSubject);
///
/// Router::new().route(
///     "/products/{product_id}",
///     put(update_product).layer(axum::middleware::from_fn_with_state(
///         guard,
///         authorize_resource::<Product>,
///     )),
/// );
/// ```
pub async fn authorize_resource<R: OwnedResource>(
    State(guard): State<OwnershipGuard<R>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (mut parts, body) = request.into_parts();

    let raw_id = match RawPathParams::from_request_parts(&mut parts, &()).await {
        Ok(params) => params
            .iter()
            .find(|(key, _)| *key == R::PATH_PARAM)
            .map(|(_, value)| value.to_string()),
        Err(RawPathParamsRejection::InvalidUtf8InPathParam(e)) => {
            return Err(AuthError::BadRequest(format!("{} id: {}", R::KIND, e.body_text())));
        }
        Err(_) => None,
    };
    let claims = parts.extensions.get::<Claims>().cloned();

    if let Some(resource) = guard.check(claims.as_ref(), raw_id.as_deref()).await? {
        parts.extensions.insert(Loaded(resource));
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}
