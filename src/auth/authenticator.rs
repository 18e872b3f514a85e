// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token authentication.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    claims::Claims,
    error::{AuthError, LookupError},
    keys::DEFAULT_LOOKUP_TIMEOUT,
    token::TokenCodec,
};

/// Required prefix of the `Authorization` header (case-sensitive).
pub const BEARER_PREFIX: &str = "Bearer ";

/// Capability to confirm a token's subject may still sign in.
#[async_trait]
pub trait ActiveUserCheck: Send + Sync {
    /// `Ok(false)` for a disabled user, `Err(NotFound)` for an unknown one.
    async fn is_active(&self, user_id: Uuid) -> Result<bool, LookupError>;
}

/// Turns an `Authorization` header value into verified claims.
pub struct Authenticator {
    codec: Arc<TokenCodec>,
    active_users: Option<Arc<dyn ActiveUserCheck>>,
    lookup_timeout: Duration,
}

impl Authenticator {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self {
            codec,
            active_users: None,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Also reject tokens whose subject is unknown or disabled.
    pub fn with_active_user_check(mut self, check: Arc<dyn ActiveUserCheck>) -> Self {
        self.active_users = Some(check);
        self
    }

    /// Bound on the active user lookup.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// Authenticate the raw `Authorization` header value.
    ///
    /// # Errors
    /// - `Unauthenticated` for a missing or malformed header, any token
    ///   failure, or an unknown/disabled subject
    /// - `KeyUnavailable` / `Transient` when a backing store is unreachable
    pub async fn authenticate(&self, header: Option<&str>) -> Result<Claims, AuthError> {
        let header = header.ok_or_else(|| {
            AuthError::Unauthenticated("authorization header is required".to_string())
        })?;

        let token = header.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
            AuthError::Unauthenticated(
                "expected authorization header format: Bearer <token>".to_string(),
            )
        })?;

        let claims = self.codec.verify(token).await?;

        if let Some(check) = &self.active_users {
            self.ensure_active(check.as_ref(), claims.subject).await?;
        }

        Ok(claims)
    }

    async fn ensure_active(
        &self,
        check: &dyn ActiveUserCheck,
        user_id: Uuid,
    ) -> Result<(), AuthError> {
        let result = tokio::time::timeout(self.lookup_timeout, check.is_active(user_id))
            .await
            .map_err(|_| {
                AuthError::Transient(format!(
                    "active user lookup for {user_id} exceeded {:?}",
                    self.lookup_timeout
                ))
            })?;

        match result {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthError::Unauthenticated(format!(
                "user {user_id} is disabled"
            ))),
            Err(LookupError::NotFound) => Err(AuthError::Unauthenticated(format!(
                "user {user_id} does not exist"
            ))),
            Err(LookupError::Transient(reason)) => Err(AuthError::Transient(format!(
                "active user lookup for {user_id}: {reason}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::Role;
    use crate::auth::testing;

    const SUBJECT: Uuid = Uuid::from_u128(0x5cf3_7266_3473_4006_984f_9325_1226_78b7);

    struct FixedCheck(Result<bool, &'static str>);

    #[async_trait]
    impl ActiveUserCheck for FixedCheck {
        async fn is_active(&self, _user_id: Uuid) -> Result<bool, LookupError> {
            match self.0 {
                Ok(active) => Ok(active),
                Err("missing") => Err(LookupError::NotFound),
                Err(reason) => Err(LookupError::Transient(reason.to_string())),
            }
        }
    }

    async fn bearer(codec: &TokenCodec) -> String {
        let token = codec
            .issue(&testing::claims(SUBJECT, &[Role::User]), "k1")
            .await
            .unwrap();
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn authenticates_bearer_token() {
        let codec = Arc::new(testing::codec());
        let header = bearer(&codec).await;
        let authenticator = Authenticator::new(codec);

        let claims = authenticator.authenticate(Some(&header)).await.unwrap();
        assert_eq!(claims.subject, SUBJECT);
        assert!(claims.has_role(Role::User));
    }

    #[tokio::test]
    async fn missing_header_is_unauthenticated() {
        let authenticator = Authenticator::new(Arc::new(testing::codec()));
        assert!(matches!(
            authenticator.authenticate(None).await,
            Err(AuthError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn prefix_is_case_sensitive() {
        let codec = Arc::new(testing::codec());
        let header = bearer(&codec).await.replacen("Bearer", "bearer", 1);
        let authenticator = Authenticator::new(codec);

        assert!(matches!(
            authenticator.authenticate(Some(&header)).await,
            Err(AuthError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthenticated() {
        let authenticator = Authenticator::new(Arc::new(testing::codec()));
        assert!(matches!(
            authenticator.authenticate(Some("Bearer not.a.token")).await,
            Err(AuthError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn disabled_or_unknown_user_is_unauthenticated() {
        let codec = Arc::new(testing::codec());
        let header = bearer(&codec).await;

        for check in [FixedCheck(Ok(false)), FixedCheck(Err("missing"))] {
            let authenticator =
                Authenticator::new(codec.clone()).with_active_user_check(Arc::new(check));
            assert!(matches!(
                authenticator.authenticate(Some(&header)).await,
                Err(AuthError::Unauthenticated(_))
            ));
        }
    }

    #[tokio::test]
    async fn active_user_lookup_outage_is_transient() {
        let codec = Arc::new(testing::codec());
        let header = bearer(&codec).await;
        let authenticator = Authenticator::new(codec)
            .with_active_user_check(Arc::new(FixedCheck(Err("db down"))));

        assert!(matches!(
            authenticator.authenticate(Some(&header)).await,
            Err(AuthError::Transient(_))
        ));
    }

    #[tokio::test]
    async fn active_user_passes() {
        let codec = Arc::new(testing::codec());
        let header = bearer(&codec).await;
        let authenticator =
            Authenticator::new(codec).with_active_user_check(Arc::new(FixedCheck(Ok(true))));

        assert!(authenticator.authenticate(Some(&header)).await.is_ok());
    }
}
