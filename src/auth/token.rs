// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token signing and verification.
//!
//! ## Security
//!
//! - Tokens are RS256 JWS compact strings with the signing kid in the header
//! - The accepted algorithms are pinned when the codec is built; the `alg`
//!   named inside a token is never trusted on its own
//! - Expiry is checked against an explicit clock with no leeway, so the
//!   boundary is deterministic: a token is invalid at exactly `exp`
//! - Every client-side failure is reported as `TokenError::Invalid`; the
//!   detail is for server logs only

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, Header, Validation};

use super::{
    claims::Claims,
    error::{KeyError, TokenError},
    keys::KeyProvider,
};

/// Issues and verifies signed tokens.
pub struct TokenCodec {
    /// Key material source
    keys: Arc<KeyProvider>,
    /// Issuer written into and required of every token
    issuer: String,
    /// Algorithm used to sign new tokens
    algorithm: Algorithm,
    /// Algorithms accepted on verification
    allowed_algorithms: Vec<Algorithm>,
}

impl TokenCodec {
    /// Create an RS256 codec that accepts only RS256.
    pub fn new(keys: Arc<KeyProvider>, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            algorithm: Algorithm::RS256,
            allowed_algorithms: vec![Algorithm::RS256],
        }
    }

    /// Issuer this codec signs and requires.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Key provider backing this codec.
    pub fn keys(&self) -> &Arc<KeyProvider> {
        &self.keys
    }

    /// Sign `claims` with the private key for `kid`.
    pub async fn issue(&self, claims: &Claims, kid: &str) -> Result<String, TokenError> {
        if claims.roles.is_empty() {
            return Err(TokenError::NoRoles);
        }

        let key = self
            .keys
            .private_key(kid)
            .await
            .map_err(TokenError::KeyUnavailable)?;

        let mut header = Header::new(self.algorithm);
        header.kid = Some(kid.to_string());

        encode(&header, claims, &key).map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Sign `claims` under the currently active kid.
    pub async fn issue_active(&self, claims: &Claims) -> Result<String, TokenError> {
        let kid = self.keys.active_kid().await;
        self.issue(claims, &kid).await
    }

    /// Verify `token` against the current time.
    pub async fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now()).await
    }

    /// Verify `token` as of `now`.
    pub async fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        if token.split('.').count() != 3 {
            return Err(TokenError::Invalid(
                "expected three dot separated segments".to_string(),
            ));
        }

        let header =
            decode_header(token).map_err(|e| TokenError::Invalid(format!("header: {e}")))?;

        // Pinned before any key lookup
        if !self.allowed_algorithms.contains(&header.alg) {
            return Err(TokenError::Invalid(format!(
                "algorithm {:?} is not allowed",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| TokenError::Invalid("kid missing from header".to_string()))?;

        let key = match self.keys.public_key(&kid).await {
            Ok(key) => key,
            Err(KeyError::NotFound(_)) => {
                return Err(TokenError::Invalid(format!("unknown kid {kid}")));
            }
            Err(e) => return Err(TokenError::KeyUnavailable(e)),
        };

        let mut validation = Validation::new(self.algorithm);
        validation.algorithms = self.allowed_algorithms.clone();
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let claims = decode::<Claims>(token, &key, &validation)
            .map_err(|e| TokenError::Invalid(format!("kid[{kid}]: {e}")))?
            .claims;

        if now >= claims.expires_at {
            return Err(TokenError::Invalid(format!(
                "kid[{kid}]: token expired at {}",
                claims.expires_at
            )));
        }

        if claims.roles.is_empty() {
            return Err(TokenError::Invalid(format!("kid[{kid}]: token carries no roles")));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::Role;
    use crate::auth::testing::{self, ISSUER, K1_PRIVATE, K1_PUBLIC};
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use chrono::TimeDelta;
    use jsonwebtoken::EncodingKey;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn subject() -> Uuid {
        Uuid::parse_str("5cf37266-3473-4006-984f-9325122678b7").unwrap()
    }

    fn sign_raw(header: &Header, claims: &Claims, key: &EncodingKey) -> String {
        encode(header, claims, key).unwrap()
    }

    #[tokio::test]
    async fn issue_then_verify_round_trips() {
        let codec = testing::codec();
        let claims = testing::claims(subject(), &[Role::Admin, Role::User]);

        let token = codec.issue(&claims, "k1").await.unwrap();
        let parsed = codec.verify(&token).await.unwrap();

        assert_eq!(parsed, claims);
    }

    #[tokio::test]
    async fn issued_header_carries_kid_and_rs256() {
        let codec = testing::codec();
        let token = codec
            .issue(&testing::claims(subject(), &[Role::User]), "k2")
            .await
            .unwrap();

        let header = decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some("k2"));
        assert_eq!(header.alg, Algorithm::RS256);
    }

    #[tokio::test]
    async fn validly_signed_token_with_other_algorithm_is_rejected() {
        let codec = testing::codec();
        let claims = testing::claims(subject(), &[Role::Admin]);

        let mut header = Header::new(Algorithm::RS512);
        header.kid = Some("k1".to_string());
        let key = EncodingKey::from_rsa_pem(K1_PRIVATE.as_bytes()).unwrap();
        let token = sign_raw(&header, &claims, &key);

        let result = codec.verify(&token).await;
        assert!(matches!(result, Err(TokenError::Invalid(msg)) if msg.contains("RS512")));
    }

    #[tokio::test]
    async fn hmac_forged_with_public_key_is_rejected() {
        let codec = testing::codec();
        let claims = testing::claims(subject(), &[Role::Admin]);

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some("k1".to_string());
        let token = sign_raw(
            &header,
            &claims,
            &EncodingKey::from_secret(K1_PUBLIC.as_bytes()),
        );

        assert!(matches!(
            codec.verify(&token).await,
            Err(TokenError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn expiry_boundary_is_deterministic() {
        let codec = testing::codec();
        let issued = DateTime::from_timestamp(1_800_000_000, 0).unwrap();
        let claims = Claims::new(
            ISSUER,
            subject(),
            [Role::User],
            issued,
            TimeDelta::seconds(1),
        )
        .unwrap();
        let token = codec.issue(&claims, "k1").await.unwrap();

        // One second before expiry
        assert!(codec.verify_at(&token, issued).await.is_ok());
        // Exactly at expiry
        assert!(codec
            .verify_at(&token, issued + TimeDelta::seconds(1))
            .await
            .is_err());
        // After expiry
        assert!(codec
            .verify_at(&token, issued + TimeDelta::seconds(2))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn expired_token_fails_against_wall_clock() {
        let codec = testing::codec();
        let claims = Claims::new(
            ISSUER,
            subject(),
            [Role::User],
            Utc::now() - TimeDelta::hours(2),
            TimeDelta::hours(1),
        )
        .unwrap();
        let token = codec.issue(&claims, "k1").await.unwrap();

        assert!(matches!(
            codec.verify(&token).await,
            Err(TokenError::Invalid(msg)) if msg.contains("expired")
        ));
    }

    #[tokio::test]
    async fn token_signed_before_rotation_still_verifies() {
        let codec = testing::codec();
        let claims = testing::claims(subject(), &[Role::User]);

        let old = codec.issue_active(&claims).await.unwrap();
        codec.keys().rotate("k2").await.unwrap();
        let new = codec.issue_active(&claims).await.unwrap();

        assert_eq!(decode_header(&old).unwrap().kid.as_deref(), Some("k1"));
        assert_eq!(decode_header(&new).unwrap().kid.as_deref(), Some("k2"));
        assert_eq!(codec.verify(&old).await.unwrap(), claims);
        assert_eq!(codec.verify(&new).await.unwrap(), claims);
    }

    #[tokio::test]
    async fn tampered_payload_fails_signature() {
        let codec = testing::codec();
        let token = codec
            .issue(&testing::claims(subject(), &[Role::User]), "k1")
            .await
            .unwrap();

        let mut forged = testing::claims(subject(), &[Role::User]);
        forged.roles = BTreeSet::from([Role::Admin]);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());

        let segments: Vec<&str> = token.split('.').collect();
        let tampered = format!("{}.{}.{}", segments[0], payload, segments[2]);

        assert!(matches!(
            codec.verify(&tampered).await,
            Err(TokenError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn wrong_segment_count_is_invalid() {
        let codec = testing::codec();
        for token in ["", "abc", "a.b", "a.b.c.d"] {
            assert!(matches!(
                codec.verify(token).await,
                Err(TokenError::Invalid(_))
            ));
        }
    }

    #[tokio::test]
    async fn missing_or_unknown_kid_is_invalid() {
        let codec = testing::codec();
        let claims = testing::claims(subject(), &[Role::User]);
        let key = EncodingKey::from_rsa_pem(K1_PRIVATE.as_bytes()).unwrap();

        let no_kid = sign_raw(&Header::new(Algorithm::RS256), &claims, &key);
        assert!(matches!(
            codec.verify(&no_kid).await,
            Err(TokenError::Invalid(msg)) if msg.contains("kid missing")
        ));

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some("k9".to_string());
        let unknown = sign_raw(&header, &claims, &key);
        assert!(matches!(
            codec.verify(&unknown).await,
            Err(TokenError::Invalid(msg)) if msg.contains("unknown kid")
        ));
    }

    #[tokio::test]
    async fn foreign_issuer_is_rejected() {
        let codec = testing::codec();
        let other = TokenCodec::new(testing::key_provider(), "someone else");
        let claims = Claims::new(
            other.issuer(),
            subject(),
            [Role::User],
            Utc::now(),
            TimeDelta::hours(1),
        )
        .unwrap();
        let token = other.issue(&claims, "k1").await.unwrap();

        assert!(matches!(
            codec.verify(&token).await,
            Err(TokenError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn issue_rejects_empty_roles_and_unknown_kid() {
        let codec = testing::codec();
        let mut claims = testing::claims(subject(), &[Role::User]);

        assert!(matches!(
            codec.issue(&claims, "k9").await,
            Err(TokenError::KeyUnavailable(KeyError::NotFound(_)))
        ));

        claims.roles.clear();
        assert!(matches!(
            codec.issue(&claims, "k1").await,
            Err(TokenError::NoRoles)
        ));
    }
}
