// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims.

use std::collections::BTreeSet;

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{error::TokenError, roles::Role};

/// The signed payload of a bearer token.
///
/// Field names on the wire are the registered JWT names (`iss`, `sub`,
/// `iat`, `exp`) plus `roles`. Timestamps are whole seconds since the epoch.
///
/// Claims are built once at issuance and rebuilt from the token on every
/// request. They are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer of the token
    #[serde(rename = "iss")]
    pub issuer: String,

    /// Subject: the caller's user ID
    #[serde(rename = "sub")]
    pub subject: Uuid,

    /// Issued at
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    /// Roles granted to the subject. Never empty for an authenticated caller.
    pub roles: BTreeSet<Role>,
}

impl Claims {
    /// Build claims for a freshly authenticated user.
    ///
    /// `issued_at` is truncated to whole seconds so the claims survive a
    /// round trip through the wire format unchanged.
    pub fn new(
        issuer: impl Into<String>,
        subject: Uuid,
        roles: impl IntoIterator<Item = Role>,
        issued_at: DateTime<Utc>,
        ttl: TimeDelta,
    ) -> Result<Self, TokenError> {
        let roles: BTreeSet<Role> = roles.into_iter().collect();
        if roles.is_empty() {
            return Err(TokenError::NoRoles);
        }

        let issued_at = issued_at.trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Lifetime(format!("{ttl} overflows the expiry time")))?;

        Ok(Self {
            issuer: issuer.into(),
            subject,
            issued_at,
            expires_at,
            roles,
        })
    }

    /// Check if the claims carry the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Check if the caller is an admin.
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}
