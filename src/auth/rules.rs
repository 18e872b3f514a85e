// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization rules.
//!
//! A fixed, auditable rule set. New rules are added as enum cases, never as
//! runtime data.

use uuid::Uuid;

use super::{claims::Claims, error::AuthError, roles::Role};

/// Named authorization predicate attached to a route at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationRule {
    /// Any authenticated caller
    Any,
    /// Caller has the admin role
    AdminOnly,
    /// Caller has the user role
    UserOnly,
    /// Caller is an admin or is the owner of the target resource
    AdminOrSubject,
}

impl AuthorizationRule {
    /// Whether the rule needs a target subject to ever allow a non-admin.
    pub fn requires_subject(&self) -> bool {
        matches!(self, AuthorizationRule::AdminOrSubject)
    }

    /// Rule name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            AuthorizationRule::Any => "rule_any",
            AuthorizationRule::AdminOnly => "rule_admin_only",
            AuthorizationRule::UserOnly => "rule_user_only",
            AuthorizationRule::AdminOrSubject => "rule_admin_or_subject",
        }
    }
}

impl std::fmt::Display for AuthorizationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Evaluate `rule` for the caller.
///
/// `claims` is `None` when no authentication ran upstream. `target` is the
/// owner of the resource being accessed, or `None` on collection routes.
///
/// # Errors
/// Returns `AuthError::Unauthorized` carrying the caller's roles and the rule.
pub fn evaluate(
    claims: Option<&Claims>,
    target: Option<Uuid>,
    rule: AuthorizationRule,
) -> Result<(), AuthError> {
    let allowed = match claims {
        None => false,
        Some(claims) => match rule {
            AuthorizationRule::Any => true,
            AuthorizationRule::AdminOnly => claims.has_role(Role::Admin),
            AuthorizationRule::UserOnly => claims.has_role(Role::User),
            AuthorizationRule::AdminOrSubject => {
                if target.is_none() && !claims.is_admin() {
                    tracing::warn!(
                        rule = %rule,
                        "rule evaluated without a target subject; check the route binding"
                    );
                }
                claims.has_role(Role::Admin) || target == Some(claims.subject)
            }
        },
    };

    if allowed {
        Ok(())
    } else {
        Err(AuthError::Unauthorized {
            roles: claims.map(|c| c.roles.clone()).unwrap_or_default(),
            rule,
        })
    }
}
