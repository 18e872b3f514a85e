// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Issues and verifies bearer tokens and enforces authorization rules,
//! including rules that depend on who owns the targeted resource.
//!
//! ## Request Flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. `authenticate` middleware:
//!    - Reads `kid` from the token header
//!    - Resolves the public key (cached per kid)
//!    - Verifies algorithm, signature, issuer and expiry
//!    - Attaches `Claims` to the request
//! 3. `authorize` (collection routes) or `authorize_resource` (resource
//!    routes) evaluates the route's rule, loading the resource first when
//!    the rule depends on its owner
//! 4. Handler reads `Identity` and `Loaded<R>`
//!
//! ## Security
//!
//! - Accepted signing algorithms are pinned at startup
//! - No clock skew leeway on expiry
//! - Clients see only generic failure messages; details go to the logs

pub mod authenticator;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod keys;
pub mod keystore;
pub mod middleware;
pub mod ownership;
pub mod roles;
pub mod rules;
pub mod token;
pub mod vault;

#[cfg(test)]
pub(crate) mod testing;

pub use authenticator::{ActiveUserCheck, Authenticator};
pub use claims::Claims;
pub use error::{AuthError, KeyError, LookupError, TokenError};
pub use extractor::{Identity, Loaded};
pub use keys::{KeyProvider, KeyStore};
pub use keystore::MemoryKeyStore;
pub use ownership::{authorize_resource, OwnedResource, OwnershipGuard, ResourceLookup};
pub use roles::Role;
pub use rules::AuthorizationRule;
pub use token::TokenCodec;
pub use vault::{VaultConfig, VaultKeyStore};
