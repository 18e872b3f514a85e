// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for auth tests.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use uuid::Uuid;

use super::{
    claims::Claims, keys::KeyProvider, keystore::MemoryKeyStore, roles::Role, token::TokenCodec,
};

pub const K1_PRIVATE: &str = include_str!("../../testdata/keys/k1.pem");
pub const K1_PUBLIC: &str = include_str!("../../testdata/keys/k1.pub.pem");
pub const K2_PRIVATE: &str = include_str!("../../testdata/keys/k2.pem");
pub const K2_PUBLIC: &str = include_str!("../../testdata/keys/k2.pub.pem");

pub const ISSUER: &str = "service project";

/// Store holding `k1` and `k2`.
pub fn key_store() -> MemoryKeyStore {
    let mut store = MemoryKeyStore::new();
    store.insert("k1", K1_PRIVATE, K1_PUBLIC).unwrap();
    store.insert("k2", K2_PRIVATE, K2_PUBLIC).unwrap();
    store
}

/// Provider over [`key_store`] issuing under `k1`.
pub fn key_provider() -> Arc<KeyProvider> {
    Arc::new(KeyProvider::new(Arc::new(key_store()), "k1"))
}

/// RS256 codec over [`key_provider`].
pub fn codec() -> TokenCodec {
    TokenCodec::new(key_provider(), ISSUER)
}

/// One hour claims issued now.
pub fn claims(subject: Uuid, roles: &[Role]) -> Claims {
    Claims::new(
        ISSUER,
        subject,
        roles.iter().copied(),
        Utc::now(),
        TimeDelta::hours(1),
    )
    .unwrap()
}
