// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state and its startup wiring.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::auth::{
    Authenticator, KeyError, KeyProvider, KeyStore, MemoryKeyStore, TokenCodec, VaultKeyStore,
};
use crate::config::{Config, ConfigError, KeySource};
use crate::store::SharedStore;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("loading signing keys: {0}")]
    Keys(#[from] KeyError),
    #[error("building vault client: {0}")]
    VaultClient(#[from] reqwest::Error),
    #[error("binding listener: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub authenticator: Arc<Authenticator>,
    pub codec: Arc<TokenCodec>,
    /// Bound on resource lookups made by the ownership guards.
    pub lookup_timeout: Duration,
}

impl AppState {
    /// Wire the authenticator to `store`, which also answers whether a
    /// token's subject is still enabled.
    pub fn new(store: SharedStore, codec: Arc<TokenCodec>, lookup_timeout: Duration) -> Self {
        let authenticator = Authenticator::new(codec.clone())
            .with_active_user_check(store.clone())
            .with_lookup_timeout(lookup_timeout);

        Self {
            store,
            authenticator: Arc::new(authenticator),
            codec,
            lookup_timeout,
        }
    }
}

/// Open the key store selected by the configuration.
pub fn open_key_store(source: &KeySource) -> Result<Arc<dyn KeyStore>, StartupError> {
    match source {
        KeySource::Directory(dir) => Ok(Arc::new(MemoryKeyStore::load_dir(dir)?)),
        KeySource::Vault(vault) => {
            tracing::info!(
                address = %vault.address,
                mount = %vault.mount_path,
                "Using Vault key store"
            );
            Ok(Arc::new(VaultKeyStore::new(vault.clone())?))
        }
    }
}

/// Build the token codec and check that the active kid can sign.
pub async fn token_codec(config: &Config) -> Result<Arc<TokenCodec>, StartupError> {
    let store = open_key_store(&config.key_source)?;
    let keys = KeyProvider::new(store, config.active_kid.clone())
        .with_lookup_timeout(config.lookup_timeout);

    keys.private_key(&config.active_kid).await?;

    Ok(Arc::new(TokenCodec::new(Arc::new(keys), config.issuer.clone())))
}
