// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing key resolution and public key caching.
//!
//! ## Rotation
//!
//! - Any number of kids may verify at the same time
//! - Exactly one kid is active for issuance
//! - A kid's key is immutable once issued, so resolved public keys are cached
//!   for the life of the process with no TTL and no eviction

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, EncodingKey};
use tokio::sync::RwLock;

use super::error::KeyError;

/// Default bound on a single secret store call.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(1);

/// Backend holding PEM encoded RSA key pairs by kid.
///
/// Implementations translate their own failures into [`KeyError`]. They must
/// not retry; retry policy belongs to the backend client.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// PEM encoded private key for `kid`.
    async fn private_key(&self, kid: &str) -> Result<String, KeyError>;

    /// PEM encoded public key for `kid`.
    async fn public_key(&self, kid: &str) -> Result<String, KeyError>;
}

/// Key provider with a process-lifetime public key cache.
pub struct KeyProvider {
    /// Backing secret store
    store: Arc<dyn KeyStore>,
    /// Kid used for new tokens
    active_kid: RwLock<String>,
    /// Resolved public keys
    cache: RwLock<HashMap<String, DecodingKey>>,
    /// Bound on each store call
    lookup_timeout: Duration,
}

impl KeyProvider {
    /// Create a provider issuing under `active_kid`.
    pub fn new(store: Arc<dyn KeyStore>, active_kid: impl Into<String>) -> Self {
        Self {
            store,
            active_kid: RwLock::new(active_kid.into()),
            cache: RwLock::new(HashMap::new()),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Create with a custom store timeout.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Kid currently used for issuance.
    pub async fn active_kid(&self) -> String {
        self.active_kid.read().await.clone()
    }

    /// Make `kid` the active issuance key.
    ///
    /// Tokens signed under the previous kid stay verifiable for as long as
    /// its public key resolves.
    ///
    /// # Errors
    /// Fails without switching if the private key for `kid` cannot be loaded.
    pub async fn rotate(&self, kid: &str) -> Result<(), KeyError> {
        self.private_key(kid).await?;

        let mut active = self.active_kid.write().await;
        let previous = std::mem::replace(&mut *active, kid.to_string());
        tracing::info!(previous_kid = %previous, active_kid = %kid, "Rotated signing key");
        Ok(())
    }

    /// Load the signing key for `kid`. Private keys are never cached.
    pub async fn private_key(&self, kid: &str) -> Result<EncodingKey, KeyError> {
        let pem = self.bounded(kid, self.store.private_key(kid)).await?;

        EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| KeyError::Malformed {
            kid: kid.to_string(),
            reason: e.to_string(),
        })
    }

    /// Resolve the verification key for `kid`, consulting the cache first.
    pub async fn public_key(&self, kid: &str) -> Result<DecodingKey, KeyError> {
        // Check cache first
        {
            let cache = self.cache.read().await;
            if let Some(key) = cache.get(kid) {
                return Ok(key.clone());
            }
        }

        // Miss: fetch without holding the lock
        let pem = self.bounded(kid, self.store.public_key(kid)).await?;
        let key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| KeyError::Malformed {
            kid: kid.to_string(),
            reason: e.to_string(),
        })?;

        // A concurrent miss may have filled the slot already; keep the first
        let mut cache = self.cache.write().await;
        let key = cache.entry(kid.to_string()).or_insert(key).clone();
        tracing::debug!(kid = %kid, cached = cache.len(), "Cached public key");

        Ok(key)
    }

    /// Number of public keys currently cached.
    pub async fn cached_key_count(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn bounded<F>(&self, kid: &str, lookup: F) -> Result<String, KeyError>
    where
        F: std::future::Future<Output = Result<String, KeyError>>,
    {
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(KeyError::Unavailable {
                kid: kid.to_string(),
                reason: format!("lookup exceeded {:?}", self.lookup_timeout),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::keystore::MemoryKeyStore;
    use crate::auth::testing::{K1_PRIVATE, K1_PUBLIC, K2_PRIVATE, K2_PUBLIC};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store wrapper counting public key fetches.
    struct CountingStore {
        inner: MemoryKeyStore,
        public_fetches: AtomicUsize,
    }

    #[async_trait]
    impl KeyStore for CountingStore {
        async fn private_key(&self, kid: &str) -> Result<String, KeyError> {
            self.inner.private_key(kid).await
        }

        async fn public_key(&self, kid: &str) -> Result<String, KeyError> {
            self.public_fetches.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.inner.public_key(kid).await
        }
    }

    struct SlowStore;

    #[async_trait]
    impl KeyStore for SlowStore {
        async fn private_key(&self, _kid: &str) -> Result<String, KeyError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(K1_PRIVATE.to_string())
        }

        async fn public_key(&self, _kid: &str) -> Result<String, KeyError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(K1_PUBLIC.to_string())
        }
    }

    fn counting_store(kids: &[&str]) -> Arc<CountingStore> {
        let mut inner = MemoryKeyStore::new();
        for (i, kid) in kids.iter().enumerate() {
            let (private, public) = if i % 2 == 0 {
                (K1_PRIVATE, K1_PUBLIC)
            } else {
                (K2_PRIVATE, K2_PUBLIC)
            };
            inner.insert(*kid, private, public).unwrap();
        }
        Arc::new(CountingStore {
            inner,
            public_fetches: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn public_key_is_cached_after_first_lookup() {
        let store = counting_store(&["k1"]);
        let provider = KeyProvider::new(store.clone(), "k1");

        assert_eq!(provider.cached_key_count().await, 0);
        provider.public_key("k1").await.unwrap();
        provider.public_key("k1").await.unwrap();

        assert_eq!(provider.cached_key_count().await, 1);
        assert_eq!(store.public_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_kid_is_not_found_and_not_cached() {
        let provider = KeyProvider::new(counting_store(&["k1"]), "k1");

        let result = provider.public_key("missing").await;
        assert!(matches!(result, Err(KeyError::NotFound(_))));
        assert_eq!(provider.cached_key_count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_fill_cache_once_per_kid() {
        let kids = ["a", "b", "c", "d", "e", "f"];
        let provider = Arc::new(KeyProvider::new(counting_store(&kids), "a"));

        let mut handles = Vec::new();
        for i in 0..64 {
            let provider = provider.clone();
            let kid = kids[i % kids.len()];
            handles.push(tokio::spawn(async move { provider.public_key(kid).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(provider.cached_key_count().await, kids.len());
    }

    #[tokio::test]
    async fn rotate_switches_active_kid() {
        let provider = KeyProvider::new(counting_store(&["k1", "k2"]), "k1");

        provider.rotate("k2").await.unwrap();
        assert_eq!(provider.active_kid().await, "k2");
    }

    #[tokio::test]
    async fn rotate_to_unknown_kid_keeps_current() {
        let provider = KeyProvider::new(counting_store(&["k1"]), "k1");

        assert!(provider.rotate("k9").await.is_err());
        assert_eq!(provider.active_kid().await, "k1");
    }

    #[tokio::test]
    async fn malformed_pem_is_reported() {
        struct Garbage;

        #[async_trait]
        impl KeyStore for Garbage {
            async fn private_key(&self, _kid: &str) -> Result<String, KeyError> {
                Ok("not a key".to_string())
            }
            async fn public_key(&self, _kid: &str) -> Result<String, KeyError> {
                Ok("not a key".to_string())
            }
        }

        let provider = KeyProvider::new(Arc::new(Garbage), "k1");
        assert!(matches!(
            provider.public_key("k1").await,
            Err(KeyError::Malformed { .. })
        ));
        assert!(matches!(
            provider.private_key("k1").await,
            Err(KeyError::Malformed { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_times_out_as_unavailable() {
        let provider = KeyProvider::new(Arc::new(SlowStore), "k1")
            .with_lookup_timeout(Duration::from_millis(500));

        let result = provider.public_key("k1").await;
        assert!(matches!(result, Err(KeyError::Unavailable { .. })));
        assert_eq!(provider.cached_key_count().await, 0);
    }
}
