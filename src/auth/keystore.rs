// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory key store, optionally loaded from a directory of PEM files.
//!
//! ## Directory Layout
//!
//! ```text
//! keys/
//!   54bb2165-71e1-41a6-af3e-7da4a0e1e2c1.pem      # private key, file stem is the kid
//!   54bb2165-71e1-41a6-af3e-7da4a0e1e2c1.pub.pem  # matching public key
//! ```

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use async_trait::async_trait;

use super::{error::KeyError, keys::KeyStore};

/// PEM files larger than this are rejected.
const MAX_PEM_BYTES: u64 = 1024 * 1024;

const PRIVATE_TAGS: &[&str] = &["RSA PRIVATE KEY", "PRIVATE KEY"];
const PUBLIC_TAGS: &[&str] = &["PUBLIC KEY", "RSA PUBLIC KEY"];

#[derive(Clone)]
struct KeyPair {
    private_pem: String,
    public_pem: String,
}

/// Key store holding PEM pairs in memory.
#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    keys: HashMap<String, KeyPair>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key pair under `kid`, replacing any previous pair.
    ///
    /// # Errors
    /// Returns `KeyError::Malformed` if either PEM block does not parse or
    /// carries the wrong tag.
    pub fn insert(
        &mut self,
        kid: impl Into<String>,
        private_pem: &str,
        public_pem: &str,
    ) -> Result<(), KeyError> {
        let kid = kid.into();
        check_pem(&kid, private_pem, PRIVATE_TAGS)?;
        check_pem(&kid, public_pem, PUBLIC_TAGS)?;

        self.keys.insert(
            kid,
            KeyPair {
                private_pem: private_pem.to_string(),
                public_pem: public_pem.to_string(),
            },
        );
        Ok(())
    }

    /// Load every `<kid>.pem` in `dir` together with its `<kid>.pub.pem`.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, KeyError> {
        let dir = dir.as_ref();
        let mut store = Self::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.ends_with(".pub.pem") {
                continue;
            }
            let Some(kid) = name.strip_suffix(".pem") else {
                continue;
            };

            let private_pem = read_limited(&path)?;
            let public_path = dir.join(format!("{kid}.pub.pem"));
            if !public_path.is_file() {
                return Err(KeyError::Malformed {
                    kid: kid.to_string(),
                    reason: format!("missing public key file {}", public_path.display()),
                });
            }
            let public_pem = read_limited(&public_path)?;

            store.insert(kid, &private_pem, &public_pem)?;
        }

        tracing::info!(dir = %dir.display(), keys = store.len(), "Loaded signing keys");
        Ok(store)
    }

    /// Number of key pairs held.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn pair(&self, kid: &str) -> Result<&KeyPair, KeyError> {
        self.keys
            .get(kid)
            .ok_or_else(|| KeyError::NotFound(kid.to_string()))
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn private_key(&self, kid: &str) -> Result<String, KeyError> {
        Ok(self.pair(kid)?.private_pem.clone())
    }

    async fn public_key(&self, kid: &str) -> Result<String, KeyError> {
        Ok(self.pair(kid)?.public_pem.clone())
    }
}

fn check_pem(kid: &str, text: &str, tags: &[&str]) -> Result<(), KeyError> {
    let block = pem::parse(text).map_err(|e| KeyError::Malformed {
        kid: kid.to_string(),
        reason: e.to_string(),
    })?;

    if tags.contains(&block.tag()) {
        Ok(())
    } else {
        Err(KeyError::Malformed {
            kid: kid.to_string(),
            reason: format!("unexpected PEM block {:?}", block.tag()),
        })
    }
}

fn read_limited(path: &Path) -> Result<String, KeyError> {
    let file = std::fs::File::open(path)?;
    let mut text = String::new();
    file.take(MAX_PEM_BYTES + 1).read_to_string(&mut text)?;

    if text.len() as u64 > MAX_PEM_BYTES {
        return Err(KeyError::Malformed {
            kid: path.display().to_string(),
            reason: "PEM file exceeds 1 MiB".to_string(),
        });
    }
    Ok(text)
}
