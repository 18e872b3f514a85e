// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH_ISSUER` | Issuer written into and required of tokens | `service project` |
//! | `AUTH_ACTIVE_KID` | Key id used to sign new tokens | Required |
//! | `AUTH_KEYS_DIR` | Directory of `<kid>.pem` / `<kid>.pub.pem` pairs | `keys` |
//! | `AUTH_TOKEN_TTL_SECS` | Lifetime of issued tokens | `3600` |
//! | `AUTH_LOOKUP_TIMEOUT_MS` | Bound on key and resource lookups | `1000` |
//! | `VAULT_ADDRESS` | Vault server; replaces the key directory when set | Optional |
//! | `VAULT_TOKEN` | Vault token | Required with `VAULT_ADDRESS` |
//! | `VAULT_MOUNT_PATH` | KV v2 mount | `secret` |
//! | `VAULT_PRIVATE_PATH` | Secret holding private keys by kid | `auth/private` |
//! | `VAULT_PUBLIC_PATH` | Secret holding public keys by kid | `auth/public` |
//! | `SEED_ADMIN_ID` | Seed one enabled admin user with this id | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::VaultConfig;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const ISSUER_ENV: &str = "AUTH_ISSUER";
pub const ACTIVE_KID_ENV: &str = "AUTH_ACTIVE_KID";
pub const KEYS_DIR_ENV: &str = "AUTH_KEYS_DIR";
pub const TOKEN_TTL_ENV: &str = "AUTH_TOKEN_TTL_SECS";
pub const LOOKUP_TIMEOUT_ENV: &str = "AUTH_LOOKUP_TIMEOUT_MS";
pub const VAULT_ADDRESS_ENV: &str = "VAULT_ADDRESS";
pub const VAULT_TOKEN_ENV: &str = "VAULT_TOKEN";
pub const VAULT_MOUNT_PATH_ENV: &str = "VAULT_MOUNT_PATH";
pub const VAULT_PRIVATE_PATH_ENV: &str = "VAULT_PRIVATE_PATH";
pub const VAULT_PUBLIC_PATH_ENV: &str = "VAULT_PUBLIC_PATH";
pub const SEED_ADMIN_ENV: &str = "SEED_ADMIN_ID";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_ISSUER: &str = "service project";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Where signing keys come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Directory(PathBuf),
    Vault(VaultConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub issuer: String,
    pub active_kid: String,
    pub key_source: KeySource,
    pub token_ttl: TimeDelta,
    pub lookup_timeout: Duration,
    pub seed_admin: Option<Uuid>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&get, PORT_ENV, 8080)?;
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    name: HOST_ENV,
                    value: host.clone(),
                    reason: e.to_string(),
                })?;

        let active_kid = get(ACTIVE_KID_ENV).ok_or(ConfigError::Missing(ACTIVE_KID_ENV))?;

        let key_source = match get(VAULT_ADDRESS_ENV) {
            Some(address) => KeySource::Vault(VaultConfig {
                address,
                token: get(VAULT_TOKEN_ENV).ok_or(ConfigError::Missing(VAULT_TOKEN_ENV))?,
                mount_path: get(VAULT_MOUNT_PATH_ENV).unwrap_or_else(|| "secret".to_string()),
                private_path: get(VAULT_PRIVATE_PATH_ENV)
                    .unwrap_or_else(|| "auth/private".to_string()),
                public_path: get(VAULT_PUBLIC_PATH_ENV)
                    .unwrap_or_else(|| "auth/public".to_string()),
            }),
            None => KeySource::Directory(PathBuf::from(
                get(KEYS_DIR_ENV).unwrap_or_else(|| "keys".to_string()),
            )),
        };

        let ttl_secs: i64 = parse_or(&get, TOKEN_TTL_ENV, 3600)?;
        let token_ttl = TimeDelta::try_seconds(ttl_secs)
            .filter(|ttl| *ttl > TimeDelta::zero())
            .ok_or_else(|| ConfigError::Invalid {
                name: TOKEN_TTL_ENV,
                value: ttl_secs.to_string(),
                reason: "must be a positive number of seconds".to_string(),
            })?;

        let timeout_ms: u64 = parse_or(&get, LOOKUP_TIMEOUT_ENV, 1000)?;

        let seed_admin = get(SEED_ADMIN_ENV)
            .map(|raw| {
                Uuid::parse_str(&raw).map_err(|e| ConfigError::Invalid {
                    name: SEED_ADMIN_ENV,
                    value: raw.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            bind_addr,
            issuer: get(ISSUER_ENV).unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            active_kid,
            key_source,
            token_ttl,
            lookup_timeout: Duration::from_millis(timeout_ms),
            seed_admin,
            log_format,
        })
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
