// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mint a bearer token for a user.
//!
//! Reads the same environment as the server (`AUTH_KEYS_DIR` or the Vault
//! variables, `AUTH_ISSUER`, `AUTH_TOKEN_TTL_SECS`) and prints the token on
//! stdout.
//!
//! ```text
//! gentoken 5cf37266-3473-4006-984f-9325122678b7 --kid k1 --roles ADMIN,USER
//! ```

use std::process::ExitCode;

use chrono::{TimeDelta, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use resource_auth_server::{
    auth::{Claims, Role, TokenError},
    config::{Config, ConfigError, ACTIVE_KID_ENV},
    state::{self, StartupError},
};

/// Longest lifetime accepted on the command line (ten years).
const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Parser)]
#[command(name = "gentoken")]
#[command(about = "Mint a signed bearer token for a user")]
struct Args {
    /// Subject of the token
    user_id: Uuid,

    /// Key id to sign with
    #[arg(long, env = ACTIVE_KID_ENV)]
    kid: String,

    /// Comma-separated roles
    #[arg(long, value_delimiter = ',', value_parser = parse_role, default_value = "USER")]
    roles: Vec<Role>,

    /// Lifetime in seconds, overriding AUTH_TOKEN_TTL_SECS
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..=MAX_TTL_SECS))]
    ttl_secs: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
enum GenTokenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::parse(raw).ok_or_else(|| format!("unknown role {raw:?}, expected ADMIN or USER"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match mint(&args).await {
        Ok(token) => {
            println!("{token}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Could not mint token");
            ExitCode::FAILURE
        }
    }
}

async fn mint(args: &Args) -> Result<String, GenTokenError> {
    let config = Config::from_lookup(|name| {
        if name == ACTIVE_KID_ENV {
            Some(args.kid.clone())
        } else {
            std::env::var(name).ok()
        }
    })?;

    let ttl = args
        .ttl_secs
        .map(TimeDelta::seconds)
        .unwrap_or(config.token_ttl);

    let codec = state::token_codec(&config).await?;
    let claims = Claims::new(
        codec.issuer(),
        args.user_id,
        args.roles.iter().copied(),
        Utc::now(),
        ttl,
    )?;

    Ok(codec.issue(&claims, &args.kid).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = "5cf37266-3473-4006-984f-9325122678b7";

    #[test]
    fn roles_default_to_user_and_parse_case_insensitively() {
        let args = Args::try_parse_from(["gentoken", USER, "--kid", "k1"]).unwrap();
        assert_eq!(args.roles, vec![Role::User]);

        let args =
            Args::try_parse_from(["gentoken", USER, "--kid", "k1", "--roles", "admin,USER"])
                .unwrap();
        assert_eq!(args.roles, vec![Role::Admin, Role::User]);
    }

    #[test]
    fn ttl_must_be_positive_and_bounded() {
        for ttl in ["0", "-60", "9223372036854775807"] {
            let result =
                Args::try_parse_from(["gentoken", USER, "--kid", "k1", "--ttl-secs", ttl]);
            assert!(result.is_err(), "ttl {ttl} accepted");
        }

        let args =
            Args::try_parse_from(["gentoken", USER, "--kid", "k1", "--ttl-secs", "600"]).unwrap();
        assert_eq!(args.ttl_secs, Some(600));
    }
}
