// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Resource Auth Server - bearer token authentication and ownership checks
//!
//! This crate signs and verifies RS256 bearer tokens with rotating keys and
//! decides, per request, whether the caller may act on the targeted resource.
//!
//! ## Modules
//!
//! - `auth` - Token codec, key provider, rules and ownership middleware
//! - `api` - HTTP routes over an in-memory demo store (Axum)
//! - `config` - Environment configuration
//! - `error` - Translation of failures into HTTP responses

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
