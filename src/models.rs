// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Resources served by the demo API. Each one names its owning user through
//! [`OwnedResource`], which is all the ownership middleware needs to know
//! about it.
//!
//! | Resource | Path parameter | Owner |
//! |----------|----------------|-------|
//! | [`User`] | `user_id` | itself |
//! | [`Product`] | `product_id` | `user_id` |
//! | [`Home`] | `home_id` | `user_id` |

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{OwnedResource, Role};

// =============================================================================
// Users
// =============================================================================

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: BTreeSet<Role>,
    /// Disabled users fail authentication even with a valid token.
    pub enabled: bool,
    pub date_created: DateTime<Utc>,
}

impl OwnedResource for User {
    const KIND: &'static str = "user";
    const PATH_PARAM: &'static str = "user_id";
    type Id = Uuid;

    fn parse_id(raw: &str) -> Option<Uuid> {
        Uuid::parse_str(raw).ok()
    }

    fn owner_id(&self) -> Uuid {
        self.id
    }
}

// =============================================================================
// Products
// =============================================================================

/// A product listed by a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    pub name: String,
    pub cost: f64,
    pub quantity: u32,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

/// Partial update for a product. Absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub cost: Option<f64>,
    pub quantity: Option<u32>,
}

impl Product {
    /// Apply `request` and bump `date_updated`.
    pub fn apply(&mut self, request: UpdateProductRequest, now: DateTime<Utc>) {
        if let Some(name) = request.name {
            self.name = name;
        }
        if let Some(cost) = request.cost {
            self.cost = cost;
        }
        if let Some(quantity) = request.quantity {
            self.quantity = quantity;
        }
        self.date_updated = now;
    }
}

impl OwnedResource for Product {
    const KIND: &'static str = "product";
    const PATH_PARAM: &'static str = "product_id";
    type Id = Uuid;

    fn parse_id(raw: &str) -> Option<Uuid> {
        Uuid::parse_str(raw).ok()
    }

    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

// =============================================================================
// Homes
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Home {
    pub id: Uuid,
    pub user_id: Uuid,
    pub home_type: String,
    pub address: String,
    pub date_created: DateTime<Utc>,
}

impl OwnedResource for Home {
    const KIND: &'static str = "home";
    const PATH_PARAM: &'static str = "home_id";
    type Id = Uuid;

    fn parse_id(raw: &str) -> Option<Uuid> {
        Uuid::parse_str(raw).ok()
    }

    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}
