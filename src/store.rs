// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory store backing the demo API.
//!
//! The auth subsystem sees it only through [`ResourceLookup`] and
//! [`ActiveUserCheck`], implemented on the shared `RwLock<InMemoryStore>`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{ActiveUserCheck, LookupError, ResourceLookup, Role};
use crate::error::ApiError;
use crate::models::{Home, Product, UpdateProductRequest, User};

pub type SharedStore = Arc<RwLock<InMemoryStore>>;

#[derive(Default)]
pub struct InMemoryStore {
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    homes: HashMap<Uuid, Home>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    /// Insert or replace the user with id `id`.
    pub fn insert_user(
        &mut self,
        id: Uuid,
        name: impl Into<String>,
        email: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> User {
        let user = User {
            id,
            name: name.into(),
            email: email.into(),
            roles: roles.into_iter().collect::<BTreeSet<_>>(),
            enabled: true,
            date_created: Utc::now(),
        };
        self.users.insert(id, user.clone());
        user
    }

    pub fn set_user_enabled(&mut self, id: Uuid, enabled: bool) -> Result<(), ApiError> {
        let user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found("user not found"))?;
        user.enabled = enabled;
        Ok(())
    }

    pub fn user(&self, id: &Uuid) -> Option<&User> {
        self.users.get(id)
    }

    pub fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by_key(|user| user.date_created);
        users
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    pub fn insert_product(
        &mut self,
        user_id: Uuid,
        name: impl Into<String>,
        cost: f64,
        quantity: u32,
    ) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            cost,
            quantity,
            date_created: now,
            date_updated: now,
        };
        self.products.insert(product.id, product.clone());
        product
    }

    pub fn product(&self, id: &Uuid) -> Option<&Product> {
        self.products.get(id)
    }

    /// Products owned by `owner`, or every product when `owner` is `None`.
    pub fn list_products(&self, owner: Option<Uuid>) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .values()
            .filter(|product| owner.is_none_or(|owner| product.user_id == owner))
            .cloned()
            .collect();
        products.sort_by_key(|product| product.date_created);
        products
    }

    pub fn update_product(
        &mut self,
        id: &Uuid,
        request: UpdateProductRequest,
        now: DateTime<Utc>,
    ) -> Result<Product, ApiError> {
        let product = self
            .products
            .get_mut(id)
            .ok_or_else(|| ApiError::not_found("product not found"))?;
        product.apply(request, now);
        Ok(product.clone())
    }

    pub fn delete_product(&mut self, id: &Uuid) -> Result<(), ApiError> {
        if self.products.remove(id).is_some() {
            Ok(())
        } else {
            Err(ApiError::not_found("product not found"))
        }
    }

    // -------------------------------------------------------------------------
    // Homes
    // -------------------------------------------------------------------------

    pub fn insert_home(
        &mut self,
        user_id: Uuid,
        home_type: impl Into<String>,
        address: impl Into<String>,
    ) -> Home {
        let home = Home {
            id: Uuid::new_v4(),
            user_id,
            home_type: home_type.into(),
            address: address.into(),
            date_created: Utc::now(),
        };
        self.homes.insert(home.id, home.clone());
        home
    }

    pub fn home(&self, id: &Uuid) -> Option<&Home> {
        self.homes.get(id)
    }

    pub fn list_homes(&self, owner: Uuid) -> Vec<Home> {
        let mut homes: Vec<Home> = self
            .homes
            .values()
            .filter(|home| home.user_id == owner)
            .cloned()
            .collect();
        homes.sort_by_key(|home| home.date_created);
        homes
    }

    pub fn delete_home(&mut self, id: &Uuid) -> Result<(), ApiError> {
        if self.homes.remove(id).is_some() {
            Ok(())
        } else {
            Err(ApiError::not_found("home not found"))
        }
    }
}

#[async_trait]
impl ResourceLookup<User> for RwLock<InMemoryStore> {
    async fn lookup_by_id(&self, id: &Uuid) -> Result<User, LookupError> {
        self.read().await.user(id).cloned().ok_or(LookupError::NotFound)
    }
}

#[async_trait]
impl ResourceLookup<Product> for RwLock<InMemoryStore> {
    async fn lookup_by_id(&self, id: &Uuid) -> Result<Product, LookupError> {
        self.read()
            .await
            .product(id)
            .cloned()
            .ok_or(LookupError::NotFound)
    }
}

#[async_trait]
impl ResourceLookup<Home> for RwLock<InMemoryStore> {
    async fn lookup_by_id(&self, id: &Uuid) -> Result<Home, LookupError> {
        self.read().await.home(id).cloned().ok_or(LookupError::NotFound)
    }
}

#[async_trait]
impl ActiveUserCheck for RwLock<InMemoryStore> {
    async fn is_active(&self, user_id: Uuid) -> Result<bool, LookupError> {
        self.read()
            .await
            .user(&user_id)
            .map(|user| user.enabled)
            .ok_or(LookupError::NotFound)
    }
}
