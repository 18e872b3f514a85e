// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Product endpoints.
//!
//! Item routes sit behind the product ownership guard, so handlers receive
//! an already authorized [`Loaded<Product>`].

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

use crate::auth::{Identity, Loaded};
use crate::error::ApiError;
use crate::models::{Product, UpdateProductRequest};
use crate::state::AppState;

/// `GET /v1/products`
///
/// Admins see every product, everyone else sees their own.
pub async fn list_products(
    State(state): State<AppState>,
    Identity(claims): Identity,
) -> Json<Vec<Product>> {
    let owner = (!claims.is_admin()).then_some(claims.subject);
    Json(state.store.read().await.list_products(owner))
}

/// `GET /v1/products/{product_id}`
pub async fn get_product(Loaded(product): Loaded<Product>) -> Json<Product> {
    Json(product)
}

/// `PUT /v1/products/{product_id}`
pub async fn update_product(
    State(state): State<AppState>,
    Identity(claims): Identity,
    Loaded(product): Loaded<Product>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let updated = state
        .store
        .write()
        .await
        .update_product(&product.id, request, Utc::now())?;

    tracing::info!(product_id = %product.id, by = %claims.subject, "Product updated");
    Ok(Json(updated))
}

/// `DELETE /v1/products/{product_id}`
pub async fn delete_product(
    State(state): State<AppState>,
    Identity(claims): Identity,
    Loaded(product): Loaded<Product>,
) -> Result<StatusCode, ApiError> {
    state.store.write().await.delete_product(&product.id)?;

    tracing::info!(product_id = %product.id, by = %claims.subject, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
