// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Home endpoints.

use axum::{extract::State, http::StatusCode, Json};

use crate::auth::{Identity, Loaded};
use crate::error::ApiError;
use crate::models::Home;
use crate::state::AppState;

/// `GET /v1/homes`: the caller's own homes.
pub async fn list_homes(
    State(state): State<AppState>,
    Identity(claims): Identity,
) -> Json<Vec<Home>> {
    Json(state.store.read().await.list_homes(claims.subject))
}

/// `GET /v1/homes/{home_id}`
pub async fn get_home(Loaded(home): Loaded<Home>) -> Json<Home> {
    Json(home)
}

/// `DELETE /v1/homes/{home_id}`
pub async fn delete_home(
    State(state): State<AppState>,
    Loaded(home): Loaded<Home>,
) -> Result<StatusCode, ApiError> {
    state.store.write().await.delete_home(&home.id)?;
    tracing::info!(home_id = %home.id, "Home deleted");
    Ok(StatusCode::NO_CONTENT)
}
