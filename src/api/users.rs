// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{extract::State, Json};

use crate::auth::Loaded;
use crate::models::User;
use crate::state::AppState;

/// `GET /v1/users` (admins only).
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.store.read().await.list_users())
}

/// `GET /v1/users/{user_id}` (admin or the user themselves).
pub async fn get_user(Loaded(user): Loaded<User>) -> Json<User> {
    Json(user)
}
