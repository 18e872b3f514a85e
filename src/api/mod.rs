// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Route table.
//!
//! Every `/v1` route runs `authenticate` first. Collection routes then run
//! `authorize` with a fixed rule; item routes run the ownership guard for
//! their resource kind.

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::{
    auth::{
        authorize_resource,
        middleware::{authenticate, authorize},
        AuthorizationRule, OwnedResource, OwnershipGuard, ResourceLookup,
    },
    models::{Home, Product, User},
    state::AppState,
    store::InMemoryStore,
};

pub mod health;
pub mod homes;
pub mod products;
pub mod users;

fn guard<R>(state: &AppState, rule: AuthorizationRule) -> OwnershipGuard<R>
where
    R: OwnedResource,
    RwLock<InMemoryStore>: ResourceLookup<R>,
{
    OwnershipGuard::new(state.store.clone(), rule).with_timeout(state.lookup_timeout)
}

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/users",
            get(users::list_users)
                .layer(from_fn_with_state(AuthorizationRule::AdminOnly, authorize)),
        )
        .route(
            "/users/{user_id}",
            get(users::get_user).layer(from_fn_with_state(
                guard::<User>(&state, AuthorizationRule::AdminOrSubject),
                authorize_resource::<User>,
            )),
        )
        .route(
            "/products",
            get(products::list_products)
                .layer(from_fn_with_state(AuthorizationRule::Any, authorize)),
        )
        .route(
            "/products/{product_id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product)
                .layer(from_fn_with_state(
                    guard::<Product>(&state, AuthorizationRule::AdminOrSubject),
                    authorize_resource::<Product>,
                )),
        )
        .route(
            "/homes",
            get(homes::list_homes)
                .layer(from_fn_with_state(AuthorizationRule::UserOnly, authorize)),
        )
        .route(
            "/homes/{home_id}",
            get(homes::get_home)
                .delete(homes::delete_home)
                .layer(from_fn_with_state(
                    guard::<Home>(&state, AuthorizationRule::AdminOrSubject),
                    authorize_resource::<Home>,
                )),
        )
        .layer(from_fn_with_state(
            state.authenticator.clone(),
            authenticate,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::health))
        .nest("/v1", v1_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
