//! Commerce API Server
//!
//! REST API for an e-commerce backend: admins update user accounts, and
//! storefronts manage carts whose payment sessions, totals and inventory
//! availability are kept consistent with their line items.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries, explicit transactions)
//! - **Authentication**: Admin API tokens, stored as SHA-256 digests
//! - **Validation**: `validator` derive behind the `ValidatedJson` extractor
//! - **Format**: JSON requests/responses
//!
//! # Request Flow
//!
//! validate → transact → enrich → respond. Bodies are validated before a
//! connection is touched; mutations run in one transaction that rolls back
//! on any error; responses are enriched after commit.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    Router,
    http::Method,
    middleware as axum_middleware,
    routing::{delete, get},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::db::DbPool;

/// Admin routes, without the authentication layer.
pub fn admin_routes() -> Router<DbPool> {
    Router::new().route(
        "/admin/users/{id}",
        get(handlers::users::get_user).post(handlers::users::update_user),
    )
}

/// Public storefront routes; the cart ID acts as the capability.
pub fn store_routes() -> Router<DbPool> {
    Router::new()
        .route("/store/carts/{id}", get(handlers::carts::get_cart))
        .route(
            "/store/carts/{id}/line-items/{line_id}",
            delete(handlers::carts::delete_line_item),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::DELETE])
                .allow_headers(Any),
        )
}

/// Build the complete application router.
pub fn app(pool: DbPool) -> Router {
    let authenticated_routes = admin_routes().route_layer(axum_middleware::from_fn_with_state(
        pool.clone(),
        middleware::auth::auth_middleware,
    ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(authenticated_routes)
        .merge(store_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(pool)
}
