//! Store cart HTTP handlers.
//!
//! This module implements the cart endpoints:
//! - GET /store/carts/{id} - Get a cart with totals and availability
//! - DELETE /store/carts/{id}/line-items/{line_id} - Remove a line item

use axum::{Json, extract::State};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    extract::ValidatedPath,
    models::cart::CartEnvelope,
    services::{cart_service, inventory_service, payment_service},
};

/// Get a cart by ID.
///
/// # Response
///
/// - **Success (200 OK)**: `{ "cart": { ... } }` with totals and variant availability
/// - **Error (404)**: Cart not found
pub async fn get_cart(
    State(pool): State<DbPool>,
    ValidatedPath(cart_id): ValidatedPath<Uuid>,
) -> Result<Json<CartEnvelope>, AppError> {
    let envelope = load_cart(&pool, cart_id).await?;

    Ok(Json(envelope))
}

/// Delete a line item from a cart.
///
/// # Endpoint
///
/// `DELETE /store/carts/{id}/line-items/{line_id}`
///
/// # Process
///
/// 1. In one transaction: remove the item, then regenerate the cart's
///    payment sessions if it has any
/// 2. After commit: reload the cart with totals and compute variant
///    availability for its sales channel
///
/// Step 2 runs outside the transaction. If it fails the caller gets an
/// error even though the removal is already committed.
///
/// # Response
///
/// - **Success (200 OK)**: `{ "cart": { ... } }` without the removed item
/// - **Error (400)**: Malformed cart or line item ID
/// - **Error (404)**: Cart or line item not found (nothing is changed)
/// - **Error (409)**: Cart already completed
pub async fn delete_line_item(
    State(pool): State<DbPool>,
    ValidatedPath((cart_id, line_item_id)): ValidatedPath<(Uuid, Uuid)>,
) -> Result<Json<CartEnvelope>, AppError> {
    let mut tx = pool.begin().await?;

    cart_service::remove_line_item(&mut tx, cart_id, line_item_id).await?;

    // Sessions priced for the old total must not survive the change
    let sessions = payment_service::list_for_cart(&mut tx, cart_id).await?;
    if !sessions.is_empty() {
        cart_service::set_payment_sessions(&mut tx, cart_id).await?;
    }

    tx.commit().await?;

    let envelope = load_cart(&pool, cart_id).await?;

    Ok(Json(envelope))
}

/// Full store projection of a cart: totals plus availability of every
/// remaining variant under the cart's sales channel.
async fn load_cart(pool: &DbPool, cart_id: Uuid) -> Result<CartEnvelope, AppError> {
    let mut conn = pool.acquire().await?;

    let mut detail = cart_service::retrieve_with_totals(&mut conn, cart_id).await?;
    let availability = inventory_service::variant_availability(
        &mut conn,
        &detail.variants(),
        detail.cart.sales_channel_id,
    )
    .await?;
    detail.apply_availability(&availability);

    Ok(detail.into())
}
