//! Cart service - Core business logic for carts and their line items.
//!
//! This service handles:
//! - Cart retrieval (plain and row-locked)
//! - Line item removal
//! - Payment session reconciliation after item changes
//! - Totals computation
//!
//! # Atomicity Guarantees
//!
//! Mutating functions expect to run inside a transaction opened by the
//! caller; they lock the cart row first so concurrent changes to the same
//! cart are serialized.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        cart::{Cart, CartDetail, CartTotals, LineItem, LineItemRow},
        payment_session::PaymentSession,
    },
    services::payment_service,
};

const CART_COLUMNS: &str = "id, email, currency_code, sales_channel_id, tax_rate_bps, \
                            idempotency_key, metadata, completed_at, created_at, updated_at, deleted_at";

/// Retrieve a cart by ID.
///
/// # Errors
///
/// - `CartNotFound`: no such cart, or the cart has been soft-deleted
pub async fn retrieve(conn: &mut PgConnection, cart_id: Uuid) -> Result<Cart, AppError> {
    let query = format!("SELECT {CART_COLUMNS} FROM carts WHERE id = $1 AND deleted_at IS NULL");

    sqlx::query_as::<_, Cart>(&query)
        .bind(cart_id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::CartNotFound)
}

/// Retrieve a cart and lock its row until the surrounding transaction ends.
pub async fn retrieve_for_update(conn: &mut PgConnection, cart_id: Uuid) -> Result<Cart, AppError> {
    let query = format!(
        "SELECT {CART_COLUMNS} FROM carts WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
    );

    sqlx::query_as::<_, Cart>(&query)
        .bind(cart_id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::CartNotFound)
}

/// Reject mutations of carts that have already been completed.
pub fn ensure_mutable(cart: &Cart) -> Result<(), AppError> {
    if cart.is_completed() {
        return Err(AppError::InvalidState(format!(
            "Cart {} has already been completed",
            cart.id
        )));
    }

    Ok(())
}

/// List a cart's line items joined with their variants, oldest first.
pub async fn list_line_items(
    conn: &mut PgConnection,
    cart_id: Uuid,
) -> Result<Vec<LineItem>, AppError> {
    let rows = sqlx::query_as::<_, LineItemRow>(
        r#"
        SELECT li.id, li.cart_id, li.variant_id, li.title, li.quantity, li.unit_price, li.created_at,
               v.title AS variant_title,
               v.sku AS variant_sku,
               v.manage_inventory AS variant_manage_inventory,
               v.allow_backorder AS variant_allow_backorder,
               v.inventory_quantity AS variant_inventory_quantity
        FROM line_items li
        JOIN product_variants v ON v.id = li.variant_id
        WHERE li.cart_id = $1
        ORDER BY li.created_at, li.id
        "#,
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Compute cart totals from its line items.
///
/// - line subtotal = unit price × quantity
/// - tax = subtotal × rate / 10 000, rounded half up
/// - total = subtotal + tax
///
/// # Errors
///
/// - `Internal`: an amount overflowed `i64`
pub fn compute_totals(items: &[LineItem], tax_rate_bps: i32) -> Result<CartTotals, AppError> {
    let overflow = || AppError::Internal("cart totals overflowed".to_string());

    let mut totals = CartTotals::default();
    for item in items {
        let quantity = i64::from(item.quantity);
        let line_subtotal = item.unit_price.checked_mul(quantity).ok_or_else(overflow)?;

        totals.item_count = totals.item_count.checked_add(quantity).ok_or_else(overflow)?;
        totals.subtotal = totals.subtotal.checked_add(line_subtotal).ok_or_else(overflow)?;
    }

    let taxed = i128::from(totals.subtotal) * i128::from(tax_rate_bps);
    totals.tax_total = i64::try_from((taxed + 5_000) / 10_000).map_err(|_| overflow())?;
    totals.total = totals.subtotal.checked_add(totals.tax_total).ok_or_else(overflow)?;

    Ok(totals)
}

/// Remove a line item from a cart.
///
/// # Process
///
/// 1. Lock the cart row
/// 2. Reject completed carts
/// 3. Delete the item, restricted to this cart
/// 4. Touch the cart's `updated_at`
///
/// # Errors
///
/// - `CartNotFound`: cart doesn't exist
/// - `InvalidState`: cart is completed
/// - `LineItemNotFound`: no such item on this cart; nothing is changed
pub async fn remove_line_item(
    conn: &mut PgConnection,
    cart_id: Uuid,
    line_item_id: Uuid,
) -> Result<(), AppError> {
    let cart = retrieve_for_update(&mut *conn, cart_id).await?;
    ensure_mutable(&cart)?;

    let deleted = sqlx::query("DELETE FROM line_items WHERE id = $1 AND cart_id = $2")
        .bind(line_item_id)
        .bind(cart_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::LineItemNotFound);
    }

    sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;

    tracing::info!(%cart_id, %line_item_id, "line item removed");

    Ok(())
}

/// Regenerate the cart's payment sessions for its current total.
///
/// Call after any line-item change, inside the same transaction.
pub async fn set_payment_sessions(
    conn: &mut PgConnection,
    cart_id: Uuid,
) -> Result<Vec<PaymentSession>, AppError> {
    let cart = retrieve(&mut *conn, cart_id).await?;
    let items = list_line_items(&mut *conn, cart_id).await?;
    let totals = compute_totals(&items, cart.tax_rate_bps)?;

    payment_service::regenerate_sessions(conn, cart_id, totals.total).await
}

/// Retrieve a cart with items, variants, payment sessions and totals.
pub async fn retrieve_with_totals(
    conn: &mut PgConnection,
    cart_id: Uuid,
) -> Result<CartDetail, AppError> {
    let cart = retrieve(&mut *conn, cart_id).await?;
    let items = list_line_items(&mut *conn, cart_id).await?;
    let payment_sessions = payment_service::list_for_cart(&mut *conn, cart_id).await?;
    let totals = compute_totals(&items, cart.tax_rate_bps)?;

    Ok(CartDetail {
        cart,
        items,
        payment_sessions,
        totals,
    })
}
