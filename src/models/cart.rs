//! Cart data models and API response types.
//!
//! This module defines:
//! - `Cart`: Database entity representing a cart
//! - `LineItem`: A variant entry in a cart, joined with its variant
//! - `CartTotals`: Totals derived from the line items
//! - `CartDetail`: The full cart projection used to build responses
//! - `CartResponse` / `CartEnvelope`: Response bodies returned to clients

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{
    payment_session::{PaymentSession, PaymentSessionResponse},
    product_variant::{ProductVariant, VariantAvailability, VariantResponse},
};

/// Represents a cart record from the database.
///
/// # Database Table
///
/// Maps to the `carts` table. A cart with `completed_at` set has been
/// checked out and can no longer be mutated.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Cart {
    pub id: Uuid,
    pub email: Option<String>,
    pub currency_code: String,

    /// Determines which inventory pool applies to the cart's items
    pub sales_channel_id: Option<Uuid>,

    /// Tax rate in basis points (1250 = 12.5%)
    pub tax_rate_bps: i32,

    /// Internal bookkeeping, never returned to clients
    pub idempotency_key: Option<String>,

    /// Internal bookkeeping, never returned to clients
    pub metadata: Option<Value>,

    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Cart {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Row shape of `line_items` joined with `product_variants`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LineItemRow {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub variant_id: Uuid,
    pub title: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub created_at: DateTime<Utc>,
    pub variant_title: String,
    pub variant_sku: Option<String>,
    pub variant_manage_inventory: bool,
    pub variant_allow_backorder: bool,
    pub variant_inventory_quantity: i64,
}

/// A line item together with the variant it references.
#[derive(Debug, Clone)]
pub struct LineItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub title: String,
    pub quantity: i32,

    /// Price of one unit in minor units
    pub unit_price: i64,

    pub created_at: DateTime<Utc>,
    pub variant: ProductVariant,

    /// Set by the availability pass after the cart has been loaded
    pub availability: Option<VariantAvailability>,
}

impl From<LineItemRow> for LineItem {
    fn from(row: LineItemRow) -> Self {
        Self {
            id: row.id,
            cart_id: row.cart_id,
            title: row.title,
            quantity: row.quantity,
            unit_price: row.unit_price,
            created_at: row.created_at,
            variant: ProductVariant {
                id: row.variant_id,
                title: row.variant_title,
                sku: row.variant_sku,
                manage_inventory: row.variant_manage_inventory,
                allow_backorder: row.variant_allow_backorder,
                inventory_quantity: row.variant_inventory_quantity,
            },
            availability: None,
        }
    }
}

/// Totals of a cart, all in minor units of the cart currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub item_count: i64,
    pub subtotal: i64,
    pub tax_total: i64,
    pub total: i64,
}

/// A cart with every relation the store responses need.
#[derive(Debug, Clone)]
pub struct CartDetail {
    pub cart: Cart,
    pub items: Vec<LineItem>,
    pub payment_sessions: Vec<PaymentSession>,
    pub totals: CartTotals,
}

impl CartDetail {
    /// Variants referenced by the cart, each listed once, in item order.
    pub fn variants(&self) -> Vec<ProductVariant> {
        let mut seen = Vec::with_capacity(self.items.len());
        let mut variants = Vec::with_capacity(self.items.len());

        for item in &self.items {
            if !seen.contains(&item.variant.id) {
                seen.push(item.variant.id);
                variants.push(item.variant.clone());
            }
        }

        variants
    }

    pub fn apply_availability(&mut self, availability: &HashMap<Uuid, VariantAvailability>) {
        for item in &mut self.items {
            item.availability = availability.get(&item.variant.id).copied();
        }
    }
}

/// Line item as returned to API clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItemResponse {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub title: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub subtotal: i64,
    pub variant_id: Uuid,
    pub variant: VariantResponse,
    pub created_at: DateTime<Utc>,
}

impl From<LineItem> for LineItemResponse {
    fn from(item: LineItem) -> Self {
        let variant_id = item.variant.id;
        let mut variant = VariantResponse::from(item.variant);
        if let Some(availability) = item.availability {
            variant.apply_availability(availability);
        }

        Self {
            id: item.id,
            cart_id: item.cart_id,
            title: item.title,
            quantity: item.quantity,
            unit_price: item.unit_price,
            // Totals are computed with checked arithmetic before a response is built
            subtotal: item.unit_price.saturating_mul(i64::from(item.quantity)),
            variant_id,
            variant,
            created_at: item.created_at,
        }
    }
}

/// Cart as returned to API clients.
///
/// Internal columns (`idempotency_key`, `metadata`, `deleted_at`) are left out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartResponse {
    pub id: Uuid,
    pub email: Option<String>,
    pub currency_code: String,
    pub sales_channel_id: Option<Uuid>,
    pub tax_rate_bps: i32,
    pub items: Vec<LineItemResponse>,
    pub payment_sessions: Vec<PaymentSessionResponse>,
    #[serde(flatten)]
    pub totals: CartTotals,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CartDetail> for CartResponse {
    fn from(detail: CartDetail) -> Self {
        let CartDetail {
            cart,
            items,
            payment_sessions,
            totals,
        } = detail;

        Self {
            id: cart.id,
            email: cart.email,
            currency_code: cart.currency_code,
            sales_channel_id: cart.sales_channel_id,
            tax_rate_bps: cart.tax_rate_bps,
            items: items.into_iter().map(Into::into).collect(),
            payment_sessions: payment_sessions.into_iter().map(Into::into).collect(),
            totals,
            completed_at: cart.completed_at,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}

/// `{ "cart": { ... } }`
#[derive(Debug, Serialize, Deserialize)]
pub struct CartEnvelope {
    pub cart: CartResponse,
}

impl From<CartDetail> for CartEnvelope {
    fn from(detail: CartDetail) -> Self {
        Self {
            cart: detail.into(),
        }
    }
}
