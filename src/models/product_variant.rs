//! Product variant model and its availability projection.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchasable variant of a product, as referenced by line items.
///
/// `inventory_quantity` on the row is the fallback stock figure used when a
/// cart has no sales channel. Per-channel stock lives in `inventory_levels`.
#[derive(Debug, Clone)]
pub struct ProductVariant {
    pub id: Uuid,
    pub title: String,
    pub sku: Option<String>,
    pub manage_inventory: bool,
    pub allow_backorder: bool,
    pub inventory_quantity: i64,
}

/// Stock figures computed for a variant in the context of one sales channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAvailability {
    pub inventory_quantity: i64,
    pub purchasable: bool,
}

/// Variant as embedded in a cart line item response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantResponse {
    pub id: Uuid,
    pub title: String,
    pub sku: Option<String>,
    pub manage_inventory: bool,
    pub allow_backorder: bool,
    pub inventory_quantity: i64,

    /// Filled in by the availability pass; absent until then
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchasable: Option<bool>,
}

impl From<ProductVariant> for VariantResponse {
    fn from(variant: ProductVariant) -> Self {
        Self {
            id: variant.id,
            title: variant.title,
            sku: variant.sku,
            manage_inventory: variant.manage_inventory,
            allow_backorder: variant.allow_backorder,
            inventory_quantity: variant.inventory_quantity,
            purchasable: None,
        }
    }
}

impl VariantResponse {
    pub fn apply_availability(&mut self, availability: VariantAvailability) {
        self.inventory_quantity = availability.inventory_quantity;
        self.purchasable = Some(availability.purchasable);
    }
}
