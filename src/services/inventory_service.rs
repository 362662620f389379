//! Inventory service - variant availability per sales channel.

use std::collections::HashMap;

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::product_variant::{ProductVariant, VariantAvailability},
};

#[derive(Debug, sqlx::FromRow)]
struct ChannelStock {
    variant_id: Uuid,
    available: i64,
}

/// Availability of a single variant.
///
/// - Unmanaged inventory is always purchasable and keeps its stored quantity.
/// - With a sales channel, `channel_stock` is the channel's stocked minus
///   reserved quantity (`None` means the variant has no stock there).
/// - Without a sales channel, the variant's own quantity applies.
pub fn availability_for(
    variant: &ProductVariant,
    sales_channel_id: Option<Uuid>,
    channel_stock: Option<i64>,
) -> VariantAvailability {
    if !variant.manage_inventory {
        return VariantAvailability {
            inventory_quantity: variant.inventory_quantity,
            purchasable: true,
        };
    }

    let inventory_quantity = match sales_channel_id {
        Some(_) => channel_stock.unwrap_or(0),
        None => variant.inventory_quantity,
    };

    VariantAvailability {
        inventory_quantity,
        purchasable: variant.allow_backorder || inventory_quantity > 0,
    }
}

/// Compute availability for every given variant, scoped to a sales channel.
///
/// # Returns
///
/// One entry per distinct variant ID.
pub async fn variant_availability(
    conn: &mut PgConnection,
    variants: &[ProductVariant],
    sales_channel_id: Option<Uuid>,
) -> Result<HashMap<Uuid, VariantAvailability>, AppError> {
    let managed: Vec<Uuid> = variants
        .iter()
        .filter(|v| v.manage_inventory)
        .map(|v| v.id)
        .collect();

    let mut stock: HashMap<Uuid, i64> = HashMap::new();
    if let Some(channel_id) = sales_channel_id {
        if !managed.is_empty() {
            let rows = sqlx::query_as::<_, ChannelStock>(
                r#"
                SELECT variant_id,
                       COALESCE(SUM(stocked_quantity - reserved_quantity), 0)::BIGINT AS available
                FROM inventory_levels
                WHERE sales_channel_id = $1 AND variant_id = ANY($2)
                GROUP BY variant_id
                "#,
            )
            .bind(channel_id)
            .bind(&managed)
            .fetch_all(conn)
            .await?;

            stock.extend(rows.into_iter().map(|row| (row.variant_id, row.available)));
        }
    }

    let availability = variants
        .iter()
        .map(|variant| {
            let channel_stock = stock.get(&variant.id).copied();
            (
                variant.id,
                availability_for(variant, sales_channel_id, channel_stock),
            )
        })
        .collect();

    tracing::debug!(
        variants = variants.len(),
        sales_channel_id = ?sales_channel_id,
        "variant availability computed"
    );

    Ok(availability)
}
