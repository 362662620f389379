//! Payment session models.
//!
//! A payment session is a provider-specific, in-progress payment attempt
//! priced at the cart total it was created for. Sessions go stale as soon
//! as the cart's line items change, which is why the cart service
//! regenerates them after every removal.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle status of a payment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSessionStatus {
    Pending,
    Authorized,
    RequiresMore,
    Error,
    Canceled,
}

impl FromStr for PaymentSessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentSessionStatus::Pending),
            "authorized" => Ok(PaymentSessionStatus::Authorized),
            "requires_more" => Ok(PaymentSessionStatus::RequiresMore),
            "error" => Ok(PaymentSessionStatus::Error),
            "canceled" => Ok(PaymentSessionStatus::Canceled),
            other => Err(format!("unknown payment session status `{other}`")),
        }
    }
}

impl TryFrom<String> for PaymentSessionStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

/// Represents a payment session record from the database.
///
/// # Database Table
///
/// Maps to the `payment_sessions` table; at most one session per
/// `(cart_id, provider_id)`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentSession {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub provider_id: String,

    /// Cart total (minor units) the session was created for
    pub amount: i64,

    #[sqlx(try_from = "String")]
    pub status: PaymentSessionStatus,

    pub is_selected: bool,

    /// Provider payload handed to the storefront (client token etc.)
    pub data: Value,

    pub created_at: DateTime<Utc>,
}

/// A session about to be inserted in place of a stale one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentSession {
    pub id: Uuid,
    pub provider_id: String,
    pub amount: i64,
    pub is_selected: bool,
    pub data: Value,
}

/// Payment session as returned inside a cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentSessionResponse {
    pub id: Uuid,
    pub provider_id: String,
    pub amount: i64,
    pub status: PaymentSessionStatus,
    pub is_selected: bool,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentSession> for PaymentSessionResponse {
    fn from(session: PaymentSession) -> Self {
        Self {
            id: session.id,
            provider_id: session.provider_id,
            amount: session.amount,
            status: session.status,
            is_selected: session.is_selected,
            data: session.data,
            created_at: session.created_at,
        }
    }
}
