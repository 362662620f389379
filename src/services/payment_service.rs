//! Payment session service.
//!
//! Sessions are priced at the cart total they were created for. Once line
//! items change, every existing session is stale, so regeneration replaces
//! all of them rather than trying to patch individual sessions.

use serde_json::{Value, json};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::payment_session::{NewPaymentSession, PaymentSession},
};

/// List a cart's payment sessions, oldest first.
pub async fn list_for_cart(
    conn: &mut PgConnection,
    cart_id: Uuid,
) -> Result<Vec<PaymentSession>, AppError> {
    let sessions = sqlx::query_as::<_, PaymentSession>(
        r#"
        SELECT id, cart_id, provider_id, amount, status, is_selected, data, created_at
        FROM payment_sessions
        WHERE cart_id = $1
        ORDER BY created_at, provider_id
        "#,
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;

    Ok(sessions)
}

/// Plan the replacement of a cart's sessions for a new cart total.
///
/// Each existing session yields exactly one new session for the same
/// provider, with a fresh id and token, the new amount, and the previous
/// selection flag.
pub fn plan_regeneration(existing: &[PaymentSession], amount: i64) -> Vec<NewPaymentSession> {
    existing
        .iter()
        .map(|session| {
            let id = Uuid::new_v4();
            NewPaymentSession {
                id,
                provider_id: session.provider_id.clone(),
                amount,
                is_selected: session.is_selected,
                data: session_data(&session.provider_id, id, amount),
            }
        })
        .collect()
}

/// Replace every payment session of a cart with a freshly initiated one.
///
/// Must run inside the same transaction as the line-item change that made
/// the old sessions stale.
///
/// # Returns
///
/// The new sessions, in the order of the ones they replaced.
pub async fn regenerate_sessions(
    conn: &mut PgConnection,
    cart_id: Uuid,
    amount: i64,
) -> Result<Vec<PaymentSession>, AppError> {
    let existing = list_for_cart(&mut *conn, cart_id).await?;
    let planned = plan_regeneration(&existing, amount);

    sqlx::query("DELETE FROM payment_sessions WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;

    let mut sessions = Vec::with_capacity(planned.len());
    for new_session in planned {
        let session = sqlx::query_as::<_, PaymentSession>(
            r#"
            INSERT INTO payment_sessions (id, cart_id, provider_id, amount, status, is_selected, data)
            VALUES ($1, $2, $3, $4, 'pending', $5, $6)
            RETURNING id, cart_id, provider_id, amount, status, is_selected, data, created_at
            "#,
        )
        .bind(new_session.id)
        .bind(cart_id)
        .bind(&new_session.provider_id)
        .bind(new_session.amount)
        .bind(new_session.is_selected)
        .bind(new_session.data)
        .fetch_one(&mut *conn)
        .await?;

        sessions.push(session);
    }

    tracing::info!(
        %cart_id,
        amount,
        replaced = existing.len(),
        "payment sessions regenerated"
    );

    Ok(sessions)
}

/// Provider payload for a newly initiated session.
fn session_data(provider_id: &str, session_id: Uuid, amount: i64) -> Value {
    json!({
        "provider_id": provider_id,
        "session_id": session_id,
        "amount": amount,
        "client_token": generate_client_token(),
    })
}

/// 64 hex characters (32 random bytes)
fn generate_client_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}
