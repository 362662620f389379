//! User service - retrieval and partial updates of admin users.
//!
//! Every function takes a `&mut PgConnection` so callers decide the
//! transaction scope: pass `&mut *tx` to run inside a transaction, or a
//! pooled connection for plain reads.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::user::{User, UserUpdate},
};

const USER_COLUMNS: &str = "id, email, first_name, last_name, role, api_token_hash, metadata, \
                            created_at, updated_at, deleted_at";

/// Hash an API token the way it is stored in `users.api_token_hash`.
pub fn hash_api_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Split a metadata patch into the keys to upsert and the keys to delete.
///
/// A key whose value is the empty string is a deletion; every other key
/// overwrites the stored value.
pub fn split_metadata_patch(patch: Map<String, Value>) -> (Map<String, Value>, Vec<String>) {
    let mut upserts = Map::new();
    let mut removals = Vec::new();

    for (key, value) in patch {
        match value {
            Value::String(ref s) if s.is_empty() => removals.push(key),
            value => {
                upserts.insert(key, value);
            }
        }
    }

    (upserts, removals)
}

/// Retrieve a user by ID.
///
/// # Errors
///
/// - `UserNotFound`: no such user, or the user has been soft-deleted
/// - `Database`: query failed
pub async fn retrieve(conn: &mut PgConnection, user_id: Uuid) -> Result<User, AppError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");

    sqlx::query_as::<_, User>(&query)
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::UserNotFound)
}

/// Apply a partial update to a user.
///
/// # Process
///
/// Runs a single `UPDATE` that only touches the provided columns
/// (`COALESCE(new, old)`), so concurrent updates of disjoint fields both
/// survive under row locking. Metadata is merged inside the same statement:
/// provided keys overwrite, keys set to `""` are removed.
///
/// The API token is stored as its SHA-256 digest.
///
/// # Errors
///
/// - `UserNotFound`: no such user, or the user has been soft-deleted
/// - `InvalidState`: the API token is already assigned to another user
/// - `Database`: query failed
pub async fn update(
    conn: &mut PgConnection,
    user_id: Uuid,
    update: UserUpdate,
) -> Result<User, AppError> {
    let updated_fields = updated_field_names(&update);

    let api_token_hash = update.api_token.as_deref().map(hash_api_token);
    let (metadata_upserts, metadata_removals) = match update.metadata {
        Some(patch) => {
            let (upserts, removals) = split_metadata_patch(patch);
            (Some(Value::Object(upserts)), removals)
        }
        None => (None, Vec::new()),
    };

    let query = format!(
        r#"
        UPDATE users SET
            first_name = COALESCE($1, first_name),
            last_name = COALESCE($2, last_name),
            role = COALESCE($3, role),
            api_token_hash = COALESCE($4, api_token_hash),
            metadata = CASE
                WHEN $5::jsonb IS NULL THEN metadata
                ELSE (COALESCE(metadata, '{{}}'::jsonb) || $5::jsonb) - $6::text[]
            END,
            updated_at = NOW()
        WHERE id = $7 AND deleted_at IS NULL
        RETURNING {USER_COLUMNS}
        "#
    );

    let result = sqlx::query_as::<_, User>(&query)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.role.map(|role| role.as_str()))
        .bind(api_token_hash)
        .bind(metadata_upserts)
        .bind(metadata_removals)
        .bind(user_id)
        .fetch_optional(conn)
        .await;

    let user = match result {
        Ok(Some(user)) => user,
        Ok(None) => return Err(AppError::UserNotFound),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Err(AppError::InvalidState(
                "API token is already in use by another user".to_string(),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(%user_id, fields = ?updated_fields, "user updated");

    Ok(user)
}

fn updated_field_names(update: &UserUpdate) -> Vec<&'static str> {
    [
        ("first_name", update.first_name.is_some()),
        ("last_name", update.last_name.is_some()),
        ("role", update.role.is_some()),
        ("api_token", update.api_token.is_some()),
        ("metadata", update.metadata.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, present)| present.then_some(name))
    .collect()
}
