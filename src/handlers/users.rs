//! Admin user HTTP handlers.
//!
//! This module implements the admin user endpoints:
//! - GET /admin/users/{id} - Get a user
//! - POST /admin/users/{id} - Update a user's details

use axum::{
    Extension, Json,
    extract::State,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    extract::{ValidatedJson, ValidatedPath},
    middleware::auth::AuthContext,
    models::user::{UpdateUserRequest, UserEnvelope, UserUpdate},
    services::user_service,
};

/// Get an admin user by ID.
///
/// # Response
///
/// - **Success (200 OK)**: `{ "user": { ... } }`
/// - **Error (401)**: Invalid API token
/// - **Error (404)**: User not found
pub async fn get_user(
    State(pool): State<DbPool>,
    ValidatedPath(user_id): ValidatedPath<Uuid>,
) -> Result<Json<UserEnvelope>, AppError> {
    let mut conn = pool.acquire().await?;
    let user = user_service::retrieve(&mut conn, user_id).await?;

    Ok(Json(user.into()))
}

/// Update an admin user's details.
///
/// # Endpoint
///
/// `POST /admin/users/{id}`
///
/// # Request Body
///
/// ```json
/// {
///   "first_name": "Marcellus"
/// }
/// ```
///
/// Every field is optional: `first_name`, `last_name`, `role`
/// (`admin` | `member` | `developer`), `api_token`, `metadata`.
///
/// # Response
///
/// - **Success (200 OK)**: `{ "user": { ... } }` with only the provided fields changed
/// - **Error (400)**: Malformed JSON body or user ID
/// - **Error (401)**: Invalid API token
/// - **Error (404)**: User not found
/// - **Error (409)**: API token already used by another user
/// - **Error (422)**: A field failed validation (nothing is written)
///
/// # Atomicity
///
/// The update runs in its own transaction; any error rolls it back.
pub async fn update_user(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(user_id): ValidatedPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserEnvelope>, AppError> {
    let update = UserUpdate::try_from(request).map_err(AppError::InvalidRequest)?;

    tracing::debug!(
        actor = %auth.user_id,
        actor_role = %auth.role,
        %user_id,
        "updating user"
    );

    let mut tx = pool.begin().await?;
    let user = user_service::update(&mut tx, user_id, update).await?;
    tx.commit().await?;

    Ok(Json(user.into()))
}
