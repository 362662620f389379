//! API token authentication middleware for admin routes.
//!
//! This middleware intercepts every admin request to:
//! 1. Extract the API token from the `Authorization` or `x-api-token` header
//! 2. Hash it and look up the active user owning it
//! 3. Inject authentication context into the request
//! 4. Reject unauthorized requests with HTTP 401

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::user::UserRole,
    services::user_service,
};

/// Header carrying a raw API token, as an alternative to `Authorization: Bearer`.
pub const API_TOKEN_HEADER: &str = "x-api-token";

/// Authentication context attached to authenticated requests.
///
/// Inserted into the request's extension map; handlers extract it with
/// `Extension<AuthContext>` to know who made the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// ID of the authenticated admin user
    pub user_id: Uuid,

    pub role: UserRole,
}

#[derive(Debug, sqlx::FromRow)]
struct TokenOwner {
    id: Uuid,
    #[sqlx(try_from = "String")]
    role: UserRole,
}

/// Pull the raw API token out of the request headers.
///
/// `Authorization: Bearer <token>` wins over `x-api-token: <token>`.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    bearer
        .or_else(|| headers.get(API_TOKEN_HEADER).and_then(|h| h.to_str().ok()))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// API token authentication middleware function.
///
/// # Flow
///
/// 1. Extract the token from the headers (no database access if absent)
/// 2. Hash it using SHA-256
/// 3. Query `users` for a matching, non-deleted owner
/// 4. If found: inject `AuthContext` into request, call next handler
/// 5. If not found: return 401 Unauthorized error
pub async fn auth_middleware(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers()).ok_or(AppError::InvalidApiKey)?;
    let token_hash = user_service::hash_api_token(token);

    let owner = sqlx::query_as::<_, TokenOwner>(
        "SELECT id, role FROM users WHERE api_token_hash = $1 AND deleted_at IS NULL",
    )
    .bind(&token_hash)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| {
        tracing::warn!("rejected admin request with unknown API token");
        AppError::InvalidApiKey
    })?;

    request.extensions_mut().insert(AuthContext {
        user_id: owner.id,
        role: owner.role,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc123"));

        assert_eq!(extract_token(&headers), Some("abc123"));
    }

    #[test]
    fn api_token_header_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(API_TOKEN_HEADER, HeaderValue::from_static("abc123"));

        assert_eq!(extract_token(&headers), Some("abc123"));
    }

    #[test]
    fn bearer_wins_over_api_token_header() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer from-bearer"));
        headers.insert(API_TOKEN_HEADER, HeaderValue::from_static("from-header"));

        assert_eq!(extract_token(&headers), Some("from-bearer"));
    }

    #[test]
    fn other_schemes_and_blank_tokens_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(API_TOKEN_HEADER, HeaderValue::from_static("   "));
        assert_eq!(extract_token(&headers), None);

        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
