//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::ValidationErrors;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error code.
///
/// # Error Categories
///
/// - **Request Errors**: Malformed bodies or path parameters, failed field validation
/// - **Authentication Errors**: Invalid or missing API tokens
/// - **Resource Errors**: Requested user, cart or line item not found
/// - **State Errors**: Mutations a resource's current state forbids
/// - **Internal Errors**: Database failures and broken invariants
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// API token is missing or does not belong to an active user.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid API token")]
    InvalidApiKey,

    /// Returns HTTP 404 Not Found.
    #[error("User not found")]
    UserNotFound,

    /// Returns HTTP 404 Not Found.
    #[error("Cart not found")]
    CartNotFound,

    /// The line item does not exist or belongs to another cart.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Line item not found")]
    LineItemNotFound,

    /// The resource exists but its state forbids the operation
    /// (e.g. removing items from a completed cart).
    ///
    /// Returns HTTP 409 Conflict.
    #[error("{0}")]
    InvalidState(String),

    /// Request body or parameters could not be parsed.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("{0}")]
    InvalidRequest(String),

    /// Request body parsed but one or more fields failed validation.
    ///
    /// Returns HTTP 422 Unprocessable Entity with per-field details.
    #[error("Request body failed validation")]
    Validation(#[from] ValidationErrors),

    /// An internal invariant was broken (e.g. arithmetic overflow while totalling).
    ///
    /// Returns HTTP 500, the message is only logged.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound | AppError::CartNotFound | AppError::LineItemNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code included in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::InvalidApiKey => "unauthorized",
            AppError::UserNotFound | AppError::CartNotFound | AppError::LineItemNotFound => {
                "not_found"
            }
            AppError::InvalidState(_) => "invalid_state",
            AppError::Validation(_) => "invalid_data",
            AppError::Database(_) | AppError::Internal(_) => "internal_error",
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "invalid_data",
///     "message": "Request body failed validation",
///     "fields": { "role": [ { "code": "invalid_role", ... } ] }
///   }
/// }
/// ```
///
/// `fields` is only present for validation errors. Internal errors never
/// leak their details to the client; they are logged instead.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let body = match self {
            AppError::Validation(ref errors) => json!({
                "error": {
                    "code": code,
                    "message": self.to_string(),
                    "fields": errors,
                }
            }),
            AppError::Database(ref err) => {
                tracing::error!(error = %err, "database error while handling request");
                json!({
                    "error": {
                        "code": code,
                        "message": "An internal error occurred",
                    }
                })
            }
            AppError::Internal(ref msg) => {
                tracing::error!(error = %msg, "internal error while handling request");
                json!({
                    "error": {
                        "code": code,
                        "message": "An internal error occurred",
                    }
                })
            }
            _ => json!({
                "error": {
                    "code": code,
                    "message": self.to_string(),
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}
