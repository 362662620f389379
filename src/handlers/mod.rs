//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (path params, validated JSON body)
//! 2. Opens a transaction and delegates to services
//! 3. Returns HTTP response (JSON, status code)

/// Store cart endpoints
pub mod carts;
/// Health check endpoint
pub mod health;
/// Admin user endpoints
pub mod users;
