//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request and response bodies built from them.

/// Cart, line item and totals models
pub mod cart;
/// Payment session model
pub mod payment_session;
/// Product variant and availability model
pub mod product_variant;
/// Admin user model
pub mod user;
