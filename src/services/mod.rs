//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They receive a connection or transaction handle from the caller, so the
//! handler decides what runs atomically.

pub mod cart_service;
pub mod inventory_service;
pub mod payment_service;
pub mod user_service;
