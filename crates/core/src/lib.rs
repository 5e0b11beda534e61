//! Shopkart Core - Shared types library.
//!
//! Common domain types used by the backend server: type-safe IDs, email
//! addresses, roles, and payment status enums.
//!
//! This crate contains only types and conversions - no I/O, no database
//! access, no HTTP clients.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
