//! Shopkart backend library.
//!
//! The server is exposed as a library so integration tests can assemble the
//! router with test doubles for the stores and the payment processor.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
