//! Core types for Shopkart.

pub mod amount;
pub mod email;
pub mod id;
pub mod status;

pub use amount::{AmountError, to_minor_units};
pub use email::{Email, EmailError};
pub use id::*;
pub use status::{OrderPaymentStatus, PaymentStatus, Role};
