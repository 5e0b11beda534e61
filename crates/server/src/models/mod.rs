//! Domain models for the backend.

pub mod order;
pub mod payment;
pub mod session;
pub mod user;

pub use order::{LineItem, Order};
pub use payment::{NewPaymentIntent, PaymentIntent};
pub use session::session_keys;
pub use user::{NewUser, Principal, User};
