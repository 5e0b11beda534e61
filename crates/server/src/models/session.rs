//! Session storage keys.
//!
//! Only the [`Principal`](super::user::Principal) ever crosses the session
//! serialize boundary; the keys live here so handlers and middleware agree
//! on them.

/// Session keys for authentication data.
pub mod session_keys {
    /// Key under which the authenticated principal is stored.
    pub const PRINCIPAL: &str = "principal";
}
