pub mod auth;
pub mod session;

pub use auth::{
    AuthStrategy, BearerStrategy, RequireAdmin, RequireAuth, SessionStrategy, TOKEN_COOKIE_NAME,
    clear_principal, set_principal,
};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
