//! Request middleware and extractors.

mod auth;
mod session;

pub use auth::RequireAuth;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
