//! Session-stored types.

use serde::{Deserialize, Serialize};

use courseloft_core::UserId;

/// Session-stored user identity.
///
/// Written by the external authentication layer; the storefront only reads
/// it. Carries the contact fields the checkout audit record needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Session keys for storefront state.
pub mod session_keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the applied coupon code. Only the code is stored; the
    /// discount is re-derived by validation against a fresh subtotal.
    pub const APPLIED_COUPON: &str = "applied_coupon";
}
