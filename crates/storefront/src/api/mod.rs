//! Remote marketplace API client.
//!
//! # Architecture
//!
//! - The marketplace is the source of truth - NO local persistence, direct
//!   API calls per request
//! - In-memory caching via `moka` for variant price lookups (60 second TTL);
//!   cart reads and all writes are uncached
//! - [`MarketplaceApi`] is the seam trait: the checkout orchestrator and the
//!   total calculator are written against it so they can be exercised with an
//!   in-memory backend in tests
//!
//! # Example
//!
//! ```rust,ignore
//! use courseloft_storefront::api::{MarketplaceApi, MarketplaceClient};
//!
//! let client = MarketplaceClient::new(&config.marketplace)?;
//! let items = client.get_cart_items(user_id).await?;
//! let variant = client.get_variant(items[0].variant_id).await?;
//! ```

mod client;
mod types;

pub use client::MarketplaceClient;
pub use types::{CartLineItem, CheckoutRecord, Coupon, NewOrderItem, NewTransaction, Variant};

use courseloft_core::{CartItemId, OrderItemId, TransactionId, UserId, VariantId};
use thiserror::Error;

/// Errors that can occur when interacting with the marketplace API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Operations the storefront performs against the remote marketplace.
///
/// Mirrors the remote API surface one-to-one. Implemented by
/// [`MarketplaceClient`] for production and by in-memory mocks in tests.
pub trait MarketplaceApi: Send + Sync {
    /// Fetch the user's cart line items, in cart order.
    async fn get_cart_items(&self, user_id: UserId) -> Result<Vec<CartLineItem>, ApiError>;

    /// Fetch a variant (price lookup).
    async fn get_variant(&self, id: VariantId) -> Result<Variant, ApiError>;

    /// Resolve a coupon code to its marketplace record.
    async fn get_coupon(&self, code: &str) -> Result<Coupon, ApiError>;

    /// Create a transaction record; the remote side allocates the id.
    async fn create_transaction(&self, tx: &NewTransaction) -> Result<TransactionId, ApiError>;

    /// Create one order-item record tied to a transaction.
    async fn create_order_item(&self, item: &NewOrderItem) -> Result<OrderItemId, ApiError>;

    /// Delete an order-item record (compensation for partial batch failure).
    async fn delete_order_item(&self, id: OrderItemId) -> Result<(), ApiError>;

    /// Remove one line item from the cart.
    async fn delete_cart_item(&self, id: CartItemId) -> Result<(), ApiError>;

    /// Write the denormalized checkout audit record.
    async fn record_checkout(&self, record: &CheckoutRecord) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("coupon SAVE10".to_string());
        assert_eq!(err.to_string(), "Not found: coupon SAVE10");

        let err = ApiError::Api {
            status: 502,
            message: "upstream down".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 502 - upstream down");
    }
}
