//! Wire types for the remote marketplace API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use courseloft_core::{
    CartItemId, CouponId, OrderItemId, PaymentStatus, Price, TransactionId, UserId, VariantId,
};

/// One (variant, quantity) entry in a user's cart.
///
/// Owned by the remote cart store; fetched fresh per request and removed
/// item-by-item when checkout completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub variant_id: VariantId,
    pub added_at: DateTime<Utc>,
    pub quantity: u32,
}

/// A purchasable course variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub price: Price,
}

/// A coupon record as stored by the marketplace.
///
/// The storefront only needs the id when recording a transaction; the
/// discount rule itself is evaluated by the coupon service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
}

/// Payload for creating a transaction record.
///
/// The remote side allocates the transaction id and timestamp. The
/// idempotency key is fresh per checkout attempt so a retry after a partial
/// failure cannot double-create a transaction.
#[derive(Debug, Clone, Serialize)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub total_amount: Price,
    pub coupon_id: Option<CouponId>,
    pub payment_status: PaymentStatus,
    pub idempotency_key: Uuid,
}

/// Payload for creating one order-item record tied to a transaction.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrderItem {
    pub user_id: UserId,
    pub variant_id: VariantId,
    pub quantity: u32,
    pub price: Price,
    pub transaction_id: TransactionId,
}

/// Denormalized checkout summary written as an audit record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRecord {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub total_amount: Price,
    pub discount: Price,
    pub coupon_code: Option<String>,
    pub items: Vec<CartLineItem>,
}

/// Response wrapper for creation endpoints that return the new record's id.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Created<T> {
    pub id: T,
}

/// Response shape of the order-item creation endpoint.
pub(crate) type OrderItemCreated = Created<OrderItemId>;
