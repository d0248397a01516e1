//! Checkout orchestration.
//!
//! Checkout is a strict sequence of dependent remote calls:
//!
//! 1. Resolve the applied coupon code to a coupon id (non-fatal).
//! 2. Create the transaction record (fatal on failure - nothing else can
//!    reference a transaction that does not exist).
//! 3. Create one order item per cart line, concurrently. The batch is
//!    all-or-nothing: if any creation fails, the ones that succeeded are
//!    compensated with deletes and the checkout fails.
//! 4. Delete the cart line items, concurrently.
//! 5. Write the denormalized checkout audit record.
//!
//! Steps 3 and 4 both require step 2's transaction id; step 5 runs only
//! after 3 and 4 succeeded. On any failure the caller's cart and coupon
//! state are left untouched so the user can retry; each attempt carries a
//! fresh idempotency key so a retry cannot double-create a transaction.
//!
//! At most one checkout may be in flight per user; a second invocation while
//! one is running is a no-op.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use courseloft_core::{OrderItemId, PaymentStatus, Price, TransactionId, UserId};

use crate::api::{ApiError, CartLineItem, CheckoutRecord, MarketplaceApi, NewOrderItem, NewTransaction};

/// Errors that abort a checkout. The failing step is preserved for logging;
/// users see a single generic failure message either way.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Step 2: transaction creation failed.
    #[error("transaction creation failed: {0}")]
    Transaction(#[source] ApiError),

    /// Step 3: an order-item creation failed (batch compensated).
    #[error("order item creation failed: {0}")]
    OrderItems(#[source] ApiError),

    /// Step 4: a cart-item delete failed.
    #[error("cart clearing failed: {0}")]
    CartClear(#[source] ApiError),

    /// Step 5: the checkout record write failed.
    #[error("checkout record write failed: {0}")]
    Record(#[source] ApiError),
}

/// What a checkout invocation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// All steps succeeded; local cart/coupon state may now be cleared.
    Completed { transaction_id: TransactionId },
    /// Another checkout was already running for this user; nothing was done.
    AlreadyInProgress,
}

/// The acting user, passed in explicitly rather than read from ambient
/// session state.
#[derive(Debug, Clone)]
pub struct CheckoutUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// A coupon in the `Applied` state at checkout time.
#[derive(Debug, Clone)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount: Price,
}

/// Everything a checkout attempt consumes.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user: CheckoutUser,
    pub items: Vec<CartLineItem>,
    pub subtotal: Price,
    pub coupon: Option<AppliedCoupon>,
}

// =============================================================================
// In-flight guard
// =============================================================================

/// Tracks which users have a checkout in flight.
///
/// `begin` hands out an RAII permit; the user's slot frees when the permit
/// drops, including on early returns and panics.
#[derive(Debug, Default)]
pub struct CheckoutGuard {
    in_flight: Mutex<HashSet<UserId>>,
}

impl CheckoutGuard {
    /// Create an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to start a checkout for `user`. Returns `None` if one is already
    /// running.
    pub fn begin(&self, user: UserId) -> Option<CheckoutPermit<'_>> {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        set.insert(user).then(|| CheckoutPermit { guard: self, user })
    }

    fn release(&self, user: UserId) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user);
    }
}

/// Permit proving the holder is the only checkout in flight for a user.
#[derive(Debug)]
pub struct CheckoutPermit<'a> {
    guard: &'a CheckoutGuard,
    user: UserId,
}

impl Drop for CheckoutPermit<'_> {
    fn drop(&mut self) {
        self.guard.release(self.user);
    }
}

// =============================================================================
// Orchestration
// =============================================================================

/// Run the checkout sequence for one request.
///
/// On failure the remote transaction record may remain in `PENDING` with no
/// order items attached; local state is untouched and the user may retry
/// with a new idempotency key.
///
/// # Errors
///
/// Returns a [`CheckoutError`] naming the step that failed. Coupon id
/// resolution (step 1) never fails the checkout.
#[instrument(skip(api, guard, request), fields(user_id = %request.user.id, items = request.items.len()))]
pub async fn run_checkout<A: MarketplaceApi>(
    api: &A,
    guard: &CheckoutGuard,
    request: CheckoutRequest,
) -> Result<CheckoutOutcome, CheckoutError> {
    let Some(_permit) = guard.begin(request.user.id) else {
        tracing::info!("Checkout already in progress, ignoring");
        return Ok(CheckoutOutcome::AlreadyInProgress);
    };

    let attempt = Uuid::new_v4();

    // Step 1: resolve coupon code to id. Non-fatal: a missing coupon record
    // costs the transaction its coupon reference, not the sale.
    let coupon_id = match &request.coupon {
        Some(coupon) => match api.get_coupon(&coupon.code).await {
            Ok(record) => Some(record.id),
            Err(e) => {
                tracing::warn!(code = %coupon.code, "Coupon id lookup failed, proceeding without: {e}");
                None
            }
        },
        None => None,
    };

    let discount = request
        .coupon
        .as_ref()
        .map_or(Price::ZERO, |c| c.discount);
    let total = request.subtotal.saturating_sub(discount);

    // Step 2: create the transaction. Everything downstream references its id.
    let transaction_id = api
        .create_transaction(&NewTransaction {
            user_id: request.user.id,
            total_amount: total,
            coupon_id,
            payment_status: PaymentStatus::Pending,
            idempotency_key: attempt,
        })
        .await
        .map_err(CheckoutError::Transaction)?;

    // Step 3: order items, concurrently, with compensation on partial failure.
    create_order_items(api, &request, transaction_id).await?;

    // Step 4: clear the cart. A no-op for an empty cart.
    futures::future::try_join_all(
        request
            .items
            .iter()
            .map(|item| api.delete_cart_item(item.id)),
    )
    .await
    .map_err(CheckoutError::CartClear)?;

    // Step 5: denormalized audit record, only after 3 and 4 succeeded.
    api.record_checkout(&CheckoutRecord {
        user_id: request.user.id,
        name: request.user.name.clone(),
        email: request.user.email.clone(),
        total_amount: total,
        discount,
        coupon_code: request.coupon.as_ref().map(|c| c.code.clone()),
        items: request.items.clone(),
    })
    .await
    .map_err(CheckoutError::Record)?;

    tracing::info!(%transaction_id, "Checkout completed");
    Ok(CheckoutOutcome::Completed { transaction_id })
}

/// Create one order item per cart line, concurrently.
///
/// The batch is all-or-nothing: on any failure, order items that were
/// created are deleted again before the error is returned, so a failed
/// checkout leaves no stray order rows behind.
async fn create_order_items<A: MarketplaceApi>(
    api: &A,
    request: &CheckoutRequest,
    transaction_id: TransactionId,
) -> Result<(), CheckoutError> {
    let user_id = request.user.id;

    let results = futures::future::join_all(request.items.iter().map(|item| async move {
        let variant = api.get_variant(item.variant_id).await?;
        api.create_order_item(&NewOrderItem {
            user_id,
            variant_id: item.variant_id,
            quantity: item.quantity,
            price: variant.price,
            transaction_id,
        })
        .await
    }))
    .await;

    let mut created: Vec<OrderItemId> = Vec::new();
    let mut first_failure: Option<ApiError> = None;
    let mut failure_count = 0usize;

    for result in results {
        match result {
            Ok(id) => created.push(id),
            Err(e) => {
                failure_count += 1;
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }
    }

    let Some(failure) = first_failure else {
        return Ok(());
    };

    tracing::error!(
        %transaction_id,
        failed = failure_count,
        succeeded = created.len(),
        "Order item batch failed, compensating"
    );

    for id in created {
        if let Err(e) = api.delete_order_item(id).await {
            // Nothing more to do than record it; the transaction stays
            // PENDING and is reconciled out of band.
            tracing::error!(order_item_id = %id, "Compensating delete failed: {e}");
        }
    }

    Err(CheckoutError::OrderItems(failure))
}
