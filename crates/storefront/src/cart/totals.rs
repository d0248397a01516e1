//! Cart subtotal calculation.

use tracing::instrument;

use courseloft_core::Price;

use crate::api::{CartLineItem, MarketplaceApi};

/// Sum price x quantity across the cart's line items.
///
/// Each item's unit price is looked up by variant. A failed lookup is logged
/// and that item's contribution skipped, so one missing variant degrades the
/// displayed subtotal instead of blanking the whole cart. There is no
/// transactional read: prices mutated mid-calculation may produce a mixed
/// subtotal.
#[instrument(skip(api, items), fields(item_count = items.len()))]
pub async fn cart_subtotal<A: MarketplaceApi>(api: &A, items: &[CartLineItem]) -> Price {
    let mut subtotal = Price::ZERO;

    for item in items {
        match api.get_variant(item.variant_id).await {
            Ok(variant) => subtotal += variant.price.times(item.quantity),
            Err(e) => {
                tracing::warn!(
                    variant_id = %item.variant_id,
                    "Skipping cart item in subtotal, variant lookup failed: {e}"
                );
            }
        }
    }

    subtotal
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use courseloft_core::{
        CartItemId, OrderItemId, TransactionId, UserId, VariantId,
    };

    use crate::api::{
        ApiError, CheckoutRecord, Coupon, NewOrderItem, NewTransaction, Variant,
    };

    use super::*;

    /// Marketplace backend serving variants from a fixed price table.
    struct PriceTable {
        prices: HashMap<VariantId, Price>,
    }

    impl MarketplaceApi for PriceTable {
        async fn get_cart_items(&self, _user_id: UserId) -> Result<Vec<CartLineItem>, ApiError> {
            Ok(Vec::new())
        }

        async fn get_variant(&self, id: VariantId) -> Result<Variant, ApiError> {
            self.prices
                .get(&id)
                .map(|price| Variant { id, price: *price })
                .ok_or_else(|| ApiError::NotFound(format!("variant {id}")))
        }

        async fn get_coupon(&self, code: &str) -> Result<Coupon, ApiError> {
            Err(ApiError::NotFound(format!("coupon {code}")))
        }

        async fn create_transaction(
            &self,
            _tx: &NewTransaction,
        ) -> Result<TransactionId, ApiError> {
            unreachable!("not used by subtotal calculation")
        }

        async fn create_order_item(&self, _item: &NewOrderItem) -> Result<OrderItemId, ApiError> {
            unreachable!("not used by subtotal calculation")
        }

        async fn delete_order_item(&self, _id: OrderItemId) -> Result<(), ApiError> {
            unreachable!("not used by subtotal calculation")
        }

        async fn delete_cart_item(&self, _id: CartItemId) -> Result<(), ApiError> {
            unreachable!("not used by subtotal calculation")
        }

        async fn record_checkout(&self, _record: &CheckoutRecord) -> Result<(), ApiError> {
            unreachable!("not used by subtotal calculation")
        }
    }

    fn line_item(id: i64, variant: i64, quantity: u32) -> CartLineItem {
        CartLineItem {
            id: CartItemId::new(id),
            user_id: UserId::new(1),
            variant_id: VariantId::new(variant),
            added_at: Utc::now(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_subtotal_sums_price_times_quantity() {
        let api = PriceTable {
            prices: HashMap::from([
                (VariantId::new(1), Price::from(100)),
                (VariantId::new(2), Price::from(50)),
            ]),
        };
        let items = vec![line_item(10, 1, 2), line_item(11, 2, 1)];

        assert_eq!(cart_subtotal(&api, &items).await, Price::from(250));
    }

    #[tokio::test]
    async fn test_empty_cart_subtotal_is_zero() {
        let api = PriceTable {
            prices: HashMap::new(),
        };

        assert_eq!(cart_subtotal(&api, &[]).await, Price::ZERO);
    }

    #[tokio::test]
    async fn test_failed_lookup_skips_item() {
        let api = PriceTable {
            prices: HashMap::from([(VariantId::new(1), Price::from(100))]),
        };
        // Variant 99 is unknown: its line contributes nothing.
        let items = vec![line_item(10, 1, 2), line_item(11, 99, 3)];

        assert_eq!(cart_subtotal(&api, &items).await, Price::from(200));
    }
}
