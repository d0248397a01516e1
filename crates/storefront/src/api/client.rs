//! Reqwest implementation of the marketplace API client.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use courseloft_core::{CartItemId, OrderItemId, TransactionId, UserId, VariantId};

use crate::config::MarketplaceConfig;

use super::types::OrderItemCreated;
use super::{
    ApiError, CartLineItem, CheckoutRecord, Coupon, MarketplaceApi, NewOrderItem, NewTransaction,
    Variant,
};

/// Variant price cache TTL.
///
/// Prices change rarely relative to cart traffic; a short TTL sheds repeat
/// lookups for popular variants without holding stale prices for long.
const VARIANT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Client for the remote marketplace API.
///
/// Cheaply cloneable via `Arc`. All money fields travel as JSON numbers.
#[derive(Clone)]
pub struct MarketplaceClient {
    inner: Arc<MarketplaceClientInner>,
}

struct MarketplaceClientInner {
    client: reqwest::Client,
    base_url: String,
    variant_cache: Cache<VariantId, Variant>,
}

impl MarketplaceClient {
    /// Create a new marketplace API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build (malformed token).
    pub fn new(config: &MarketplaceConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| ApiError::Parse(format!("Invalid API token format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let variant_cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(VARIANT_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(MarketplaceClientInner {
                client,
                base_url: config.base_url.clone(),
                variant_cache,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Check a response status and decode the JSON body.
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, ApiError> {
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(what.to_string()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse marketplace response"
            );
            ApiError::Parse(e.to_string())
        })
    }

    /// Check a response status for a call with no meaningful body.
    async fn read_empty(response: reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

impl MarketplaceApi for MarketplaceClient {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn get_cart_items(&self, user_id: UserId) -> Result<Vec<CartLineItem>, ApiError> {
        let url = self.url(&format!("/cart?userId={user_id}"));
        let response = self.inner.client.get(&url).send().await?;
        Self::read_json(response, &format!("cart for user {user_id}")).await
    }

    #[instrument(skip(self), fields(variant_id = %id))]
    async fn get_variant(&self, id: VariantId) -> Result<Variant, ApiError> {
        if let Some(variant) = self.inner.variant_cache.get(&id).await {
            debug!("Cache hit for variant");
            return Ok(variant);
        }

        let url = self.url(&format!("/variant?id={id}"));
        let response = self.inner.client.get(&url).send().await?;
        let variant: Variant = Self::read_json(response, &format!("variant {id}")).await?;

        self.inner.variant_cache.insert(id, variant.clone()).await;

        Ok(variant)
    }

    #[instrument(skip(self), fields(code = %code))]
    async fn get_coupon(&self, code: &str) -> Result<Coupon, ApiError> {
        let url = self.url(&format!("/coupon?code={}", urlencoding::encode(code)));
        let response = self.inner.client.get(&url).send().await?;
        Self::read_json(response, &format!("coupon {code}")).await
    }

    #[instrument(skip(self, tx), fields(user_id = %tx.user_id, idempotency_key = %tx.idempotency_key))]
    async fn create_transaction(&self, tx: &NewTransaction) -> Result<TransactionId, ApiError> {
        let url = self.url("/transaction");
        let response = self.inner.client.post(&url).json(tx).send().await?;
        // The endpoint returns the allocated transaction id as a bare number
        Self::read_json(response, "created transaction").await
    }

    #[instrument(skip(self, item), fields(transaction_id = %item.transaction_id, variant_id = %item.variant_id))]
    async fn create_order_item(&self, item: &NewOrderItem) -> Result<OrderItemId, ApiError> {
        let url = self.url("/orders");
        let response = self.inner.client.post(&url).json(item).send().await?;
        let created: OrderItemCreated = Self::read_json(response, "created order item").await?;
        Ok(created.id)
    }

    #[instrument(skip(self), fields(order_item_id = %id))]
    async fn delete_order_item(&self, id: OrderItemId) -> Result<(), ApiError> {
        let url = self.url(&format!("/orders?id={id}"));
        let response = self.inner.client.delete(&url).send().await?;
        Self::read_empty(response).await
    }

    #[instrument(skip(self), fields(cart_item_id = %id))]
    async fn delete_cart_item(&self, id: CartItemId) -> Result<(), ApiError> {
        let url = self.url(&format!("/cart?id={id}"));
        let response = self.inner.client.delete(&url).send().await?;
        Self::read_empty(response).await
    }

    #[instrument(skip(self, record), fields(user_id = %record.user_id))]
    async fn record_checkout(&self, record: &CheckoutRecord) -> Result<(), ApiError> {
        let url = self.url("/checkout");
        let response = self.inner.client.post(&url).json(record).send().await?;
        Self::read_empty(response).await
    }
}
