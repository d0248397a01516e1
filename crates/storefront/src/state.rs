//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiError, MarketplaceClient};
use crate::checkout::CheckoutGuard;
use crate::config::StorefrontConfig;
use crate::services::coupon::CouponClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// remote API clients and configuration. There is no database: the
/// marketplace API is the only store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    marketplace: MarketplaceClient,
    coupons: CouponClient,
    checkouts: CheckoutGuard,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the marketplace HTTP client fails to build.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let marketplace = MarketplaceClient::new(&config.marketplace)?;
        let coupons = CouponClient::new(&config.coupons);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                marketplace,
                coupons,
                checkouts: CheckoutGuard::new(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the marketplace API client.
    #[must_use]
    pub fn marketplace(&self) -> &MarketplaceClient {
        &self.inner.marketplace
    }

    /// Get a reference to the coupon service client.
    #[must_use]
    pub fn coupons(&self) -> &CouponClient {
        &self.inner.coupons
    }

    /// Get a reference to the per-user checkout guard.
    #[must_use]
    pub fn checkouts(&self) -> &CheckoutGuard {
        &self.inner.checkouts
    }
}
