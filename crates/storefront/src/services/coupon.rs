//! Coupon validation service client.
//!
//! The storefront never evaluates discount rules itself: a coupon code plus
//! the current subtotal go to the remote coupon service, which answers with a
//! validity verdict and a discount amount. Transport failures are folded into
//! a synthetic "try again" rejection so a flaky coupon service can never
//! crash the cart view.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use courseloft_core::Price;

use crate::config::CouponServiceConfig;

/// Rejection message for an empty code. Checked locally, no network call.
const EMPTY_CODE_MESSAGE: &str = "Please enter a coupon code";

/// Rejection message when the coupon service itself failed.
const RETRY_MESSAGE: &str = "Error validating coupon. Please try again.";

/// Result of validating a coupon code against a subtotal.
///
/// Transient and derived per validation call; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponResult {
    pub valid: bool,
    pub message: String,
    pub discount: Price,
    #[serde(rename = "finalTotal")]
    pub final_total: Price,
}

impl CouponResult {
    /// Local rejection for an empty code.
    #[must_use]
    pub fn empty_code(subtotal: Price) -> Self {
        Self {
            valid: false,
            message: EMPTY_CODE_MESSAGE.to_string(),
            discount: Price::ZERO,
            final_total: subtotal,
        }
    }

    /// Synthetic rejection when the coupon service was unreachable.
    #[must_use]
    pub fn retry_later(subtotal: Price) -> Self {
        Self {
            valid: false,
            message: RETRY_MESSAGE.to_string(),
            discount: Price::ZERO,
            final_total: subtotal,
        }
    }
}

/// Seam trait for coupon validation.
///
/// Validation cannot fail from the caller's perspective: every failure mode
/// is expressed as an invalid [`CouponResult`].
pub trait CouponValidator: Send + Sync {
    /// Validate `code` against `subtotal`.
    async fn validate(&self, code: &str, subtotal: Price) -> CouponResult;
}

/// Request body sent to the coupon service.
#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    code: &'a str,
    subtotal: Price,
}

/// Client for the remote coupon validation service.
#[derive(Clone)]
pub struct CouponClient {
    client: reqwest::Client,
    base_url: String,
}

impl CouponClient {
    /// Create a new coupon service client.
    #[must_use]
    pub fn new(config: &CouponServiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
        }
    }

    async fn call_service(&self, code: &str, subtotal: Price) -> Result<CouponResult, reqwest::Error> {
        let url = format!("{}/validate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ValidateRequest { code, subtotal })
            .send()
            .await?
            .error_for_status()?;

        response.json().await
    }
}

impl CouponValidator for CouponClient {
    #[instrument(skip(self), fields(code = %code))]
    async fn validate(&self, code: &str, subtotal: Price) -> CouponResult {
        if code.trim().is_empty() {
            return CouponResult::empty_code(subtotal);
        }

        match self.call_service(code, subtotal).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Coupon service call failed: {e}");
                CouponResult::retry_later(subtotal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_code_result() {
        let result = CouponResult::empty_code(Price::from(250));
        assert!(!result.valid);
        assert_eq!(result.message, "Please enter a coupon code");
        assert_eq!(result.discount, Price::ZERO);
        assert_eq!(result.final_total, Price::from(250));
    }

    #[test]
    fn test_retry_result_keeps_subtotal() {
        let result = CouponResult::retry_later(Price::from(100));
        assert!(!result.valid);
        assert_eq!(result.final_total, Price::from(100));
    }

    #[tokio::test]
    async fn test_empty_code_short_circuits_without_network() {
        // Unroutable base URL: if the client tried the network, this would
        // come back as the retry message instead of the empty-code one.
        let client = CouponClient::new(&CouponServiceConfig {
            base_url: "http://192.0.2.1:1".to_string(),
        });

        let result = client.validate("   ", Price::from(250)).await;
        assert_eq!(result, CouponResult::empty_code(Price::from(250)));
    }
}
