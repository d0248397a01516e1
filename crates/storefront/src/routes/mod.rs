//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to /cart
//! GET  /health                 - Health check
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/coupon            - Apply a coupon code (returns summary fragment)
//! POST /cart/coupon/remove     - Remove the applied coupon (returns summary fragment)
//! POST /cart/checkout          - Run checkout (returns toast, HX-Redirect on success)
//!
//! # Orders
//! GET  /orders                 - Order history landing page
//! ```

pub mod cart;
pub mod orders;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the storefront router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/cart", get(cart::show))
        .route("/cart/coupon", post(cart::apply_coupon))
        .route("/cart/coupon/remove", post(cart::remove_coupon))
        .route("/cart/checkout", post(cart::checkout))
        .route("/orders", get(orders::show))
}

/// The storefront's landing view is the cart.
async fn index() -> Redirect {
    Redirect::to("/cart")
}
