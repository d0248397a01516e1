//! Integration tests for Courseloft.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the storefront against a marketplace API instance
//! cargo run -p courseloft-storefront
//!
//! # Run integration tests
//! cargo test -p courseloft-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_checkout` - Cart page, coupon, and checkout flow tests
//!
//! All tests are `#[ignore]`d by default because they need a running
//! storefront (STOREFRONT_BASE_URL) and a reachable marketplace API.
