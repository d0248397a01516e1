//! External service clients.

pub mod coupon;
