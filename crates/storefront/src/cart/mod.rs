//! Cart screen state: line items, subtotal, and the coupon state machine.
//!
//! The state here is pure - no I/O. Handlers rebuild a [`CartScreen`] per
//! request from fresh remote reads, drive it through explicit transitions,
//! and persist only the applied coupon code in the session.
//!
//! Coupon states: `NoCoupon -> Validating -> { Applied, Rejected }`, with
//! `Applied -> NoCoupon` on explicit removal. A subtotal change while a
//! coupon is applied triggers re-validation; if that fails the coupon is
//! dropped rather than kept in a half-applied state.

pub mod totals;

use courseloft_core::Price;

use crate::api::CartLineItem;
use crate::services::coupon::{CouponResult, CouponValidator};

/// Coupon application state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CouponState {
    /// No coupon entered or applied.
    #[default]
    NoCoupon,
    /// A validation call is in flight for this code.
    Validating { code: String },
    /// The most recent validation of this code against the current subtotal
    /// succeeded. `discount` never exceeds the subtotal it was applied to.
    Applied { code: String, discount: Price },
    /// The most recent validation of this code failed.
    Rejected { code: String, message: String },
}

impl CouponState {
    /// The discount currently in effect (zero unless applied).
    #[must_use]
    pub fn discount(&self) -> Price {
        match self {
            Self::Applied { discount, .. } => *discount,
            _ => Price::ZERO,
        }
    }

    /// The applied coupon code, if any.
    #[must_use]
    pub fn applied_code(&self) -> Option<&str> {
        match self {
            Self::Applied { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Fold a validation result into the state machine.
    ///
    /// The discount is clamped to the subtotal the validation ran against so
    /// the displayed total can never go negative.
    fn resolve(&mut self, code: String, result: &CouponResult, subtotal: Price) {
        *self = if result.valid {
            Self::Applied {
                code,
                discount: result.discount.min(subtotal),
            }
        } else {
            Self::Rejected {
                code,
                message: result.message.clone(),
            }
        };
    }
}

/// The cart screen's view state for one request.
#[derive(Debug, Clone, Default)]
pub struct CartScreen {
    pub items: Vec<CartLineItem>,
    pub subtotal: Price,
    pub coupon: CouponState,
}

impl CartScreen {
    /// Build a screen from freshly fetched items and their computed subtotal.
    #[must_use]
    pub fn new(items: Vec<CartLineItem>, subtotal: Price) -> Self {
        Self {
            items,
            subtotal,
            coupon: CouponState::NoCoupon,
        }
    }

    /// Amount to charge: subtotal minus any applied discount.
    #[must_use]
    pub fn total(&self) -> Price {
        self.subtotal.saturating_sub(self.coupon.discount())
    }

    /// Apply a coupon code: validate it against the current subtotal and
    /// fold the result into the coupon state.
    pub async fn apply_coupon<V: CouponValidator>(&mut self, validator: &V, code: &str) {
        let code = code.trim().to_uppercase();
        self.coupon = CouponState::Validating { code: code.clone() };

        let result = validator.validate(&code, self.subtotal).await;
        self.coupon.resolve(code, &result, self.subtotal);
    }

    /// Re-validate an applied coupon after the subtotal changed.
    ///
    /// Discount eligibility may depend on the subtotal, so an applied coupon
    /// is checked again whenever the items (and therefore the subtotal)
    /// change. A failed re-validation drops the coupon: the state moves to
    /// `Rejected` with the service's message and the discount resets to zero.
    pub async fn revalidate_coupon<V: CouponValidator>(&mut self, validator: &V) {
        let Some(code) = self.coupon.applied_code().map(str::to_string) else {
            return;
        };

        let result = validator.validate(&code, self.subtotal).await;
        self.coupon.resolve(code, &result, self.subtotal);
    }

    /// Remove the coupon: always resets the discount to zero and the code to
    /// empty, regardless of prior state.
    pub fn remove_coupon(&mut self) {
        self.coupon = CouponState::NoCoupon;
    }
}
