//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the remote marketplace; the only session state
//! is the applied coupon code, which is re-validated against a freshly
//! computed subtotal on every request that needs it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use courseloft_core::Price;

use crate::api::{CartLineItem, MarketplaceApi};
use crate::cart::totals::cart_subtotal;
use crate::cart::{CartScreen, CouponState};
use crate::checkout::{AppliedCoupon, CheckoutOutcome, CheckoutRequest, CheckoutUser, run_checkout};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub variant_id: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: usize,
}

/// Order summary display data for templates.
#[derive(Clone)]
pub struct SummaryView {
    pub subtotal: String,
    pub discount: String,
    pub has_discount: bool,
    pub total: String,
    pub applied_code: Option<String>,
    pub coupon_message: Option<String>,
}

impl SummaryView {
    fn from_screen(screen: &CartScreen) -> Self {
        let discount = screen.coupon.discount();
        Self {
            subtotal: screen.subtotal.to_string(),
            discount: discount.to_string(),
            has_discount: !discount.is_zero(),
            total: screen.total().to_string(),
            applied_code: screen.coupon.applied_code().map(str::to_string),
            coupon_message: match &screen.coupon {
                CouponState::Rejected { message, .. } => Some(message.clone()),
                _ => None,
            },
        }
    }
}

/// Apply coupon form data.
#[derive(Debug, Deserialize)]
pub struct ApplyCouponForm {
    pub coupon_code: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub summary: SummaryView,
}

/// Order summary fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/summary.html")]
pub struct SummaryTemplate {
    pub summary: SummaryView,
}

/// Transient toast notification fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/toast.html")]
pub struct ToastTemplate {
    pub message: String,
    pub success: bool,
}

// =============================================================================
// Screen loading
// =============================================================================

/// Fetch the user's items, compute the subtotal, and re-validate any
/// session-stored coupon against it.
///
/// A cart fetch failure degrades to an empty cart rather than erroring the
/// page. If the stored coupon no longer validates it is dropped from the
/// session; the rejection message surfaces once through the returned screen.
async fn load_screen(state: &AppState, session: &Session, user: &CurrentUser) -> CartScreen {
    let items = match state.marketplace().get_cart_items(user.id).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Failed to fetch cart for user {}: {e}", user.id);
            Vec::new()
        }
    };

    let subtotal = cart_subtotal(state.marketplace(), &items).await;
    let mut screen = CartScreen::new(items, subtotal);

    let stored_code: Option<String> = session
        .get(session_keys::APPLIED_COUPON)
        .await
        .ok()
        .flatten();

    if let Some(code) = stored_code {
        // The stored code was applied against an earlier subtotal; it must
        // pass re-validation against the fresh one to keep its discount.
        screen.coupon = CouponState::Applied {
            code,
            discount: Price::ZERO,
        };
        screen.revalidate_coupon(state.coupons()).await;
        sync_session_coupon(session, &screen).await;
    }

    screen
}

/// Keep the session's coupon key in step with the screen's coupon state.
async fn sync_session_coupon(session: &Session, screen: &CartScreen) {
    let result = match screen.coupon.applied_code() {
        Some(code) => session.insert(session_keys::APPLIED_COUPON, code).await,
        None => session
            .remove::<String>(session_keys::APPLIED_COUPON)
            .await
            .map(|_| ()),
    };

    if let Err(e) = result {
        tracing::error!("Failed to update coupon in session: {e}");
    }
}

/// Build the cart display data, resolving a unit price per item.
///
/// The variant cache makes these lookups cheap after `cart_subtotal` ran.
/// A failed lookup displays as "unavailable" rather than hiding the item.
async fn cart_view(state: &AppState, items: &[CartLineItem]) -> CartView {
    let mut views = Vec::with_capacity(items.len());
    for item in items {
        let view = match state.marketplace().get_variant(item.variant_id).await {
            Ok(variant) => CartItemView {
                variant_id: item.variant_id.to_string(),
                quantity: item.quantity,
                unit_price: variant.price.to_string(),
                line_price: variant.price.times(item.quantity).to_string(),
            },
            Err(_) => CartItemView {
                variant_id: item.variant_id.to_string(),
                quantity: item.quantity,
                unit_price: "unavailable".to_string(),
                line_price: "unavailable".to_string(),
            },
        };
        views.push(view);
    }

    CartView {
        item_count: views.len(),
        items: views,
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> impl IntoResponse {
    let screen = load_screen(&state, &session, &user).await;
    let cart = cart_view(&state, &screen.items).await;

    CartShowTemplate {
        cart,
        summary: SummaryView::from_screen(&screen),
    }
}

/// Apply a coupon code (HTMX).
///
/// Validates the submitted code against the current subtotal and returns the
/// refreshed order-summary fragment. The code is kept in the session only
/// while it validates.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ApplyCouponForm>,
) -> Response {
    let mut screen = load_screen(&state, &session, &user).await;

    screen.apply_coupon(state.coupons(), &form.coupon_code).await;
    sync_session_coupon(&session, &screen).await;

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        SummaryTemplate {
            summary: SummaryView::from_screen(&screen),
        },
    )
        .into_response()
}

/// Remove the applied coupon (HTMX).
///
/// Always resets the discount to zero and forgets the code, regardless of
/// prior state.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn remove_coupon(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Response {
    let mut screen = load_screen(&state, &session, &user).await;

    screen.remove_coupon();
    sync_session_coupon(&session, &screen).await;

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        SummaryTemplate {
            summary: SummaryView::from_screen(&screen),
        },
    )
        .into_response()
}

/// Run the checkout sequence (HTMX).
///
/// On success the session coupon clears and the client is redirected to the
/// order history; on failure the cart and coupon state are untouched so the
/// user may retry.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Response {
    let screen = load_screen(&state, &session, &user).await;

    let coupon = screen.coupon.applied_code().map(|code| AppliedCoupon {
        code: code.to_string(),
        discount: screen.coupon.discount(),
    });

    let request = CheckoutRequest {
        user: CheckoutUser {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        },
        items: screen.items.clone(),
        subtotal: screen.subtotal,
        coupon,
    };

    match run_checkout(state.marketplace(), state.checkouts(), request).await {
        Ok(CheckoutOutcome::Completed { transaction_id }) => {
            tracing::info!(%transaction_id, "Order placed");
            if let Err(e) = session
                .remove::<String>(session_keys::APPLIED_COUPON)
                .await
            {
                tracing::error!("Failed to clear coupon from session: {e}");
            }

            (
                AppendHeaders([("HX-Redirect", "/orders"), ("HX-Trigger", "cart-updated")]),
                ToastTemplate {
                    message: "Order placed successfully! 🎉".to_string(),
                    success: true,
                },
            )
                .into_response()
        }
        Ok(CheckoutOutcome::AlreadyInProgress) => ToastTemplate {
            message: "Checkout already in progress".to_string(),
            success: false,
        }
        .into_response(),
        Err(e) => {
            tracing::error!("Checkout error: {e}");
            ToastTemplate {
                message: "Checkout failed. Please try again.".to_string(),
                success: false,
            }
            .into_response()
        }
    }
}
