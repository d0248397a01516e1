//! Order history routes.
//!
//! Checkout redirects here after the order is recorded. Order history is
//! served by the marketplace backend; this page is the landing point the
//! storefront owns.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::middleware::RequireAuth;

/// Order history landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub user_name: String,
}

/// Display the order history landing page.
#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn show(RequireAuth(user): RequireAuth) -> impl IntoResponse {
    OrdersTemplate {
        user_name: user.name,
    }
}
