pub mod auth;
pub mod billing_webhook;
pub mod checkout;
pub mod health;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/billing", billing_webhook::router())
        .nest("/auth", auth::router())
        .merge(checkout::router())
        .merge(health::router())
}
