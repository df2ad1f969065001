use async_trait::async_trait;

use crate::{
    app_error::AppResult,
    domain::entities::{checkout_session::CheckoutSession, plan::Plan},
};

/// Parameters for a hosted subscription checkout.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub email: String,
    pub plan: Plan,
    /// Provider price id for `plan`.
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirect {
    pub session_id: String,
    pub url: String,
}

/// Read/write access to the payment provider's API.
#[async_trait]
pub trait PaymentProviderPort: Send + Sync {
    /// `AppError::NotFound` when the provider does not know the session.
    async fn retrieve_checkout_session(&self, session_id: &str) -> AppResult<CheckoutSession>;

    async fn create_checkout_session(&self, request: &CheckoutRequest)
    -> AppResult<CheckoutRedirect>;
}
