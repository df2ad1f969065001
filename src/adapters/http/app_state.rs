use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    application::use_cases::{
        activation::ActivationUseCases, billing_webhook::BillingWebhookUseCases,
        checkout::CheckoutUseCases,
    },
    infra::{RateLimiterTrait, config::AppConfig},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub billing_webhook_use_cases: Arc<BillingWebhookUseCases>,
    pub activation_use_cases: Arc<ActivationUseCases>,
    pub checkout_use_cases: Arc<CheckoutUseCases>,
    pub rate_limiter: Arc<dyn RateLimiterTrait>,
}

impl FromRef<AppState> for Arc<BillingWebhookUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.billing_webhook_use_cases.clone()
    }
}

impl FromRef<AppState> for Arc<CheckoutUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.checkout_use_cases.clone()
    }
}
