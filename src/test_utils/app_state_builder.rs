//! Test app state builder for HTTP-level integration testing.
//!
//! `TestAppStateBuilder` wires the real use cases on top of in-memory mocks,
//! so routes can be driven through `axum-test` without any network.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::Duration;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::{
        activation::ActivationUseCases, billing_webhook::BillingWebhookUseCases,
        checkout::{CheckoutUseCases, PlanPrices}, provisioning::ProvisioningUseCases,
    },
    infra::{
        RateLimiterTrait,
        config::AppConfig,
        webhook_signature::{DEFAULT_TOLERANCE_SECS, WebhookSignatureVerifier, sign_webhook_payload},
    },
    test_utils::{InMemoryIdentityStore, InMemoryPaymentProvider, InMemoryRateLimiter},
};

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const TEST_APP_ORIGIN: &str = "https://leads.example.com";

/// Signature header for `body`, valid right now.
pub fn sign_test_webhook(body: &[u8]) -> String {
    sign_webhook_payload(TEST_WEBHOOK_SECRET, chrono::Utc::now().timestamp(), body)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        stripe_secret_key: SecretString::new("sk_test_123".into()),
        stripe_webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
        webhook_tolerance_secs: DEFAULT_TOLERANCE_SECS,
        plan_prices: PlanPrices {
            starter: Some("price_starter".to_string()),
            pro: Some("price_pro".to_string()),
            enterprise: Some("price_enterprise".to_string()),
        },
        supabase_url: Url::parse("https://project.supabase.test").unwrap(),
        supabase_service_role_key: SecretString::new("service_role".into()),
        supabase_anon_key: SecretString::new("anon".into()),
        app_origin: Url::parse(TEST_APP_ORIGIN).unwrap(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        redis_url: "redis://127.0.0.1:6379".to_string(),
        rate_limit_window_secs: 60,
        rate_limit_per_ip: 30,
        rate_limit_per_email: 10,
        trust_proxy: false,
        refresh_token_ttl: Duration::days(30),
        cookie_secure: true,
    }
}

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let identity = Arc::new(InMemoryIdentityStore::new());
/// let app_state = TestAppStateBuilder::new()
///     .with_identity_store(identity.clone())
///     .build();
/// ```
pub struct TestAppStateBuilder {
    config: AppConfig,
    identity: Arc<InMemoryIdentityStore>,
    payment: Arc<InMemoryPaymentProvider>,
    rate_limiter: Arc<dyn RateLimiterTrait>,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            identity: Arc::new(InMemoryIdentityStore::new()),
            payment: Arc::new(InMemoryPaymentProvider::new()),
            rate_limiter: Arc::new(InMemoryRateLimiter::permissive()),
        }
    }

    pub fn with_identity_store(mut self, identity: Arc<InMemoryIdentityStore>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_payment_provider(mut self, payment: Arc<InMemoryPaymentProvider>) -> Self {
        self.payment = payment;
        self
    }

    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiterTrait>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn with_config(mut self, overrides: impl FnOnce(&mut AppConfig)) -> Self {
        overrides(&mut self.config);
        self
    }

    pub fn build(self) -> AppState {
        let config = self.config;
        let webhook = BillingWebhookUseCases::new(
            WebhookSignatureVerifier::new(
                config.stripe_webhook_secret.clone(),
                config.webhook_tolerance_secs,
            ),
            ProvisioningUseCases::new(self.identity.clone()),
        );
        let activation = ActivationUseCases::new(self.payment.clone(), self.identity);
        let checkout = CheckoutUseCases::new(
            self.payment,
            config.plan_prices.clone(),
            config.app_origin.clone(),
        );

        AppState {
            config: Arc::new(config),
            billing_webhook_use_cases: Arc::new(webhook),
            activation_use_cases: Arc::new(activation),
            checkout_use_cases: Arc::new(checkout),
            rate_limiter: self.rate_limiter,
        }
    }
}
