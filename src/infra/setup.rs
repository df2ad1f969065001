use std::{fs::File, sync::Arc};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::http::app_state::AppState,
    application::{
        ports::{identity_store::IdentityStore, payment_provider::PaymentProviderPort},
        use_cases::{
            activation::ActivationUseCases, billing_webhook::BillingWebhookUseCases,
            checkout::CheckoutUseCases, provisioning::ProvisioningUseCases,
        },
    },
    infra::{
        config::AppConfig, gotrue_client::GoTrueClient, http_client::SharedHttpClient,
        rate_limit::RedisRateLimiter, stripe_client::StripeClient,
        webhook_signature::WebhookSignatureVerifier,
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let http = SharedHttpClient::new();

    let payment: Arc<dyn PaymentProviderPort> = Arc::new(StripeClient::new(
        http.clone(),
        config.stripe_secret_key.clone(),
    ));
    let identity: Arc<dyn IdentityStore> = Arc::new(GoTrueClient::new(
        http,
        config.supabase_url.clone(),
        config.supabase_service_role_key.clone(),
        config.supabase_anon_key.clone(),
    ));

    let rate_limiter = Arc::new(
        RedisRateLimiter::new(
            &config.redis_url,
            config.rate_limit_window_secs,
            config.rate_limit_per_ip,
            config.rate_limit_per_email,
        )
        .await?,
    );

    let provisioning = ProvisioningUseCases::new(identity.clone());
    let billing_webhook_use_cases = BillingWebhookUseCases::new(
        WebhookSignatureVerifier::new(
            config.stripe_webhook_secret.clone(),
            config.webhook_tolerance_secs,
        ),
        provisioning,
    );
    let activation_use_cases = ActivationUseCases::new(payment.clone(), identity);
    let checkout_use_cases = CheckoutUseCases::new(
        payment,
        config.plan_prices.clone(),
        config.app_origin.clone(),
    );

    Ok(AppState {
        config: Arc::new(config),
        billing_webhook_use_cases: Arc::new(billing_webhook_use_cases),
        activation_use_cases: Arc::new(activation_use_cases),
        checkout_use_cases: Arc::new(checkout_use_cases),
        rate_limiter,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "leadgen_billing=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs), skipped when app.log cannot be created
    let json_layer = File::create("app.log").ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(Arc::new(file))
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
