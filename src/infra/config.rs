use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use time::Duration;
use url::Url;

use crate::application::use_cases::checkout::PlanPrices;

pub struct AppConfig {
    pub stripe_secret_key: SecretString,
    pub stripe_webhook_secret: SecretString,
    /// Accepted age of a webhook signature timestamp, in seconds.
    pub webhook_tolerance_secs: i64,
    pub plan_prices: PlanPrices,
    pub supabase_url: Url,
    pub supabase_service_role_key: SecretString,
    pub supabase_anon_key: SecretString,
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    pub redis_url: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_per_ip: u64,
    pub rate_limit_per_email: u64,
    /// Whether to trust X-Forwarded-For headers. Set to true when behind a reverse proxy.
    /// SECURITY: Only enable this when the API is not directly exposed to the internet.
    pub trust_proxy: bool,
    pub refresh_token_ttl: Duration,
    /// `Secure` attribute on session cookies. Only disable for plain-http local dev.
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let stripe_secret_key = secret_env("STRIPE_SECRET_KEY");
        let stripe_webhook_secret = secret_env("STRIPE_WEBHOOK_SECRET");
        let webhook_tolerance_secs: i64 = get_env_default("WEBHOOK_TOLERANCE_SECS", 300);
        let plan_prices = PlanPrices {
            starter: optional_env("STRIPE_PRICE_STARTER"),
            pro: optional_env("STRIPE_PRICE_PRO"),
            enterprise: optional_env("STRIPE_PRICE_ENTERPRISE"),
        };

        let supabase_url: Url = get_env("SUPABASE_URL");
        let supabase_service_role_key = secret_env("SUPABASE_SERVICE_ROLE_KEY");
        let supabase_anon_key = secret_env("SUPABASE_ANON_KEY");

        let app_origin: Url = get_env("APP_ORIGIN");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3001)));
        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_per_ip: u64 = get_env_default("RATE_LIMIT_PER_IP", 30);
        let rate_limit_per_email: u64 = get_env_default("RATE_LIMIT_PER_EMAIL", 10);
        // Default to false for security - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        let refresh_token_ttl_days: i64 = get_env_default("REFRESH_TOKEN_TTL_DAYS", 30);
        let cookie_secure: bool = get_env_default("COOKIE_SECURE", true);

        Self {
            stripe_secret_key,
            stripe_webhook_secret,
            webhook_tolerance_secs,
            plan_prices,
            supabase_url,
            supabase_service_role_key,
            supabase_anon_key,
            app_origin,
            cors_origin,
            bind_addr,
            redis_url,
            rate_limit_window_secs,
            rate_limit_per_ip,
            rate_limit_per_email,
            trust_proxy,
            refresh_token_ttl: Duration::days(refresh_token_ttl_days),
            cookie_secure,
        }
    }
}

fn secret_env(var: &'static str) -> SecretString {
    SecretString::new(get_env::<String>(var).into())
}

fn optional_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}
