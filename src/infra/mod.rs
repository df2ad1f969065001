pub mod app;
pub mod config;
pub mod error;
pub mod gotrue_client;
pub mod http_client;
pub mod rate_limit;
pub mod setup;
pub mod stripe_client;
pub mod webhook_signature;

pub use error::InfraError;
pub use rate_limit::RateLimiterTrait;
