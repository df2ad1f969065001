pub mod identity_store;
pub mod payment_provider;
