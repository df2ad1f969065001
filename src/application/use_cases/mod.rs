pub mod activation;
pub mod billing_webhook;
pub mod checkout;
pub mod event_classifier;
pub mod provisioning;
