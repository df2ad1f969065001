pub mod account;
pub mod billing_event;
pub mod checkout_session;
pub mod plan;
