//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use serde_json::json;
use uuid::Uuid;

use crate::domain::entities::{
    account::{Account, initial_attributes},
    checkout_session::{CheckoutPaymentStatus, CheckoutSession},
    plan::Plan,
};

/// Create a provisioned Starter account with sensible defaults.
pub fn create_test_account(overrides: impl FnOnce(&mut Account)) -> Account {
    let mut account = Account {
        id: Uuid::new_v4(),
        email: "user@example.com".to_string(),
        attributes: initial_attributes(Plan::Starter, Some("cus_test123")),
    };
    overrides(&mut account);
    account
}

/// Create a paid checkout session with sensible defaults.
pub fn create_test_checkout_session(
    overrides: impl FnOnce(&mut CheckoutSession),
) -> CheckoutSession {
    let mut session = CheckoutSession {
        id: "cs_test_default".to_string(),
        payment_status: CheckoutPaymentStatus::Paid,
        customer_email: Some("user@example.com".to_string()),
    };
    overrides(&mut session);
    session
}

/// Raw body of a `checkout.session.completed` webhook, as the provider sends it.
pub fn checkout_completed_payload(
    event_id: &str,
    session_id: &str,
    email: &str,
    plan: &str,
) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": event_id,
        "object": "event",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "object": "checkout.session",
                "customer": "cus_test123",
                "customer_details": { "email": email },
                "metadata": { "plan": plan },
                "payment_status": "paid"
            }
        }
    }))
    .unwrap()
}
