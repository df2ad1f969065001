use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Provider event type for a finished checkout.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEventKind {
    CheckoutCompleted,
    Other(String),
}

impl BillingEventKind {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            CHECKOUT_COMPLETED => BillingEventKind::CheckoutCompleted,
            other => BillingEventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BillingEventKind::CheckoutCompleted => CHECKOUT_COMPLETED,
            BillingEventKind::Other(s) => s,
        }
    }
}

impl std::fmt::Display for BillingEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authenticated event envelope. Lives for one request only.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: BillingEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingEventData {
    pub object: Value,
}

impl BillingEvent {
    pub fn from_slice(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    pub fn kind(&self) -> BillingEventKind {
        BillingEventKind::from_type(&self.event_type)
    }
}

/// The subset of a checkout session object that billing reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: Option<String>,
    pub customer: Option<String>,
    pub customer_email: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
}
