//! Turns an authenticated billing event into the one action billing takes.

use crate::{
    application::validators::is_valid_email,
    domain::entities::{
        billing_event::{BillingEvent, BillingEventKind, CheckoutSessionObject},
        plan::Plan,
    },
};

/// Fields of a completed checkout needed for provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCompleted {
    pub event_id: String,
    pub session_id: String,
    pub email: String,
    pub payment_customer_reference: Option<String>,
    /// Raw plan name, `"Pro"` when the checkout carried none.
    pub plan_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Provision(CheckoutCompleted),
    /// A kind billing does not act on. Still acknowledged to the provider.
    Ignore { kind: BillingEventKind },
    /// Required data is missing. Redelivery cannot fix it, so it is
    /// acknowledged and logged.
    Malformed { reason: String },
}

pub fn classify(event: &BillingEvent) -> Classification {
    let kind = event.kind();
    if kind != BillingEventKind::CheckoutCompleted {
        return Classification::Ignore { kind };
    }

    let session: CheckoutSessionObject = match serde_json::from_value(event.data.object.clone())
    {
        Ok(session) => session,
        Err(e) => {
            return Classification::Malformed {
                reason: format!("undecodable checkout session: {e}"),
            };
        }
    };

    let Some(session_id) = non_empty(session.id) else {
        return Classification::Malformed {
            reason: "checkout session has no id".into(),
        };
    };

    let email = non_empty(session.customer_details.and_then(|d| d.email))
        .or_else(|| non_empty(session.customer_email));
    let Some(email) = email else {
        return Classification::Malformed {
            reason: format!("checkout session {session_id} has no customer email"),
        };
    };

    // The identity store would reject it on every redelivery.
    if !is_valid_email(&email) {
        return Classification::Malformed {
            reason: format!("checkout session {session_id} has an invalid customer email"),
        };
    }

    let plan_name = non_empty(session.metadata.and_then(|mut m| m.remove("plan")))
        .unwrap_or_else(|| Plan::DEFAULT.as_str().to_string());

    Classification::Provision(CheckoutCompleted {
        event_id: event.id.clone(),
        session_id,
        email,
        payment_customer_reference: non_empty(session.customer),
        plan_name,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
