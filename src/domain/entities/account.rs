use secrecy::SecretString;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::plan::{CreditGrant, Plan};

/// Keys of the per-account attribute bag written by billing.
pub mod attr {
    pub const PLAN: &str = "plan";
    pub const PAYMENT_CUSTOMER_REFERENCE: &str = "payment_customer_reference";
    pub const SEARCH_CREDITS_REMAINING: &str = "search_credits_remaining";
    pub const REVEAL_CREDITS_REMAINING: &str = "reveal_credits_remaining";
    /// Owned by the application, never written by a billing update.
    pub const SAVED_CONTACTS: &str = "saved_contacts";
}

pub type AttributeBag = Map<String, Value>;

/// An account as held by the identity store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub attributes: AttributeBag,
}

impl Account {
    pub fn plan(&self) -> Option<&str> {
        self.attributes.get(attr::PLAN).and_then(Value::as_str)
    }

    pub fn payment_customer_reference(&self) -> Option<&str> {
        self.attributes
            .get(attr::PAYMENT_CUSTOMER_REFERENCE)
            .and_then(Value::as_str)
    }

    /// Remaining credits, if both balances are present and numeric.
    pub fn credits(&self) -> Option<CreditGrant> {
        let search = self.attributes.get(attr::SEARCH_CREDITS_REMAINING)?.as_u64()?;
        let reveal = self.attributes.get(attr::REVEAL_CREDITS_REMAINING)?.as_u64()?;
        Some(CreditGrant {
            search_credits: u32::try_from(search).ok()?,
            reveal_credits: u32::try_from(reveal).ok()?,
        })
    }

    pub fn saved_contacts(&self) -> Option<&Vec<Value>> {
        self.attributes
            .get(attr::SAVED_CONTACTS)
            .and_then(Value::as_array)
    }
}

/// Input for creating a brand-new account.
#[derive(Debug)]
pub struct NewAccount {
    pub email: String,
    /// Bootstrap credential, replaced when the user activates the account.
    pub credential: SecretString,
    pub attributes: AttributeBag,
}

/// Canonical form used for equality between emails.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn emails_match(a: &str, b: &str) -> bool {
    normalize_email(a) == normalize_email(b)
}

/// Merge patch applied on every billing activation.
///
/// Contains only the billing-owned keys. Everything else in the bag, including
/// `saved_contacts`, is left to the store's merge and stays untouched.
pub fn billing_patch(plan: Plan, payment_customer_reference: Option<&str>) -> AttributeBag {
    let grant = plan.credit_grant();
    let mut patch = Map::new();
    patch.insert(attr::PLAN.into(), Value::from(plan.as_str()));
    patch.insert(
        attr::PAYMENT_CUSTOMER_REFERENCE.into(),
        payment_customer_reference.map_or(Value::Null, Value::from),
    );
    patch.insert(
        attr::SEARCH_CREDITS_REMAINING.into(),
        Value::from(grant.search_credits),
    );
    patch.insert(
        attr::REVEAL_CREDITS_REMAINING.into(),
        Value::from(grant.reveal_credits),
    );
    patch
}

/// Attribute bag for a freshly created account.
pub fn initial_attributes(plan: Plan, payment_customer_reference: Option<&str>) -> AttributeBag {
    let mut bag = billing_patch(plan, payment_customer_reference);
    bag.insert(attr::SAVED_CONTACTS.into(), Value::Array(Vec::new()));
    bag
}

/// Apply `patch` on top of `bag`, key by key.
pub fn merge_attributes(bag: &mut AttributeBag, patch: &AttributeBag) {
    for (key, value) in patch {
        bag.insert(key.clone(), value.clone());
    }
}
