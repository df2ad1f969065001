use serde::{Deserialize, Serialize};

/// Payment status of a checkout session, as reported by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
    #[serde(other)]
    Unknown,
}

impl CheckoutPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutPaymentStatus::Paid => "paid",
            CheckoutPaymentStatus::Unpaid => "unpaid",
            CheckoutPaymentStatus::NoPaymentRequired => "no_payment_required",
            CheckoutPaymentStatus::Unknown => "unknown",
        }
    }

    /// Only a settled payment authorizes credential activation.
    pub fn is_paid(&self) -> bool {
        matches!(self, CheckoutPaymentStatus::Paid)
    }
}

impl std::fmt::Display for CheckoutPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only view of a provider checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub payment_status: CheckoutPaymentStatus,
    pub customer_email: Option<String>,
}
