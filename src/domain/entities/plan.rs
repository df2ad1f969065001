use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Subscription tier sold at checkout.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Plan {
    Starter,
    Pro,
    Enterprise,
}

/// Credits granted when a plan is activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditGrant {
    pub search_credits: u32,
    pub reveal_credits: u32,
}

impl Plan {
    /// Plan applied when the checkout carried no plan, or one we do not sell.
    pub const DEFAULT: Plan = Plan::Pro;

    /// Resolve a raw plan name from checkout metadata.
    ///
    /// Matching ignores ASCII case and surrounding whitespace, so `"starter"`
    /// earns the Starter grant. An exact-key lookup would treat it as unknown
    /// and hand out the Pro grant instead. Empty and unknown names resolve to
    /// [`Plan::DEFAULT`] instead of failing.
    pub fn resolve(raw: &str) -> Plan {
        raw.trim().parse().unwrap_or(Plan::DEFAULT)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Starter => "Starter",
            Plan::Pro => "Pro",
            Plan::Enterprise => "Enterprise",
        }
    }

    pub fn credit_grant(&self) -> CreditGrant {
        match self {
            Plan::Starter => CreditGrant {
                search_credits: 100,
                reveal_credits: 50,
            },
            Plan::Pro => CreditGrant {
                search_credits: 500,
                reveal_credits: 250,
            },
            Plan::Enterprise => CreditGrant {
                search_credits: 2500,
                reveal_credits: 1500,
            },
        }
    }
}

impl Default for Plan {
    fn default() -> Self {
        Plan::DEFAULT
    }
}
