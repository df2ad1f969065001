use std::{str::FromStr, sync::Arc};

use tracing::instrument;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_provider::{CheckoutRedirect, CheckoutRequest, PaymentProviderPort},
        validators::is_valid_email,
    },
    domain::entities::{account::normalize_email, plan::Plan},
};

/// Placeholder the provider replaces with the real session id on redirect.
const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Provider price id configured for each plan.
#[derive(Debug, Clone, Default)]
pub struct PlanPrices {
    pub starter: Option<String>,
    pub pro: Option<String>,
    pub enterprise: Option<String>,
}

impl PlanPrices {
    pub fn price_for(&self, plan: Plan) -> Option<&str> {
        match plan {
            Plan::Starter => self.starter.as_deref(),
            Plan::Pro => self.pro.as_deref(),
            Plan::Enterprise => self.enterprise.as_deref(),
        }
    }
}

#[derive(Clone)]
pub struct CheckoutUseCases {
    payment: Arc<dyn PaymentProviderPort>,
    prices: PlanPrices,
    app_origin: Url,
}

impl CheckoutUseCases {
    pub fn new(payment: Arc<dyn PaymentProviderPort>, prices: PlanPrices, app_origin: Url) -> Self {
        Self {
            payment,
            prices,
            app_origin,
        }
    }

    /// Start a hosted subscription checkout. The completed session later
    /// arrives at the billing webhook carrying the plan in its metadata.
    #[instrument(skip(self))]
    pub async fn start_checkout(&self, email: &str, plan_name: &str) -> AppResult<CheckoutRedirect> {
        if !is_valid_email(email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }
        let plan = Plan::from_str(plan_name.trim())
            .map_err(|_| AppError::InvalidInput(format!("Unknown plan: {plan_name}")))?;

        let price_id = self.prices.price_for(plan).ok_or_else(|| {
            tracing::error!(%plan, "No price configured for plan");
            AppError::Internal(format!("no price configured for plan {plan}"))
        })?;

        let email = normalize_email(email);
        let request = CheckoutRequest {
            success_url: self.success_url(&email),
            cancel_url: self.page_url("/checkout"),
            email,
            plan,
            price_id: price_id.to_string(),
        };

        let redirect = self.payment.create_checkout_session(&request).await?;
        tracing::info!(session_id = %redirect.session_id, %plan, "Checkout session created");
        Ok(redirect)
    }

    fn success_url(&self, email: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("email", email)
            .finish();
        // The placeholder must stay unescaped for the provider to substitute it.
        format!(
            "{}?{}&session_id={}",
            self.page_url("/set-password"),
            query,
            SESSION_ID_PLACEHOLDER
        )
    }

    fn page_url(&self, path: &str) -> String {
        format!("{}{}", self.app_origin.as_str().trim_end_matches('/'), path)
    }
}
