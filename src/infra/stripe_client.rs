use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_provider::{CheckoutRedirect, CheckoutRequest, PaymentProviderPort},
    domain::entities::checkout_session::{CheckoutPaymentStatus, CheckoutSession},
    infra::http_client::SharedHttpClient,
};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Clone)]
pub struct StripeClient {
    http: Arc<SharedHttpClient>,
    secret_key: SecretString,
}

impl StripeClient {
    pub fn new(http: Arc<SharedHttpClient>, secret_key: SecretString) -> Self {
        Self {
            http,
            secret_key,
        }
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.secret_key.expose_secret()));
        format!("Basic {}", encoded)
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to read Stripe response: {}", e)))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Stripe API error");
            return Err(map_error_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse Stripe response");
            AppError::Upstream(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

#[async_trait]
impl PaymentProviderPort for StripeClient {
    async fn retrieve_checkout_session(&self, session_id: &str) -> AppResult<CheckoutSession> {
        let response = self
            .http
            .get()?
            .get(session_url(session_id))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe request failed: {}", e)))?;

        let session: StripeCheckoutSession = self.handle_response(response).await?;
        Ok(session.into())
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> AppResult<CheckoutRedirect> {
        let response = self
            .http
            .get()?
            .post(format!("{}/checkout/sessions", STRIPE_API_BASE))
            .header("Authorization", self.auth_header())
            .form(&checkout_form_params(request))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe request failed: {}", e)))?;

        let session: StripeCheckoutSession = self.handle_response(response).await?;
        let url = session
            .url
            .ok_or_else(|| AppError::Upstream("Stripe returned a checkout session without url".into()))?;
        Ok(CheckoutRedirect {
            session_id: session.id,
            url,
        })
    }
}

/// Session ids come from request bodies, so the path segment is encoded.
fn session_url(session_id: &str) -> String {
    let segment: String = url::form_urlencoded::byte_serialize(session_id.as_bytes()).collect();
    format!("{}/checkout/sessions/{}", STRIPE_API_BASE, segment)
}

fn checkout_form_params(request: &CheckoutRequest) -> Vec<(&'static str, String)> {
    vec![
        ("mode", "subscription".to_string()),
        ("payment_method_types[0]", "card".to_string()),
        ("customer_email", request.email.clone()),
        ("line_items[0][price]", request.price_id.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        ("metadata[plan]", request.plan.as_str().to_string()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
    ]
}

/// 404 is a definite "no such session"; 429 and 5xx are transient; any other
/// 4xx means the request itself was rejected.
fn map_error_status(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<StripeErrorResponse>(body)
        .ok()
        .and_then(|e| e.error.message.or(Some(e.error.error_type)))
        .unwrap_or_else(|| status.to_string());

    if status == StatusCode::NOT_FOUND {
        AppError::NotFound
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        AppError::Upstream(format!("Stripe error: {}", message))
    } else {
        AppError::InvalidInput(format!("Stripe error: {}", message))
    }
}

// ============================================================================
// Stripe Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
    payment_status: CheckoutPaymentStatus,
    customer_email: Option<String>,
    customer_details: Option<StripeCustomerDetails>,
}

#[derive(Debug, Deserialize)]
struct StripeCustomerDetails {
    email: Option<String>,
}

impl From<StripeCheckoutSession> for CheckoutSession {
    fn from(session: StripeCheckoutSession) -> Self {
        let customer_email = session
            .customer_details
            .and_then(|d| d.email)
            .or(session.customer_email)
            .filter(|e| !e.trim().is_empty());
        CheckoutSession {
            id: session.id,
            payment_status: session.payment_status,
            customer_email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    #[serde(rename = "type")]
    error_type: String,
    message: Option<String>,
}
