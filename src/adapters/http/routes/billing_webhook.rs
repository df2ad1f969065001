//! Payment provider webhook endpoint.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;

use crate::{
    adapters::http::{app_error_impl::ERROR_CODE_HEADER, app_state::AppState},
    app_error::AppError,
    application::use_cases::billing_webhook::{BillingWebhookUseCases, WebhookOutcome},
};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(handle_webhook))
}

/// POST /api/billing/webhook
///
/// The body is taken as raw bytes: the signature covers the exact payload.
/// Everything that passed the signature gate is acknowledged with 200 unless
/// a redelivery could succeed, in which case the provider gets a 500.
async fn handle_webhook(
    State(use_cases): State<Arc<BillingWebhookUseCases>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match use_cases.handle(&body, signature).await {
        Ok(outcome) => {
            match &outcome {
                WebhookOutcome::Provisioned { event_id, outcome } => {
                    tracing::info!(%event_id, outcome = outcome.as_str(), "Webhook processed");
                }
                WebhookOutcome::Ignored { event_id, kind } => {
                    tracing::debug!(%event_id, %kind, "Webhook acknowledged without action");
                }
                WebhookOutcome::Malformed { event_id, reason } => {
                    tracing::error!(?event_id, %reason, "Malformed webhook acknowledged");
                }
            }
            acknowledge()
        }
        Err(e @ AppError::InvalidSignature(_)) => e.into_response(),
        Err(e) if e.is_retryable() => {
            tracing::error!(
                error = %e,
                retryable = true,
                "Webhook processing failed, returning 500 for provider retry"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(ERROR_CODE_HEADER, HeaderValue::from_static(e.code().as_str()))],
                "Webhook processing failed",
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                retryable = false,
                "Webhook processing failed permanently, acknowledging"
            );
            acknowledge()
        }
    }
}

fn acknowledge() -> Response {
    Json(json!({ "received": true })).into_response()
}
