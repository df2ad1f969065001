use secrecy::SecretString;
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        event_classifier::{Classification, classify},
        provisioning::{ProvisionOutcome, ProvisionRequest, ProvisioningUseCases},
    },
    domain::entities::billing_event::{BillingEvent, BillingEventKind},
    infra::webhook_signature::WebhookSignatureVerifier,
};

/// What happened to an inbound billing webhook that passed the signature gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Provisioned {
        event_id: String,
        outcome: ProvisionOutcome,
    },
    Ignored {
        event_id: String,
        kind: BillingEventKind,
    },
    Malformed {
        event_id: Option<String>,
        reason: String,
    },
}

/// Signature gate, classifier and provisioner, in that order.
pub struct BillingWebhookUseCases {
    verifier: WebhookSignatureVerifier,
    provisioning: ProvisioningUseCases,
}

impl BillingWebhookUseCases {
    pub fn new(verifier: WebhookSignatureVerifier, provisioning: ProvisioningUseCases) -> Self {
        Self {
            verifier,
            provisioning,
        }
    }

    /// `payload` must be the unmodified request body.
    #[instrument(skip(self, payload, signature), fields(payload_len = payload.len()))]
    pub async fn handle(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> AppResult<WebhookOutcome> {
        let Some(signature) = signature else {
            tracing::warn!(security_event = true, "Webhook rejected: missing signature header");
            return Err(AppError::InvalidSignature("missing signature header".into()));
        };

        if let Err(e) = self.verifier.verify(payload, signature) {
            tracing::warn!(security_event = true, error = %e, "Webhook rejected");
            return Err(e);
        }

        let event = match BillingEvent::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "Verified webhook payload could not be decoded");
                return Ok(WebhookOutcome::Malformed {
                    event_id: None,
                    reason: e.to_string(),
                });
            }
        };

        match classify(&event) {
            Classification::Ignore { kind } => {
                tracing::debug!(event_id = %event.id, %kind, "Ignoring billing event");
                Ok(WebhookOutcome::Ignored {
                    event_id: event.id,
                    kind,
                })
            }
            Classification::Malformed { reason } => {
                tracing::error!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    %reason,
                    retryable = false,
                    "Malformed billing event acknowledged without processing"
                );
                Ok(WebhookOutcome::Malformed {
                    event_id: Some(event.id),
                    reason,
                })
            }
            Classification::Provision(checkout) => {
                tracing::info!(
                    event_id = %checkout.event_id,
                    session_id = %checkout.session_id,
                    plan = %checkout.plan_name,
                    customer = ?checkout.payment_customer_reference,
                    "Checkout completed"
                );
                let outcome = self
                    .provisioning
                    .provision(ProvisionRequest {
                        email: checkout.email,
                        plan_name: checkout.plan_name,
                        payment_customer_reference: checkout.payment_customer_reference,
                        bootstrap_credential: SecretString::new(checkout.session_id.into()),
                    })
                    .await?;
                tracing::info!(
                    event_id = %checkout.event_id,
                    account_id = %outcome.account_id(),
                    outcome = outcome.as_str(),
                    "Billing event provisioned"
                );
                Ok(WebhookOutcome::Provisioned {
                    event_id: checkout.event_id,
                    outcome,
                })
            }
        }
    }
}
