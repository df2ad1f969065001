use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::{
            identity_store::{IdentitySession, IdentityStore},
            payment_provider::PaymentProviderPort,
        },
        validators::{
            MIN_PASSWORD_LEN, is_acceptable_password, is_valid_checkout_session_id,
            is_valid_email,
        },
    },
    domain::entities::account::{emails_match, normalize_email},
};

/// Turns a paid checkout session into a usable login.
///
/// The payment status check is the only authorization: without it anyone who
/// knows a customer's email could set that account's password. This gate
/// never creates accounts; the billing webhook must have provisioned one.
#[derive(Clone)]
pub struct ActivationUseCases {
    payment: Arc<dyn PaymentProviderPort>,
    identity: Arc<dyn IdentityStore>,
}

impl ActivationUseCases {
    pub fn new(payment: Arc<dyn PaymentProviderPort>, identity: Arc<dyn IdentityStore>) -> Self {
        Self { payment, identity }
    }

    #[instrument(skip(self, password), fields(email = %email, session_id = %session_id))]
    pub async fn activate(
        &self,
        email: &str,
        password: SecretString,
        session_id: &str,
    ) -> AppResult<IdentitySession> {
        if !is_valid_email(email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }
        if !is_acceptable_password(password.expose_secret()) {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(AppError::InvalidInput("Missing checkout session id".into()));
        }
        if !is_valid_checkout_session_id(session_id) {
            return Err(AppError::InvalidInput("Invalid checkout session id".into()));
        }
        let email = normalize_email(email);

        let session = match self.payment.retrieve_checkout_session(session_id).await {
            Ok(session) => session,
            Err(AppError::NotFound) => {
                tracing::warn!(security_event = true, "Activation with unknown checkout session");
                return Err(AppError::PaymentNotVerified);
            }
            Err(e) => return Err(e),
        };

        if !session.payment_status.is_paid() {
            tracing::warn!(
                security_event = true,
                payment_status = %session.payment_status,
                "Activation refused: checkout session not paid"
            );
            return Err(AppError::PaymentNotVerified);
        }

        if let Some(session_email) = session.customer_email.as_deref()
            && !emails_match(session_email, &email)
        {
            tracing::warn!(
                security_event = true,
                "Activation refused: email does not match checkout session"
            );
            return Err(AppError::PaymentNotVerified);
        }

        let account = self
            .identity
            .find_account_by_email(&email)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Paid session but no provisioned account");
                AppError::AccountNotProvisioned
            })?;

        self.identity.set_credential(account.id, &password).await?;
        tracing::info!(account_id = %account.id, "Credential set");

        match self.identity.sign_in(&email, &password).await {
            Ok(session) => {
                tracing::info!(account_id = %account.id, "Account activated");
                Ok(session)
            }
            Err(e) => {
                tracing::error!(account_id = %account.id, error = %e, "Sign-in after credential set failed");
                Err(AppError::SessionNotIssued)
            }
        }
    }
}
