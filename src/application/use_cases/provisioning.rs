use std::sync::Arc;

use secrecy::SecretString;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::identity_store::IdentityStore,
    domain::entities::{
        account::{Account, NewAccount, billing_patch, initial_attributes, normalize_email},
        plan::Plan,
    },
};

/// Everything needed to bring one account in line with a completed checkout.
#[derive(Debug)]
pub struct ProvisionRequest {
    pub email: String,
    pub plan_name: String,
    pub payment_customer_reference: Option<String>,
    /// Checkout session id, used as the placeholder credential of a new account.
    pub bootstrap_credential: SecretString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created { account_id: Uuid },
    Updated { account_id: Uuid },
}

impl ProvisionOutcome {
    pub fn account_id(&self) -> Uuid {
        match self {
            ProvisionOutcome::Created { account_id } | ProvisionOutcome::Updated { account_id } => {
                *account_id
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionOutcome::Created { .. } => "created",
            ProvisionOutcome::Updated { .. } => "updated",
        }
    }
}

/// Idempotent create-or-update of the account behind a billing event.
///
/// Every call for the same arguments converges on the same account state:
/// credits are reset to the plan's grant (never incremented) and the attribute
/// bag is merged, so application-owned keys such as `saved_contacts` survive.
#[derive(Clone)]
pub struct ProvisioningUseCases {
    identity: Arc<dyn IdentityStore>,
}

impl ProvisioningUseCases {
    pub fn new(identity: Arc<dyn IdentityStore>) -> Self {
        Self { identity }
    }

    #[instrument(skip(self, request), fields(email = %request.email, plan = %request.plan_name))]
    pub async fn provision(&self, request: ProvisionRequest) -> AppResult<ProvisionOutcome> {
        let plan = Plan::resolve(&request.plan_name);
        let email = normalize_email(&request.email);
        let customer_ref = request.payment_customer_reference.as_deref();

        if plan.as_str() != request.plan_name.trim() {
            tracing::warn!(
                requested = %request.plan_name,
                resolved = %plan,
                "Plan name not recognized verbatim, using resolved plan"
            );
        }

        if let Some(existing) = self.find_with_retry(&email).await? {
            match self.apply_billing(&existing, plan, customer_ref).await {
                Ok(account) => {
                    return Ok(ProvisionOutcome::Updated {
                        account_id: account.id,
                    });
                }
                Err(AppError::NotFound) => {
                    // Deleted between lookup and update; provision it afresh.
                    tracing::warn!(
                        account_id = %existing.id,
                        "Account disappeared before billing update, recreating"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let new_account = NewAccount {
            email: email.clone(),
            credential: request.bootstrap_credential,
            attributes: initial_attributes(plan, customer_ref),
        };

        match self.identity.create_account(new_account).await {
            Ok(account) => {
                tracing::info!(account_id = %account.id, %plan, "Account created");
                Ok(ProvisionOutcome::Created {
                    account_id: account.id,
                })
            }
            Err(AppError::DuplicateEmail) => {
                // A concurrent delivery created the account between our lookup
                // and create. Converge on the update path instead.
                tracing::info!(resolution = "ConflictResolved", "Account created concurrently");
                let existing = self.find_with_retry(&email).await?.ok_or_else(|| {
                    AppError::Upstream(
                        "identity store rejected a duplicate email it cannot find".into(),
                    )
                })?;
                let account = self
                    .apply_billing(&existing, plan, customer_ref)
                    .await
                    .map_err(|e| match e {
                        AppError::NotFound => AppError::Upstream(
                            "account changed concurrently during provisioning".into(),
                        ),
                        other => other,
                    })?;
                Ok(ProvisionOutcome::Updated {
                    account_id: account.id,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn apply_billing(
        &self,
        existing: &Account,
        plan: Plan,
        customer_ref: Option<&str>,
    ) -> AppResult<Account> {
        let account = self
            .identity
            .update_account_attributes(existing.id, billing_patch(plan, customer_ref))
            .await?;
        tracing::info!(account_id = %account.id, %plan, "Account billing attributes updated");
        Ok(account)
    }

    /// Lookup retried once on a transient failure.
    async fn find_with_retry(&self, email: &str) -> AppResult<Option<Account>> {
        match self.identity.find_account_by_email(email).await {
            Err(e) if e.is_retryable() => {
                tracing::warn!(error = %e, "Account lookup failed, retrying once");
                self.identity.find_account_by_email(email).await
            }
            other => other,
        }
    }
}
