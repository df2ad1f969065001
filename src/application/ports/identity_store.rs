use async_trait::async_trait;
use secrecy::SecretString;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    domain::entities::account::{Account, AttributeBag, NewAccount},
};

/// Session minted by the identity store after a successful sign-in.
#[derive(Debug)]
pub struct IdentitySession {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// The hosted identity/record store that owns accounts.
///
/// Implementations must enforce one account per email (compared
/// case-insensitively) and must merge attribute patches key by key rather than
/// replacing the whole bag.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Direct lookup by email, case-insensitive.
    async fn find_account_by_email(&self, email: &str) -> AppResult<Option<Account>>;

    /// Fails with `AppError::DuplicateEmail` if the email is already taken.
    async fn create_account(&self, account: NewAccount) -> AppResult<Account>;

    async fn update_account_attributes(
        &self,
        account_id: Uuid,
        patch: AttributeBag,
    ) -> AppResult<Account>;

    async fn set_credential(&self, account_id: Uuid, password: &SecretString) -> AppResult<()>;

    /// Fails with `AppError::InvalidCredentials` on a wrong password.
    async fn sign_in(&self, email: &str, password: &SecretString) -> AppResult<IdentitySession>;
}
