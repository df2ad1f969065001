//! In-memory identity store.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use super::take_failure;
use crate::{
    app_error::{AppError, AppResult},
    application::ports::identity_store::{IdentitySession, IdentityStore},
    domain::entities::account::{
        Account, AttributeBag, NewAccount, merge_attributes, normalize_email,
    },
};

/// Credential given to accounts seeded through `with_accounts`.
pub const SEEDED_CREDENTIAL: &str = "cs_seeded_bootstrap";

struct StoredAccount {
    account: Account,
    credential: String,
    confirmed: bool,
}

/// Keyed by normalized email, so at most one account exists per address.
/// Attribute updates merge key by key, like the hosted store.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    accounts: Mutex<HashMap<String, StoredAccount>>,
    find_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    set_credential_calls: AtomicUsize,
    sign_in_calls: AtomicUsize,
    failing_finds: AtomicUsize,
    failing_creates: AtomicUsize,
    failing_updates: AtomicUsize,
    failing_sign_ins: AtomicUsize,
    rejecting_creates: AtomicUsize,
    concurrent_create: Mutex<Option<String>>,
    deleted_before_update: Mutex<Option<String>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        let store = Self::default();
        {
            let mut map = store.accounts.lock().unwrap();
            for account in accounts {
                map.insert(
                    normalize_email(&account.email),
                    StoredAccount {
                        account,
                        credential: SEEDED_CREDENTIAL.to_string(),
                        confirmed: true,
                    },
                );
            }
        }
        store
    }

    pub fn account_by_email(&self, email: &str) -> Option<Account> {
        self.accounts
            .lock()
            .unwrap()
            .get(&normalize_email(email))
            .map(|s| s.account.clone())
    }

    pub fn credential_of(&self, email: &str) -> Option<String> {
        self.accounts
            .lock()
            .unwrap()
            .get(&normalize_email(email))
            .map(|s| s.credential.clone())
    }

    pub fn is_confirmed(&self, email: &str) -> bool {
        self.accounts
            .lock()
            .unwrap()
            .get(&normalize_email(email))
            .is_some_and(|s| s.confirmed)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn set_credential_calls(&self) -> usize {
        self.set_credential_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.find_calls()
            + self.create_calls()
            + self.update_calls()
            + self.set_credential_calls()
            + self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub fn fail_next_finds(&self, n: usize) {
        self.failing_finds.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_creates(&self, n: usize) {
        self.failing_creates.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_updates(&self, n: usize) {
        self.failing_updates.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_sign_ins(&self, n: usize) {
        self.failing_sign_ins.store(n, Ordering::SeqCst);
    }

    /// The next `n` creates are refused outright, as the hosted store does for
    /// an address it will not accept.
    pub fn reject_next_creates(&self, n: usize) {
        self.rejecting_creates.store(n, Ordering::SeqCst);
    }

    /// The account for `email` is deleted just before the next attribute
    /// update reaches the store.
    pub fn delete_before_next_update(&self, email: &str) {
        *self.deleted_before_update.lock().unwrap() = Some(normalize_email(email));
    }

    /// The next create for `email` loses a race: another writer inserts the
    /// account first and the create is rejected as a duplicate.
    pub fn simulate_concurrent_create(&self, email: &str) {
        *self.concurrent_create.lock().unwrap() = Some(normalize_email(email));
    }

    fn with_account_by_id<T>(
        &self,
        account_id: Uuid,
        f: impl FnOnce(&mut StoredAccount) -> T,
    ) -> AppResult<T> {
        let mut accounts = self.accounts.lock().unwrap();
        accounts
            .values_mut()
            .find(|s| s.account.id == account_id)
            .map(f)
            .ok_or(AppError::NotFound)
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_account_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failing_finds) {
            return Err(AppError::Upstream("identity store unreachable".into()));
        }
        let found = self.account_by_email(email);
        // Let a concurrent caller run between lookup and whatever follows it.
        tokio::task::yield_now().await;
        Ok(found)
    }

    async fn create_account(&self, new_account: NewAccount) -> AppResult<Account> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failing_creates) {
            return Err(AppError::Upstream("identity store unreachable".into()));
        }
        if take_failure(&self.rejecting_creates) {
            return Err(AppError::InvalidInput(
                "Identity store rejected request: 422 Unprocessable Entity".into(),
            ));
        }
        let key = normalize_email(&new_account.email);
        let mut accounts = self.accounts.lock().unwrap();

        let raced = {
            let mut pending = self.concurrent_create.lock().unwrap();
            if pending.as_deref() == Some(key.as_str()) {
                pending.take()
            } else {
                None
            }
        };
        if raced.is_some() {
            accounts.insert(
                key.clone(),
                StoredAccount {
                    account: Account {
                        id: Uuid::new_v4(),
                        email: key,
                        attributes: new_account.attributes.clone(),
                    },
                    credential: "cs_other_writer".to_string(),
                    confirmed: true,
                },
            );
            return Err(AppError::DuplicateEmail);
        }

        if accounts.contains_key(&key) {
            return Err(AppError::DuplicateEmail);
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: key.clone(),
            attributes: new_account.attributes,
        };
        accounts.insert(
            key,
            StoredAccount {
                account: account.clone(),
                credential: new_account.credential.expose_secret().to_string(),
                confirmed: true,
            },
        );
        Ok(account)
    }

    async fn update_account_attributes(
        &self,
        account_id: Uuid,
        patch: AttributeBag,
    ) -> AppResult<Account> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failing_updates) {
            return Err(AppError::Upstream("identity store unreachable".into()));
        }
        if let Some(email) = self.deleted_before_update.lock().unwrap().take() {
            self.accounts.lock().unwrap().remove(&email);
        }
        self.with_account_by_id(account_id, |stored| {
            merge_attributes(&mut stored.account.attributes, &patch);
            stored.account.clone()
        })
    }

    async fn set_credential(&self, account_id: Uuid, password: &SecretString) -> AppResult<()> {
        self.set_credential_calls.fetch_add(1, Ordering::SeqCst);
        self.with_account_by_id(account_id, |stored| {
            stored.credential = password.expose_secret().to_string();
        })
    }

    async fn sign_in(&self, email: &str, password: &SecretString) -> AppResult<IdentitySession> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failing_sign_ins) {
            return Err(AppError::Upstream("identity store unreachable".into()));
        }
        let accounts = self.accounts.lock().unwrap();
        let stored = accounts
            .get(&normalize_email(email))
            .filter(|s| s.credential == password.expose_secret())
            .ok_or(AppError::InvalidCredentials)?;
        Ok(IdentitySession {
            access_token: SecretString::new(format!("access-{}", stored.account.id).into()),
            refresh_token: SecretString::new(format!("refresh-{}", stored.account.id).into()),
            expires_in: 3600,
        })
    }
}
