//! Identity store adapter for a hosted GoTrue (Supabase Auth) instance.
//!
//! Admin endpoints authenticate with the service-role key; password sign-in
//! uses the public anon key. Account attributes live in `user_metadata`, which
//! GoTrue merges key by key on update.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use url::Url;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::identity_store::{IdentitySession, IdentityStore},
    domain::entities::account::{Account, AttributeBag, NewAccount, emails_match},
    infra::http_client::SharedHttpClient,
};

/// Users requested per page of a filtered lookup.
const LOOKUP_PAGE_SIZE: usize = 100;

/// Upper bound on pages walked by one lookup.
const MAX_LOOKUP_PAGES: usize = 200;

pub struct GoTrueClient {
    http: Arc<SharedHttpClient>,
    base_url: Url,
    service_key: SecretString,
    anon_key: SecretString,
}

impl GoTrueClient {
    pub fn new(
        http: Arc<SharedHttpClient>,
        base_url: Url,
        service_key: SecretString,
        anon_key: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            service_key,
            anon_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/auth/v1{}",
            self.base_url.as_str().trim_end_matches('/'),
            path
        )
    }

    fn admin(&self, builder: RequestBuilder) -> RequestBuilder {
        let key = self.service_key.expose_secret();
        builder
            .header("apikey", key)
            .header("Authorization", format!("Bearer {}", key))
    }

    async fn send(&self, builder: RequestBuilder) -> AppResult<(StatusCode, String)> {
        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Identity store request failed: {}", e)))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::Upstream(format!("Failed to read identity store response: {}", e))
        })?;
        Ok((status, body))
    }

    async fn list_users_page(&self, email: &str, page: usize) -> AppResult<Vec<GoTrueUser>> {
        let request = self
            .http
            .get()?
            .get(self.endpoint("/admin/users"))
            .query(&[
                ("filter", email.to_string()),
                ("page", page.to_string()),
                ("per_page", LOOKUP_PAGE_SIZE.to_string()),
            ]);
        let (status, body) = self.send(self.admin(request)).await?;
        let list: GoTrueUserList = parse_success(status, &body)?;
        Ok(list.users)
    }

    async fn update_user(&self, account_id: Uuid, body: serde_json::Value) -> AppResult<GoTrueUser> {
        let request = self
            .http
            .get()?
            .put(self.endpoint(&format!("/admin/users/{}", account_id)))
            .json(&body);
        let (status, body) = self.send(self.admin(request)).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound);
        }
        parse_success(status, &body)
    }
}

#[async_trait]
impl IdentityStore for GoTrueClient {
    async fn find_account_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        // `filter` is a substring match, so the exact address can sit on any
        // page behind accounts that merely contain it.
        for page in 1..=MAX_LOOKUP_PAGES {
            let users = self.list_users_page(email, page).await?;
            let page_len = users.len();
            if let Some(user) = pick_exact_match(users, email) {
                return Ok(Some(user.into()));
            }
            if page_len < LOOKUP_PAGE_SIZE {
                return Ok(None);
            }
        }
        tracing::error!(pages = MAX_LOOKUP_PAGES, "Account lookup did not reach the last page");
        Err(AppError::Upstream(
            "identity store lookup exceeded page limit".into(),
        ))
    }

    async fn create_account(&self, account: NewAccount) -> AppResult<Account> {
        let request = self
            .http
            .get()?
            .post(self.endpoint("/admin/users"))
            .json(&json!({
                "email": account.email,
                "password": account.credential.expose_secret(),
                "email_confirm": true,
                "user_metadata": account.attributes,
            }));
        let (status, body) = self.send(self.admin(request)).await?;

        if is_duplicate_email(status, &body) {
            return Err(AppError::DuplicateEmail);
        }
        let user: GoTrueUser = parse_success(status, &body)?;
        Ok(user.into())
    }

    async fn update_account_attributes(
        &self,
        account_id: Uuid,
        patch: AttributeBag,
    ) -> AppResult<Account> {
        let user = self
            .update_user(account_id, json!({ "user_metadata": patch }))
            .await?;
        Ok(user.into())
    }

    async fn set_credential(&self, account_id: Uuid, password: &SecretString) -> AppResult<()> {
        self.update_user(account_id, json!({ "password": password.expose_secret() }))
            .await?;
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &SecretString) -> AppResult<IdentitySession> {
        let anon = self.anon_key.expose_secret();
        let request = self
            .http
            .get()?
            .post(self.endpoint("/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", anon)
            .header("Authorization", format!("Bearer {}", anon))
            .json(&json!({ "email": email, "password": password.expose_secret() }));
        let (status, body) = self.send(request).await?;

        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(AppError::InvalidCredentials);
        }
        let token: GoTrueTokenResponse = parse_success(status, &body)?;
        Ok(IdentitySession {
            access_token: SecretString::new(token.access_token.into()),
            refresh_token: SecretString::new(token.refresh_token.into()),
            expires_in: token.expires_in,
        })
    }
}

fn parse_success<T: for<'de> Deserialize<'de>>(status: StatusCode, body: &str) -> AppResult<T> {
    if !status.is_success() {
        tracing::error!(status = %status, body = %body, "Identity store error");
        return Err(if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            AppError::Upstream(format!("Identity store returned {}", status))
        } else {
            AppError::InvalidInput(format!("Identity store rejected request: {}", status))
        });
    }
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse identity store response");
        AppError::Upstream(format!("Failed to parse identity store response: {}", e))
    })
}

fn is_duplicate_email(status: StatusCode, body: &str) -> bool {
    if status != StatusCode::UNPROCESSABLE_ENTITY && status != StatusCode::CONFLICT {
        return false;
    }
    match serde_json::from_str::<GoTrueErrorBody>(body) {
        Ok(err) => {
            err.error_code.as_deref() == Some("email_exists")
                || err
                    .msg
                    .as_deref()
                    .is_some_and(|m| m.contains("already been registered"))
        }
        Err(_) => body.contains("already been registered"),
    }
}

fn pick_exact_match(users: Vec<GoTrueUser>, email: &str) -> Option<GoTrueUser> {
    users
        .into_iter()
        .find(|u| u.email.as_deref().is_some_and(|e| emails_match(e, email)))
}

// ============================================================================
// GoTrue Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct GoTrueUserList {
    #[serde(default)]
    users: Vec<GoTrueUser>,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: AttributeBag,
}

impl From<GoTrueUser> for Account {
    fn from(user: GoTrueUser) -> Self {
        Account {
            id: user.id,
            email: user.email.unwrap_or_default(),
            attributes: user.user_metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueTokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct GoTrueErrorBody {
    error_code: Option<String>,
    msg: Option<String>,
}
