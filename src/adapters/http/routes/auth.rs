use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderValue, header::SET_COOKIE},
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{app_state::AppState, middleware::ClientIp},
    app_error::{AppError, AppResult},
};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Where the browser goes once the account is usable.
const ACCOUNT_PAGE: &str = "/account";

#[derive(Deserialize)]
struct ActivatePayload {
    email: String,
    password: String,
    session_id: String,
}

#[derive(Serialize)]
struct ActivateResponse {
    ok: bool,
    redirect: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/activate", post(activate))
}

/// POST /api/auth/activate
async fn activate(
    State(app_state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<ActivatePayload>,
) -> AppResult<impl IntoResponse> {
    app_state
        .rate_limiter
        .check(&ip, Some(&payload.email))
        .await?;

    let session = app_state
        .activation_use_cases
        .activate(
            &payload.email,
            SecretString::new(payload.password.into()),
            &payload.session_id,
        )
        .await?;

    let secure = app_state.config.cookie_secure;
    let mut headers = HeaderMap::new();

    let access_cookie = Cookie::build((
        ACCESS_TOKEN_COOKIE,
        session.access_token.expose_secret().to_string(),
    ))
    .http_only(true)
    .secure(secure)
    .same_site(SameSite::Lax)
    .path("/")
    .max_age(time::Duration::seconds(session.expires_in))
    .build();

    let refresh_cookie = Cookie::build((
        REFRESH_TOKEN_COOKIE,
        session.refresh_token.expose_secret().to_string(),
    ))
    .http_only(true)
    .secure(secure)
    .same_site(SameSite::Lax)
    .path("/")
    .max_age(app_state.config.refresh_token_ttl)
    .build();

    append_cookie(&mut headers, access_cookie)?;
    append_cookie(&mut headers, refresh_cookie)?;

    Ok((
        headers,
        Json(ActivateResponse {
            ok: true,
            redirect: ACCOUNT_PAGE,
        }),
    ))
}

fn append_cookie(headers: &mut HeaderMap, cookie: Cookie<'_>) -> AppResult<()> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|_| AppError::Internal("invalid cookie value".into()))?;
    headers.append(SET_COOKIE, value);
    Ok(())
}
