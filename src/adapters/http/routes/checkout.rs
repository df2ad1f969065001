use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::app_state::AppState, app_error::AppResult,
    application::use_cases::checkout::CheckoutUseCases,
};

#[derive(Deserialize)]
struct CheckoutPayload {
    email: String,
    plan: String,
}

#[derive(Serialize)]
struct CheckoutResponse {
    url: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/checkout", post(start_checkout))
}

/// POST /api/checkout
async fn start_checkout(
    State(use_cases): State<Arc<CheckoutUseCases>>,
    Json(payload): Json<CheckoutPayload>,
) -> AppResult<Json<CheckoutResponse>> {
    let redirect = use_cases
        .start_checkout(&payload.email, &payload.plan)
        .await?;
    Ok(Json(CheckoutResponse { url: redirect.url }))
}
