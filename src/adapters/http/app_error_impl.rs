use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::app_error::{AppError, ErrorCode};

pub const ERROR_CODE_HEADER: HeaderName = HeaderName::from_static("x-error-code");

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        if self.is_retryable() {
            tracing::error!(error = %self, code = self.code().as_str(), "Request failed");
        } else {
            tracing::warn!(error = %self, code = self.code().as_str(), "Request rejected");
        }

        let code = self.code();
        match self {
            AppError::InvalidSignature(_) => {
                error_resp(StatusCode::BAD_REQUEST, code, "Invalid signature")
            }
            AppError::InvalidInput(msg) => error_resp(StatusCode::BAD_REQUEST, code, &msg),
            AppError::PaymentNotVerified => {
                error_resp(StatusCode::FORBIDDEN, code, "Payment not verified")
            }
            AppError::AccountNotProvisioned => error_resp(
                StatusCode::FORBIDDEN,
                code,
                "No account found for this email. Please wait a moment and retry.",
            ),
            AppError::DuplicateEmail => {
                error_resp(StatusCode::CONFLICT, code, "Account already exists")
            }
            AppError::InvalidCredentials => {
                error_resp(StatusCode::UNAUTHORIZED, code, "Invalid credentials")
            }
            AppError::SessionNotIssued => error_resp(
                StatusCode::CONFLICT,
                code,
                "Password set, but sign-in failed. Please submit again.",
            ),
            AppError::RateLimited => error_resp(
                StatusCode::TOO_MANY_REQUESTS,
                code,
                "Too many requests. Please try again later.",
            ),
            AppError::Upstream(_) => error_resp(
                StatusCode::BAD_GATEWAY,
                code,
                "Upstream service unavailable",
            ),
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, code, "Not found"),
            AppError::Internal(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, "Internal error")
            }
        }
    }
}

/// Plain-text reason; the machine-readable code travels in `x-error-code`.
fn error_resp(status: StatusCode, code: ErrorCode, message: &str) -> Response {
    (
        status,
        [(ERROR_CODE_HEADER, HeaderValue::from_static(code.as_str()))],
        message.to_string(),
    )
        .into_response()
}
