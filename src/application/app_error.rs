use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Webhook signature verification failed: {0}")]
    InvalidSignature(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Checkout session is not paid")]
    PaymentNotVerified,

    #[error("No account has been provisioned for this email")]
    AccountNotProvisioned,

    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password was set but no session could be issued. Please retry.")]
    SessionNotIssued,

    #[error("Too many requests. Please slow down.")]
    RateLimited,

    #[error("Upstream service unavailable: {0}")]
    Upstream(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the same request can succeed later without any change to it.
    ///
    /// The webhook route answers retryable errors with a 5xx so the payment
    /// provider redelivers, and acknowledges everything else.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Upstream(_) => true,
            AppError::Internal(_) => true,
            AppError::RateLimited => true,
            AppError::SessionNotIssued => true,

            AppError::InvalidSignature(_) => false,
            AppError::InvalidInput(_) => false,
            AppError::PaymentNotVerified => false,
            AppError::AccountNotProvisioned => false,
            AppError::DuplicateEmail => false,
            AppError::InvalidCredentials => false,
            AppError::NotFound => false,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidSignature(_) => ErrorCode::InvalidSignature,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::PaymentNotVerified => ErrorCode::PaymentNotVerified,
            AppError::AccountNotProvisioned => ErrorCode::AccountNotProvisioned,
            AppError::DuplicateEmail => ErrorCode::DuplicateEmail,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::SessionNotIssued => ErrorCode::SessionNotIssued,
            AppError::RateLimited => ErrorCode::RateLimited,
            AppError::Upstream(_) => ErrorCode::UpstreamUnavailable,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidSignature,
    InvalidInput,
    PaymentNotVerified,
    AccountNotProvisioned,
    DuplicateEmail,
    InvalidCredentials,
    SessionNotIssued,
    RateLimited,
    UpstreamUnavailable,
    NotFound,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::PaymentNotVerified => "PAYMENT_NOT_VERIFIED",
            ErrorCode::AccountNotProvisioned => "ACCOUNT_NOT_PROVISIONED",
            ErrorCode::DuplicateEmail => "DUPLICATE_EMAIL",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::SessionNotIssued => "SESSION_NOT_ISSUED",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
