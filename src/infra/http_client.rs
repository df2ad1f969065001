//! Shared HTTP client with consistent timeout configuration.
//!
//! Outbound adapters (payment provider, identity store) must take a
//! `SharedHttpClient` instead of constructing `reqwest::Client` themselves, so
//! the process holds a single connection pool with bounded timeouts.

use std::{sync::Arc, time::Duration};

use once_cell::sync::OnceCell;
use reqwest::Client;

use crate::app_error::{AppError, AppResult};

/// Default connect timeout (TCP handshake + TLS).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default request timeout (total request/response time).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build an HTTP client with default timeouts.
pub fn try_build_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
}

/// Lazily built, process-wide `reqwest::Client`.
///
/// The client is created on first use and then shared by every clone of the
/// handle. There is no teardown; the pool lives as long as the process.
#[derive(Default)]
pub struct SharedHttpClient {
    cell: OnceCell<Client>,
}

impl SharedHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get(&self) -> AppResult<&Client> {
        self.cell.get_or_try_init(try_build_client).map_err(|e| {
            tracing::error!(error = %e, "Failed to build HTTP client");
            AppError::Internal("HTTP client unavailable".into())
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}
