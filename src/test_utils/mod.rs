//! Test utilities for unit and HTTP-level testing.
//!
//! This module provides:
//! - Test data factories for creating valid fixtures and webhook payloads
//! - In-memory implementations of the identity store, payment provider and
//!   rate limiter, with call counters and injectable failures
//! - `TestAppStateBuilder` for exercising routes through `axum-test`

mod app_state_builder;
mod factories;
mod identity_mocks;
mod payment_mocks;
mod rate_limit_mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use identity_mocks::*;
pub use payment_mocks::*;
pub use rate_limit_mocks::*;

use std::sync::atomic::{AtomicUsize, Ordering};

/// Consume one scheduled failure, if any are left.
pub(crate) fn take_failure(remaining: &AtomicUsize) -> bool {
    remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}
