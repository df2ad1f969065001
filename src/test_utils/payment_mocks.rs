//! In-memory payment provider.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::take_failure;
use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_provider::{
        CheckoutRedirect, CheckoutRequest, PaymentProviderPort,
    },
    domain::entities::checkout_session::CheckoutSession,
};

#[derive(Default)]
pub struct InMemoryPaymentProvider {
    sessions: Mutex<HashMap<String, CheckoutSession>>,
    created: Mutex<Vec<CheckoutRequest>>,
    retrieve_calls: AtomicUsize,
    failing_retrieves: AtomicUsize,
}

impl InMemoryPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(sessions: Vec<CheckoutSession>) -> Self {
        let map = sessions.into_iter().map(|s| (s.id.clone(), s)).collect();
        Self {
            sessions: Mutex::new(map),
            ..Self::default()
        }
    }

    pub fn retrieve_calls(&self) -> usize {
        self.retrieve_calls.load(Ordering::SeqCst)
    }

    pub fn created_checkouts(&self) -> Vec<CheckoutRequest> {
        self.created.lock().unwrap().clone()
    }

    pub fn fail_next_retrieves(&self, n: usize) {
        self.failing_retrieves.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentProviderPort for InMemoryPaymentProvider {
    async fn retrieve_checkout_session(&self, session_id: &str) -> AppResult<CheckoutSession> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failing_retrieves) {
            return Err(AppError::Upstream("payment provider unreachable".into()));
        }
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> AppResult<CheckoutRedirect> {
        let mut created = self.created.lock().unwrap();
        created.push(request.clone());
        let session_id = format!("cs_test_{}", created.len());
        Ok(CheckoutRedirect {
            url: format!("https://checkout.stripe.test/c/pay/{session_id}"),
            session_id,
        })
    }
}
