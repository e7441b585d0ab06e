//! Mock Gateway and Presence Verifier
//!
//! For tests and local demos. Records every call so tests can assert on
//! what was (or was not) sent upstream.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use vps_core::OrderId;

use crate::error::{PaymentError, Result};
use crate::gateway::{GatewayTransaction, PaymentGateway, PresenceCheck, PresenceVerifier};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

fn rejected(body: &str) -> PaymentError {
    PaymentError::Rejected {
        status: 503,
        body: body.to_string(),
    }
}

/// Scripted payment gateway
pub struct MockPaymentGateway {
    transaction: std::result::Result<GatewayTransaction, String>,
    status: std::result::Result<String, String>,
    delay: Option<Duration>,
    created: Mutex<Vec<(OrderId, u64)>>,
    status_queries: Mutex<Vec<(OrderId, u64)>>,
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPaymentGateway {
    /// Hands out a hosted payment code and reports every payment as completed
    pub fn new() -> Self {
        Self {
            transaction: Ok(GatewayTransaction {
                payment_code: Some("MOCK-CODE".into()),
                payment_string: None,
            }),
            status: Ok("completed".into()),
            delay: None,
            created: Mutex::new(Vec::new()),
            status_queries: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_transaction(mut self, transaction: GatewayTransaction) -> Self {
        self.transaction = Ok(transaction);
        self
    }

    #[must_use]
    pub fn failing_create(mut self, reason: impl Into<String>) -> Self {
        self.transaction = Err(reason.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Ok(status.into());
        self
    }

    #[must_use]
    pub fn failing_status(mut self, reason: impl Into<String>) -> Self {
        self.status = Err(reason.into());
        self
    }

    /// Delay every call (pair with a paused tokio clock)
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Transactions created so far as (order id, amount)
    pub fn created(&self) -> Vec<(OrderId, u64)> {
        lock(&self.created).clone()
    }

    /// Status lookups so far as (order id, amount)
    pub fn status_queries(&self) -> Vec<(OrderId, u64)> {
        lock(&self.status_queries).clone()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_transaction(&self, order_id: &OrderId, amount: u64) -> Result<GatewayTransaction> {
        pause(self.delay).await;
        lock(&self.created).push((order_id.clone(), amount));
        self.transaction.clone().map_err(|reason| rejected(&reason))
    }

    async fn transaction_status(&self, order_id: &OrderId, amount: u64) -> Result<String> {
        pause(self.delay).await;
        lock(&self.status_queries).push((order_id.clone(), amount));
        self.status.clone().map_err(|reason| rejected(&reason))
    }

    fn hosted_image_url(&self, payment_code: &str) -> String {
        format!("https://gateway.test/qris/{payment_code}.png")
    }

    fn name(&self) -> &str {
        "MockGateway"
    }
}

/// Scripted presence verifier
pub struct MockPresenceVerifier {
    outcome: std::result::Result<bool, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockPresenceVerifier {
    fn with_outcome(outcome: std::result::Result<bool, String>) -> Self {
        Self {
            outcome,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Accepts every token
    pub fn accepting() -> Self {
        Self::with_outcome(Ok(true))
    }

    /// Rejects every token
    pub fn rejecting() -> Self {
        Self::with_outcome(Ok(false))
    }

    /// Fails every call as if the service were unreachable
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::with_outcome(Err(reason.into()))
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of verification calls received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PresenceVerifier for MockPresenceVerifier {
    async fn verify(&self, _token: &str) -> Result<PresenceCheck> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        pause(self.delay).await;

        match &self.outcome {
            Ok(true) => Ok(PresenceCheck {
                success: true,
                error_codes: Vec::new(),
            }),
            Ok(false) => Ok(PresenceCheck {
                success: false,
                error_codes: vec!["invalid-input-response".into()],
            }),
            Err(reason) => Err(rejected(reason)),
        }
    }
}
