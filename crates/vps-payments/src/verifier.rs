//! Payment Verifier
//!
//! Two mandatory checks, in order, short-circuiting on the first failure:
//! the buyer's presence token, then the transaction's settlement status.
//! The amount sent to the gateway is always re-derived from the catalog.

use std::sync::Arc;
use std::time::Duration;

use vps_core::{OrderError, OrderId, PlanCatalog};

use crate::gateway::{PaymentGateway, PresenceVerifier};
use crate::http::{DEFAULT_CALL_TIMEOUT, with_deadline};

/// Status fragments the gateway uses for a settled payment
pub const SETTLED_TOKENS: &[&str] = &["SUCCESS", "COMPLETED", "BERHASIL"];

/// Case-insensitive substring match against [`SETTLED_TOKENS`]
pub fn is_settled(status: &str) -> bool {
    let status = status.to_uppercase();
    SETTLED_TOKENS.iter().any(|token| status.contains(token))
}

/// Verifies presence and settlement before anything is provisioned
pub struct PaymentVerifier {
    presence: Arc<dyn PresenceVerifier>,
    gateway: Arc<dyn PaymentGateway>,
    catalog: Arc<PlanCatalog>,
    call_timeout: Duration,
}

impl PaymentVerifier {
    pub fn new(
        presence: Arc<dyn PresenceVerifier>,
        gateway: Arc<dyn PaymentGateway>,
        catalog: Arc<PlanCatalog>,
    ) -> Self {
        Self {
            presence,
            gateway,
            catalog,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Run both checks for an order
    pub async fn verify(
        &self,
        order_id: &OrderId,
        plan_key: &str,
        presence_token: &str,
    ) -> vps_core::Result<()> {
        let amount = self.catalog.lookup(plan_key)?.price;
        self.check_presence(presence_token).await?;
        self.check_settlement(order_id, amount).await
    }

    /// Stage 1: submit the presence token
    async fn check_presence(&self, presence_token: &str) -> vps_core::Result<()> {
        let check = with_deadline(self.call_timeout, self.presence.verify(presence_token))
            .await
            .map_err(|e| {
                tracing::error!(retryable = e.is_retryable(), "Presence verification failed: {}", e);
                OrderError::CaptchaUnavailable(e.to_string())
            })?;

        if !check.success {
            tracing::warn!(error_codes = ?check.error_codes, "Presence token rejected");
            return Err(OrderError::CaptchaInvalid);
        }

        Ok(())
    }

    /// Stage 2: confirm settlement for the catalog amount
    async fn check_settlement(&self, order_id: &OrderId, amount: u64) -> vps_core::Result<()> {
        let status = with_deadline(
            self.call_timeout,
            self.gateway.transaction_status(order_id, amount),
        )
        .await
        .map_err(|e| {
            tracing::error!(
                order_id = %order_id,
                gateway = self.gateway.name(),
                retryable = e.is_retryable(),
                "Settlement lookup failed: {}", e
            );
            OrderError::PaymentCheck(e.to_string())
        })?;

        if !is_settled(&status) {
            tracing::info!(order_id = %order_id, status = %status, "Payment not settled yet");
            return Err(OrderError::PaymentPending { status });
        }

        tracing::info!(order_id = %order_id, status = %status, "Payment settled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPaymentGateway, MockPresenceVerifier};

    struct Fixture {
        presence: Arc<MockPresenceVerifier>,
        gateway: Arc<MockPaymentGateway>,
        verifier: PaymentVerifier,
    }

    fn fixture(presence: MockPresenceVerifier, gateway: MockPaymentGateway) -> Fixture {
        let presence = Arc::new(presence);
        let gateway = Arc::new(gateway);
        let verifier = PaymentVerifier::new(
            presence.clone(),
            gateway.clone(),
            Arc::new(PlanCatalog::builtin()),
        );
        Fixture { presence, gateway, verifier }
    }

    fn order() -> OrderId {
        OrderId::from_string("ZAR-1700000000000-abcd1234")
    }

    #[test]
    fn test_settled_matching() {
        for status in ["BERHASIL", "berhasil", "completed", "Success", "PAYMENT_SUCCESS"] {
            assert!(is_settled(status), "{status} should be settled");
        }
        for status in ["PENDING", "pending", "", "expired", "FAILED"] {
            assert!(!is_settled(status), "{status} should not be settled");
        }
    }

    #[tokio::test]
    async fn test_settled_payment_passes() {
        let f = fixture(
            MockPresenceVerifier::accepting(),
            MockPaymentGateway::new().with_status("BERHASIL"),
        );
        f.verifier.verify(&order(), "r2c2", "tok").await.unwrap();
        assert_eq!(f.presence.calls(), 1);
        assert_eq!(f.gateway.status_queries().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_token_short_circuits() {
        let f = fixture(MockPresenceVerifier::rejecting(), MockPaymentGateway::new());

        let err = f.verifier.verify(&order(), "r2c2", "bad").await.unwrap_err();
        assert_eq!(err, OrderError::CaptchaInvalid);
        assert!(f.gateway.status_queries().is_empty());
    }

    #[tokio::test]
    async fn test_presence_outage() {
        let f = fixture(MockPresenceVerifier::unavailable("dns"), MockPaymentGateway::new());

        let err = f.verifier.verify(&order(), "r2c2", "tok").await.unwrap_err();
        assert!(matches!(err, OrderError::CaptchaUnavailable(_)));
        assert!(f.gateway.status_queries().is_empty());
    }

    #[tokio::test]
    async fn test_pending_payment() {
        for status in ["PENDING", "pending"] {
            let f = fixture(
                MockPresenceVerifier::accepting(),
                MockPaymentGateway::new().with_status(status),
            );
            let err = f.verifier.verify(&order(), "r2c2", "tok").await.unwrap_err();
            assert_eq!(err, OrderError::PaymentPending { status: status.into() });
            assert!(err.is_retryable());
        }
    }

    #[tokio::test]
    async fn test_status_lookup_failure() {
        let f = fixture(
            MockPresenceVerifier::accepting(),
            MockPaymentGateway::new().failing_status("503"),
        );
        let err = f.verifier.verify(&order(), "r2c2", "tok").await.unwrap_err();
        assert!(matches!(err, OrderError::PaymentCheck(_)));
    }

    #[tokio::test]
    async fn test_amount_comes_from_catalog() {
        let catalog = PlanCatalog::new([vps_core::Plan::new("big", "s-8", "Big", "8 vCPU", "16GB", 12_345)]);
        let gateway = Arc::new(MockPaymentGateway::new());
        let verifier = PaymentVerifier::new(
            Arc::new(MockPresenceVerifier::accepting()),
            gateway.clone(),
            Arc::new(catalog),
        );

        verifier.verify(&order(), "big", "tok").await.unwrap();
        assert_eq!(gateway.status_queries(), vec![(order(), 12_345)]);
    }

    #[tokio::test]
    async fn test_unknown_plan_makes_no_remote_calls() {
        let f = fixture(MockPresenceVerifier::accepting(), MockPaymentGateway::new());

        let err = f.verifier.verify(&order(), "zzz", "tok").await.unwrap_err();
        assert_eq!(err, OrderError::InvalidPlan("zzz".into()));
        assert_eq!(f.presence.calls(), 0);
        assert!(f.gateway.status_queries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_presence_deadline() {
        let f = fixture(
            MockPresenceVerifier::accepting().with_delay(Duration::from_secs(300)),
            MockPaymentGateway::new(),
        );
        let verifier = f.verifier.with_call_timeout(Duration::from_secs(5));

        let err = verifier.verify(&order(), "r2c2", "tok").await.unwrap_err();
        assert!(matches!(err, OrderError::CaptchaUnavailable(_)));
        assert!(f.gateway.status_queries().is_empty());
    }
}
