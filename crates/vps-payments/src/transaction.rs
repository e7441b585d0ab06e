//! Transaction Service
//!
//! Registers a payment transaction with the gateway and derives the image
//! the buyer scans to pay.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use vps_core::{Order, OrderError, PlanCatalog};

use crate::gateway::{GatewayTransaction, PaymentGateway};
use crate::http::{DEFAULT_CALL_TIMEOUT, with_deadline};
use crate::qr::QrRenderer;

/// Scannable payment image handed to the buyer
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentArtifact {
    /// Image hosted by the gateway for a payment code
    Hosted { code: String, url: String },

    /// Raw payment string rendered by the QR fallback
    Rendered { payload: String, url: String },
}

impl PaymentArtifact {
    pub fn url(&self) -> &str {
        match self {
            Self::Hosted { url, .. } | Self::Rendered { url, .. } => url,
        }
    }
}

/// A transaction registered with the gateway
#[derive(Clone, Debug, Serialize)]
pub struct CreatedTransaction {
    pub order: Order,
    pub artifact: PaymentArtifact,
}

/// Creates gateway transactions for catalog plans
pub struct TransactionService {
    gateway: Arc<dyn PaymentGateway>,
    catalog: Arc<PlanCatalog>,
    qr: QrRenderer,
    call_timeout: Duration,
}

impl TransactionService {
    pub fn new(gateway: Arc<dyn PaymentGateway>, catalog: Arc<PlanCatalog>) -> Self {
        Self {
            gateway,
            catalog,
            qr: QrRenderer::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Register a transaction for `plan_key` at the catalog price.
    ///
    /// Idempotency is left to the gateway: every call creates a new order id.
    #[tracing::instrument(skip(self))]
    pub async fn create_transaction(&self, plan_key: &str) -> vps_core::Result<CreatedTransaction> {
        let plan = self.catalog.lookup(plan_key)?;
        let order = Order::new(plan);

        let created = with_deadline(
            self.call_timeout,
            self.gateway.create_transaction(&order.order_id, order.amount),
        )
        .await
        .map_err(|e| {
            tracing::error!(
                order_id = %order.order_id,
                gateway = self.gateway.name(),
                retryable = e.is_retryable(),
                "Transaction creation failed: {}", e
            );
            OrderError::Gateway(e.to_string())
        })?;

        let artifact = self.artifact_for(created).ok_or_else(|| {
            tracing::error!(order_id = %order.order_id, "Gateway returned no payment code or payment string");
            OrderError::Gateway("no payment code or payment string in response".into())
        })?;

        tracing::info!(
            order_id = %order.order_id,
            plan_key = %order.plan_key,
            amount = order.amount,
            "Created transaction"
        );

        Ok(CreatedTransaction { order, artifact })
    }

    /// Hosted code preferred; raw payment string as fallback
    fn artifact_for(&self, tx: GatewayTransaction) -> Option<PaymentArtifact> {
        if let Some(code) = tx.payment_code {
            let url = self.gateway.hosted_image_url(&code);
            return Some(PaymentArtifact::Hosted { code, url });
        }

        tx.payment_string.map(|payload| PaymentArtifact::Rendered {
            url: self.qr.image_url(&payload),
            payload,
        })
    }
}
