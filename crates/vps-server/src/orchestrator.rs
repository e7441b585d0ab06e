//! Confirmation Orchestrator
//!
//! ```text
//! Created ──▶ CaptchaChecked ──▶ PaymentConfirmed ──▶ Provisioning ──▶ Done
//!    │              │                   │                   │
//!    └──────────────┴───────────────────┴───────────────────┴──▶ Error(kind)
//! ```
//!
//! Nothing is retried here. A pending payment is returned to the caller, who
//! re-submits the same `order_id`, `plan_key` and `hostname` later.

use vps_core::{Hostname, OrderError, ProvisionedInstance, ProvisioningRequest};
use vps_payments::PaymentVerifier;
use vps_runtime::InstanceProvisioner;

/// Last stage a confirmation reached
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderStage {
    Created,
    CaptchaChecked,
    PaymentConfirmed,
    Provisioning,
    Done,
}

impl OrderStage {
    /// Stage reached by a verification that failed with `error`
    const fn after_verify_error(error: &OrderError) -> Self {
        match error {
            OrderError::PaymentPending { .. } | OrderError::PaymentCheck(_) => Self::CaptchaChecked,
            _ => Self::Created,
        }
    }
}

pub struct Orchestrator {
    verifier: PaymentVerifier,
    provisioner: InstanceProvisioner,
}

impl Orchestrator {
    pub const fn new(verifier: PaymentVerifier, provisioner: InstanceProvisioner) -> Self {
        Self {
            verifier,
            provisioner,
        }
    }

    /// Verify presence and payment, then provision the instance
    pub async fn confirm(&self, request: &ProvisioningRequest) -> vps_core::Result<ProvisionedInstance> {
        self.confirm_traced(request).await.1
    }

    /// Like [`confirm`](Self::confirm), also reporting the stage reached
    #[tracing::instrument(skip_all, fields(order_id = %request.order_id, plan_key = %request.plan_key))]
    pub async fn confirm_traced(
        &self,
        request: &ProvisioningRequest,
    ) -> (OrderStage, vps_core::Result<ProvisionedInstance>) {
        let mut stage = OrderStage::Created;
        let result = self.run(request, &mut stage).await;

        match &result {
            Ok(instance) => tracing::info!(
                instance_id = %instance.instance_id,
                address = %instance.address,
                "Order fulfilled"
            ),
            Err(e) if e.is_retryable() => tracing::info!(?stage, "Order not ready: {}", e),
            Err(e) => tracing::warn!(?stage, code = e.code(), "Order failed: {}", e),
        }

        (stage, result)
    }

    async fn run(
        &self,
        request: &ProvisioningRequest,
        stage: &mut OrderStage,
    ) -> Result<ProvisionedInstance, OrderError> {
        let hostname = Hostname::parse(&request.hostname)?;

        self.verifier
            .verify(&request.order_id, &request.plan_key, &request.presence_token)
            .await
            .inspect_err(|e| advance(stage, OrderStage::after_verify_error(e)))?;
        advance(stage, OrderStage::CaptchaChecked);
        advance(stage, OrderStage::PaymentConfirmed);

        advance(stage, OrderStage::Provisioning);
        let instance = self.provisioner.provision(&request.plan_key, &hostname).await?;

        advance(stage, OrderStage::Done);
        Ok(instance)
    }
}

fn advance(stage: &mut OrderStage, next: OrderStage) {
    tracing::debug!(from = ?*stage, to = ?next, "Stage transition");
    *stage = next;
}
