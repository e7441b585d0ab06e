//! Payment Gateway and Presence Verification Seams
//!
//! The services in this crate work exclusively through these traits, so the
//! real HTTP clients can be swapped for the [`mock`](crate::mock)
//! implementations in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use vps_core::OrderId;

use crate::error::Result;

/// What the gateway returned for a newly registered transaction.
///
/// Either field may be missing; a response with neither is unusable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayTransaction {
    /// Short code with a gateway-hosted payment image
    pub payment_code: Option<String>,

    /// Raw payment string that must be rendered as a QR code
    pub payment_string: Option<String>,
}

/// Payment gateway client (Strategy pattern)
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register a transaction for `amount` under `order_id`
    async fn create_transaction(&self, order_id: &OrderId, amount: u64) -> Result<GatewayTransaction>;

    /// Fetch the raw settlement status string of a transaction
    async fn transaction_status(&self, order_id: &OrderId, amount: u64) -> Result<String>;

    /// Gateway-hosted image URL for a payment code
    fn hosted_image_url(&self, payment_code: &str) -> String;

    /// Gateway name
    fn name(&self) -> &str;
}

/// Outcome of a presence-token verification
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceCheck {
    pub success: bool,

    /// Reasons reported by the service on failure
    #[serde(default)]
    pub error_codes: Vec<String>,
}

/// Human-presence (CAPTCHA) verification service
#[async_trait]
pub trait PresenceVerifier: Send + Sync {
    /// Submit a client token for verification
    async fn verify(&self, token: &str) -> Result<PresenceCheck>;
}
