//! Cloud Provider Integration
//!
//! Abstractions and implementations for compute providers.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use vps_core::InstanceId;

use crate::error::Result;

/// Deadline for a single provider API call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

/// Instance creation request, serialized as the provider's request body
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InstanceRequest {
    pub name: String,
    pub region: String,
    pub size: String,
    pub image: String,
    pub ipv6: bool,

    /// Boot-time configuration (cloud-init)
    pub user_data: String,

    pub tags: Vec<String>,
}

/// Cloud provider client (Strategy pattern)
///
/// Implement this for each provider: DigitalOcean, Vultr, Linode, etc.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Request a new instance; returns as soon as the provider accepts it
    async fn create_instance(&self, request: &InstanceRequest) -> Result<InstanceId>;

    /// Current IPv4 addresses of an instance, public ones first.
    /// Empty while the network is still being set up.
    async fn ipv4_addresses(&self, id: InstanceId) -> Result<Vec<Ipv4Addr>>;

    /// Provider name
    fn name(&self) -> &str;
}
