//! Instance Provisioner
//!
//! Creates a billable instance with a generated root password and waits a
//! bounded time for its public IPv4 address. The created instance is never
//! rolled back: once the provider accepts the request the resource exists.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use vps_core::{
    Hostname, InitialPassword, InstanceAddress, InstanceId, OrderError, PlanCatalog,
    ProvisionedInstance,
};

use crate::cloud::{CloudProvider, DEFAULT_CALL_TIMEOUT, InstanceRequest};
use crate::cloud_init::password_user_data;
use crate::error::{CloudError, Result};

/// Fixed placement and polling parameters
#[derive(Clone, Debug)]
pub struct ProvisionerConfig {
    pub region: String,
    pub image: String,
    pub tags: Vec<String>,

    /// Address probes before giving up
    pub max_attempts: u32,

    /// Spacing between probes; probe `n` starts `n * poll_interval` after
    /// the poll begins
    pub poll_interval: Duration,

    /// Deadline for one address probe, capped at `poll_interval`
    pub probe_timeout: Duration,

    /// Deadline for the creation call
    pub call_timeout: Duration,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            region: "sgp1".into(),
            image: "ubuntu-24-04-x64".into(),
            tags: vec!["ZarVps".into()],
            max_attempts: 20,
            poll_interval: Duration::from_secs(3),
            probe_timeout: Duration::from_secs(3),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Creates instances for paid plans
pub struct InstanceProvisioner {
    cloud: Arc<dyn CloudProvider>,
    catalog: Arc<PlanCatalog>,
    config: ProvisionerConfig,
}

impl InstanceProvisioner {
    pub fn new(cloud: Arc<dyn CloudProvider>, catalog: Arc<PlanCatalog>) -> Self {
        Self::with_config(cloud, catalog, ProvisionerConfig::default())
    }

    pub fn with_config(
        cloud: Arc<dyn CloudProvider>,
        catalog: Arc<PlanCatalog>,
        config: ProvisionerConfig,
    ) -> Self {
        Self {
            cloud,
            catalog,
            config,
        }
    }

    /// Create an instance for `plan_key` and wait for its address.
    ///
    /// Only the creation call can fail the operation. Address discovery
    /// running out of attempts yields [`InstanceAddress::Pending`].
    pub async fn provision(
        &self,
        plan_key: &str,
        hostname: &Hostname,
    ) -> vps_core::Result<ProvisionedInstance> {
        let plan = self.catalog.lookup(plan_key).inspect_err(|_| {
            tracing::error!(plan_key, "Provisioning reached with an unvalidated plan key");
        })?;

        let password = InitialPassword::generate();
        let request = InstanceRequest {
            name: hostname.to_string(),
            region: self.config.region.clone(),
            size: plan.provider_size_id.clone(),
            image: self.config.image.clone(),
            ipv6: true,
            user_data: password_user_data(&password),
            tags: self.config.tags.clone(),
        };

        let instance_id = bounded(self.config.call_timeout, self.cloud.create_instance(&request))
            .await
            .map_err(|e| {
                tracing::error!(
                    provider = self.cloud.name(),
                    hostname = %hostname,
                    size = %request.size,
                    "Instance creation failed: {}", e
                );
                OrderError::Provisioning(e.to_string())
            })?;

        tracing::info!(
            instance_id = %instance_id,
            hostname = %hostname,
            size = %request.size,
            region = %request.region,
            "Instance created"
        );

        let address = self.wait_for_address(instance_id).await;

        Ok(ProvisionedInstance {
            instance_id,
            address,
            initial_password: password,
            hostname: hostname.clone(),
        })
    }

    /// Probe for the first IPv4 address on a fixed schedule.
    ///
    /// Failed or timed-out probes count as attempts and are retried. A hung
    /// provider costs at most one probe deadline past the last slot.
    pub async fn wait_for_address(&self, id: InstanceId) -> InstanceAddress {
        let start = Instant::now();
        let probe_timeout = self.config.probe_timeout.min(self.config.poll_interval);

        for attempt in 1..=self.config.max_attempts {
            tokio::time::sleep_until(start + self.config.poll_interval * attempt).await;

            match bounded(probe_timeout, self.cloud.ipv4_addresses(id)).await {
                Ok(addresses) => {
                    if let Some(ip) = addresses.first() {
                        tracing::info!(instance_id = %id, ip = %ip, attempt, "Instance address assigned");
                        return InstanceAddress::Assigned(*ip);
                    }
                    tracing::debug!(instance_id = %id, attempt, "No address yet");
                }
                Err(e) => {
                    tracing::warn!(instance_id = %id, attempt, "Address probe failed: {}", e);
                }
            }
        }

        tracing::warn!(
            instance_id = %id,
            attempts = self.config.max_attempts,
            "Address discovery timed out; instance left running"
        );
        InstanceAddress::Pending
    }
}

async fn bounded<T>(deadline: Duration, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| CloudError::Timeout(deadline))?
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::mock::{MockCloudProvider, Probe};

    fn provisioner(cloud: MockCloudProvider) -> (Arc<MockCloudProvider>, InstanceProvisioner) {
        let cloud = Arc::new(cloud);
        let provisioner = InstanceProvisioner::new(cloud.clone(), Arc::new(PlanCatalog::builtin()));
        (cloud, provisioner)
    }

    fn hostname() -> Hostname {
        Hostname::parse("web-01").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_contents() {
        let ip = Ipv4Addr::new(203, 0, 113, 9);
        let (cloud, provisioner) = provisioner(MockCloudProvider::new().address_on_attempt(1, ip));

        let instance = provisioner.provision("r2c2", &hostname()).await.unwrap();
        assert_eq!(instance.instance_id, InstanceId(1001));
        assert_eq!(instance.address, InstanceAddress::Assigned(ip));
        assert_eq!(instance.hostname.as_str(), "web-01");

        let requests = cloud.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.name, "web-01");
        assert_eq!(request.region, "sgp1");
        assert_eq!(request.size, "s-2vcpu-2gb");
        assert_eq!(request.image, "ubuntu-24-04-x64");
        assert!(request.ipv6);
        assert_eq!(request.tags, vec!["ZarVps".to_string()]);
        assert!(request.user_data.contains(instance.initial_password.as_str()));
        assert!(request.user_data.contains("expire: False"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_address_wins() {
        let ip = Ipv4Addr::new(203, 0, 113, 20);
        let (cloud, provisioner) = provisioner(MockCloudProvider::new().address_on_attempt(4, ip));

        let start = Instant::now();
        let instance = provisioner.provision("r1c1", &hostname()).await.unwrap();

        assert_eq!(instance.address, InstanceAddress::Assigned(ip));
        assert_eq!(cloud.probe_calls(), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_failures_are_swallowed() {
        let ip = Ipv4Addr::new(198, 51, 100, 1);
        let (cloud, provisioner) = provisioner(MockCloudProvider::new().with_probes([
            Probe::Fail,
            Probe::Empty,
            Probe::Fail,
            Probe::Address(ip),
        ]));

        let instance = provisioner.provision("r1c1", &hostname()).await.unwrap();
        assert_eq!(instance.address, InstanceAddress::Assigned(ip));
        assert_eq!(cloud.probe_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_address_after_twenty_attempts() {
        let (cloud, provisioner) = provisioner(MockCloudProvider::new());

        let start = Instant::now();
        let instance = provisioner.provision("r8c4", &hostname()).await.unwrap();

        assert_eq!(instance.instance_id, InstanceId(1001));
        assert!(instance.address.is_pending());
        assert_eq!(cloud.probe_calls(), 20);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_address_on_last_attempt() {
        let ip = Ipv4Addr::new(192, 0, 2, 1);
        let (cloud, provisioner) = provisioner(MockCloudProvider::new().address_on_attempt(20, ip));

        let instance = provisioner.provision("r1c1", &hostname()).await.unwrap();
        assert_eq!(instance.address, InstanceAddress::Assigned(ip));
        assert_eq!(cloud.probe_calls(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_failure() {
        let (cloud, provisioner) = provisioner(MockCloudProvider::new().failing_create("size unavailable"));

        let err = provisioner.provision("r2c2", &hostname()).await.unwrap_err();
        assert!(matches!(err, OrderError::Provisioning(msg) if msg.contains("size unavailable")));
        assert_eq!(cloud.probe_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_plan_creates_nothing() {
        let (cloud, provisioner) = provisioner(MockCloudProvider::new());

        let err = provisioner.provision("nope", &hostname()).await.unwrap_err();
        assert_eq!(err, OrderError::InvalidPlan("nope".into()));
        assert!(cloud.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_poll_bounds() {
        let cloud = Arc::new(MockCloudProvider::new());
        let config = ProvisionerConfig {
            max_attempts: 3,
            poll_interval: Duration::from_millis(500),
            ..ProvisionerConfig::default()
        };
        let provisioner = InstanceProvisioner::with_config(cloud.clone(), Arc::new(PlanCatalog::builtin()), config);

        let start = Instant::now();
        assert!(provisioner.wait_for_address(InstanceId(7)).await.is_pending());
        assert_eq!(cloud.probe_calls(), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[test]
    fn test_config_defaults() {
        let config = ProvisionerConfig::default();
        assert_eq!(config.max_attempts, 20);
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert!(config.probe_timeout <= config.poll_interval);
        assert_eq!(config.call_timeout, DEFAULT_CALL_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_provider_keeps_poll_bound() {
        let (cloud, provisioner) =
            provisioner(MockCloudProvider::new().with_probes(std::iter::repeat_n(Probe::Hang, 20)));

        let start = Instant::now();
        let address = provisioner.wait_for_address(InstanceId(9)).await;

        assert!(address.is_pending());
        assert_eq!(cloud.probe_calls(), 20);
        // last slot at 60 s plus one 3 s probe deadline
        assert_eq!(start.elapsed(), Duration::from_secs(63));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_probe_does_not_shift_schedule() {
        let ip = Ipv4Addr::new(203, 0, 113, 30);
        let (cloud, provisioner) =
            provisioner(MockCloudProvider::new().with_probes([Probe::Hang, Probe::Address(ip)]));

        let start = Instant::now();
        let address = provisioner.wait_for_address(InstanceId(9)).await;

        assert_eq!(address, InstanceAddress::Assigned(ip));
        assert_eq!(cloud.probe_calls(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_capped_at_interval() {
        let cloud = Arc::new(MockCloudProvider::new().with_probes(std::iter::repeat_n(Probe::Hang, 20)));
        let config = ProvisionerConfig {
            probe_timeout: Duration::from_secs(30),
            ..ProvisionerConfig::default()
        };
        let provisioner = InstanceProvisioner::with_config(cloud.clone(), Arc::new(PlanCatalog::builtin()), config);

        let start = Instant::now();
        assert!(provisioner.wait_for_address(InstanceId(9)).await.is_pending());
        assert_eq!(start.elapsed(), Duration::from_secs(63));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generated_password_differs_per_instance() {
        let (_, provisioner) = provisioner(MockCloudProvider::new().with_probes([
            Probe::Address(Ipv4Addr::LOCALHOST),
            Probe::Address(Ipv4Addr::LOCALHOST),
        ]));

        let a = provisioner.provision("r1c1", &hostname()).await.unwrap();
        let b = provisioner.provision("r1c1", &hostname()).await.unwrap();
        assert_ne!(a.initial_password, b.initial_password);
    }
}
