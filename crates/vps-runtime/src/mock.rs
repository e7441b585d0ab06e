//! Mock Cloud Provider
//!
//! For testing and demo purposes. Probe answers are scripted in order; once
//! the script runs out every probe reports no address yet.

use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use vps_core::InstanceId;

use crate::cloud::{CloudProvider, InstanceRequest};
use crate::error::{CloudError, Result};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One scripted answer to an address probe
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    /// Network not ready
    Empty,
    /// Probe request fails
    Fail,
    /// Provider never answers
    Hang,
    /// Address assigned
    Address(Ipv4Addr),
}

/// Mock provider with scripted probe outcomes
pub struct MockCloudProvider {
    create: std::result::Result<u64, String>,
    probes: Mutex<VecDeque<Probe>>,
    requests: Mutex<Vec<InstanceRequest>>,
    probe_calls: AtomicUsize,
}

impl Default for MockCloudProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCloudProvider {
    /// Accepts every creation as instance 1001; never reports an address
    pub fn new() -> Self {
        Self {
            create: Ok(1001),
            probes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            probe_calls: AtomicUsize::new(0),
        }
    }

    /// Script probe answers in order
    #[must_use]
    pub fn with_probes(self, probes: impl IntoIterator<Item = Probe>) -> Self {
        lock(&self.probes).extend(probes);
        self
    }

    /// Report `ip` on probe number `attempt` (1-based), nothing before
    #[must_use]
    pub fn address_on_attempt(self, attempt: usize, ip: Ipv4Addr) -> Self {
        let script = std::iter::repeat_n(Probe::Empty, attempt.saturating_sub(1))
            .chain(std::iter::once(Probe::Address(ip)));
        self.with_probes(script)
    }

    #[must_use]
    pub fn failing_create(mut self, reason: impl Into<String>) -> Self {
        self.create = Err(reason.into());
        self
    }

    /// Creation requests received
    pub fn requests(&self) -> Vec<InstanceRequest> {
        lock(&self.requests).clone()
    }

    /// Address probes received
    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CloudProvider for MockCloudProvider {
    async fn create_instance(&self, request: &InstanceRequest) -> Result<InstanceId> {
        lock(&self.requests).push(request.clone());
        self.create.clone().map(InstanceId).map_err(|message| CloudError::Api {
            status: 422,
            message,
        })
    }

    async fn ipv4_addresses(&self, _id: InstanceId) -> Result<Vec<Ipv4Addr>> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let next = lock(&self.probes).pop_front().unwrap_or(Probe::Empty);

        match next {
            Probe::Empty => Ok(Vec::new()),
            Probe::Fail => Err(CloudError::Api {
                status: 500,
                message: "probe failed".into(),
            }),
            Probe::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            Probe::Address(ip) => Ok(vec![ip]),
        }
    }

    fn name(&self) -> &str {
        "MockCloud"
    }
}
