//! Provisioned Instances

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::credential::InitialPassword;
use crate::error::{OrderError, Result};

/// Shown in place of an address that has not been discovered yet
pub const PENDING_ADDRESS_MARKER: &str = "Waiting for IP...";

/// Provider-assigned instance identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u64);

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public network address of a new instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceAddress {
    Assigned(Ipv4Addr),

    /// The instance exists but no IPv4 address showed up within the poll bound
    Pending,
}

impl InstanceAddress {
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for InstanceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assigned(ip) => write!(f, "{ip}"),
            Self::Pending => f.write_str(PENDING_ADDRESS_MARKER),
        }
    }
}

/// Validated instance hostname (RFC 1123 labels)
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Hostname(String);

impl Hostname {
    pub const MAX_LEN: usize = 253;
    pub const MAX_LABEL_LEN: usize = 63;

    pub fn parse(raw: &str) -> Result<Self> {
        let name = raw.trim();
        let invalid = || OrderError::InvalidHostname(raw.to_string());

        if name.is_empty() || name.len() > Self::MAX_LEN {
            return Err(invalid());
        }

        for label in name.split('.') {
            let ok = !label.is_empty()
                && label.len() <= Self::MAX_LABEL_LEN
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
            if !ok {
                return Err(invalid());
            }
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Hostname {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a successful provisioning run. Never persisted.
#[derive(Clone, Debug)]
pub struct ProvisionedInstance {
    pub instance_id: InstanceId,
    pub address: InstanceAddress,
    pub initial_password: InitialPassword,
    pub hostname: Hostname,
}
