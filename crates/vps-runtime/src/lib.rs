//! # vps-runtime
//!
//! Cloud side of the VPS checkout: creating the instance a buyer paid for
//! and discovering its address.
//!
//! ## Providers
//!
//! - **DigitalOcean** (default): droplets via the v2 API
//! - **Mock**: scripted provider for tests and demos
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vps_runtime::{DigitalOceanClient, InstanceProvisioner};
//!
//! let cloud = Arc::new(DigitalOceanClient::from_env()?);
//! let provisioner = InstanceProvisioner::new(cloud, catalog);
//!
//! let instance = provisioner.provision("r2c2", &hostname).await?;
//! ```

pub mod cloud;
pub mod cloud_init;
pub mod digitalocean;
pub mod error;
pub mod mock;
pub mod provisioner;

pub use cloud::{CloudProvider, DEFAULT_CALL_TIMEOUT, InstanceRequest};
pub use digitalocean::{DigitalOceanClient, DigitalOceanConfig};
pub use error::{CloudError, Result};
pub use provisioner::{InstanceProvisioner, ProvisionerConfig};
