//! # vps-core
//!
//! Domain model for the VPS checkout service: the plan catalog, orders,
//! generated credentials, provisioned instances and the workflow's error
//! taxonomy.
//!
//! ## Workflow
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ create tx    │──▶│ presence     │──▶│ settlement   │──▶│ provision +  │
//! │ (gateway)    │   │ check        │   │ check        │   │ poll address │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! Nothing here talks to the network. The payment and cloud adapters live in
//! `vps-payments` and `vps-runtime`; both convert their transport failures
//! into [`OrderError`] at the stage where they happen.

pub mod credential;
pub mod error;
pub mod instance;
pub mod order;
pub mod plan;

pub use credential::InitialPassword;
pub use error::{OrderError, Result};
pub use instance::{
    Hostname, InstanceAddress, InstanceId, PENDING_ADDRESS_MARKER, ProvisionedInstance,
};
pub use order::{ORDER_ID_PREFIX, Order, OrderId, ProvisioningRequest};
pub use plan::{Plan, PlanCatalog};
