//! Plan Catalog
//!
//! Fixed mapping from plan key to provider size and price. Built once at
//! start-up and shared read-only; prices here are the only prices the
//! workflow ever charges or checks.

use serde::Serialize;

use crate::error::{OrderError, Result};

/// A purchasable server configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Catalog key chosen by the buyer (e.g. "r2c2")
    pub key: String,

    /// Cloud provider size slug (e.g. "s-2vcpu-2gb")
    pub provider_size_id: String,

    pub display_name: String,
    pub cpu: String,
    pub ram: String,

    /// Price in whole rupiah
    pub price: u64,
}

impl Plan {
    pub fn new(
        key: impl Into<String>,
        provider_size_id: impl Into<String>,
        display_name: impl Into<String>,
        cpu: impl Into<String>,
        ram: impl Into<String>,
        price: u64,
    ) -> Self {
        Self {
            key: key.into(),
            provider_size_id: provider_size_id.into(),
            display_name: display_name.into(),
            cpu: cpu.into(),
            ram: ram.into(),
            price,
        }
    }
}

// (key, size slug, name, cpu, ram, price)
const BUILTIN_PLANS: &[(&str, &str, &str, &str, &str, u64)] = &[
    ("r1c1", "s-1vcpu-1gb", "Starter Plan", "1 vCPU", "1GB", 500),
    ("r2c1", "s-1vcpu-2gb", "Basic Plan", "1 vCPU", "2GB", 500),
    ("r2c2", "s-2vcpu-2gb", "Pro Plan", "2 vCPU", "2GB", 500),
    ("r4c2", "s-2vcpu-4gb", "Ultra Plan", "2 vCPU", "4GB", 500),
    ("r8c4", "s-4vcpu-8gb", "Mega Plan", "4 vCPU", "8GB", 500),
];

/// Immutable plan catalog
#[derive(Clone, Debug)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PlanCatalog {
    /// Catalog from an explicit plan list. Later duplicates of a key are dropped.
    pub fn new(plans: impl IntoIterator<Item = Plan>) -> Self {
        let mut unique: Vec<Plan> = Vec::new();
        for plan in plans {
            if !unique.iter().any(|p| p.key == plan.key) {
                unique.push(plan);
            }
        }
        Self { plans: unique }
    }

    /// The catalog offered in production
    pub fn builtin() -> Self {
        Self::new(BUILTIN_PLANS.iter().map(|&(key, size, name, cpu, ram, price)| {
            Plan::new(key, size, name, cpu, ram, price)
        }))
    }

    /// Resolve a plan key
    pub fn lookup(&self, key: &str) -> Result<&Plan> {
        self.plans
            .iter()
            .find(|p| p.key == key)
            .ok_or_else(|| OrderError::InvalidPlan(key.to_string()))
    }

    /// All plans in display order
    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}
