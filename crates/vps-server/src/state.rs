//! Application State

use std::sync::Arc;

use vps_core::PlanCatalog;
use vps_payments::TransactionService;

use crate::orchestrator::Orchestrator;

/// Shared application state. Read-only after start-up: no orders or
/// instances are kept between requests.
#[derive(Clone)]
pub struct AppState {
    /// Fixed plan catalog
    pub catalog: Arc<PlanCatalog>,

    /// Gateway transaction creation
    pub transactions: Arc<TransactionService>,

    /// Confirmation workflow (verify, then provision)
    pub orchestrator: Arc<Orchestrator>,

    /// Public Turnstile site key for the checkout widget
    pub site_key: Option<String>,
}
