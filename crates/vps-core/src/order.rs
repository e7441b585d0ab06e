//! Orders and Confirmation Requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::Plan;

/// Literal prefix of every generated order id
pub const ORDER_ID_PREFIX: &str = "ZAR-";

/// Correlation key shared by the gateway transaction and every later step
/// (formatted: ZAR-<unix millis>-<8 hex>)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generate a fresh order id.
    ///
    /// The timestamp keeps ids sortable and readable in the gateway
    /// dashboard; the random suffix keeps two creations in the same
    /// millisecond apart.
    pub fn generate() -> Self {
        Self::generate_at(Utc::now())
    }

    fn generate_at(now: DateTime<Utc>) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!(
            "{ORDER_ID_PREFIX}{}-{}",
            now.timestamp_millis(),
            &suffix[..8]
        ))
    }

    /// Wrap an id received from a client
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One purchase attempt. Carries no status: settlement is always
/// re-queried from the gateway.
#[derive(Clone, Debug, Serialize)]
pub struct Order {
    pub order_id: OrderId,
    pub plan_key: String,

    /// Amount charged, taken from the catalog
    pub amount: u64,

    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Start a new order for a catalog plan
    pub fn new(plan: &Plan) -> Self {
        Self {
            order_id: OrderId::generate(),
            plan_key: plan.key.clone(),
            amount: plan.price,
            created_at: Utc::now(),
        }
    }
}

/// Client-supplied confirmation request.
///
/// Accepts both snake_case field names and the browser checkout's
/// `token` / `planKey`. Has no amount field: the amount always comes
/// from the catalog.
#[derive(Clone, Debug, Deserialize)]
pub struct ProvisioningRequest {
    pub order_id: OrderId,

    #[serde(alias = "token")]
    pub presence_token: String,

    #[serde(alias = "planKey")]
    pub plan_key: String,

    pub hostname: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanCatalog;

    #[test]
    fn test_order_id_format() {
        let id = OrderId::generate();
        assert!(id.as_str().starts_with(ORDER_ID_PREFIX));

        let rest = &id.as_str()[ORDER_ID_PREFIX.len()..];
        let (millis, suffix) = rest.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_same_millisecond_ids_differ() {
        let now = Utc::now();
        let ids: Vec<_> = (0..256).map(|_| OrderId::generate_at(now)).collect();
        let mut unique = ids.clone();
        unique.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_order_amount_from_catalog() {
        let catalog = PlanCatalog::builtin();
        let order = Order::new(catalog.lookup("r2c2").unwrap());
        assert_eq!(order.plan_key, "r2c2");
        assert_eq!(order.amount, 500);
    }

    #[test]
    fn test_request_accepts_browser_field_names() {
        let json = r#"{"order_id":"ZAR-1","token":"tok","planKey":"r2c2","hostname":"box"}"#;
        let req: ProvisioningRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.order_id.as_str(), "ZAR-1");
        assert_eq!(req.presence_token, "tok");
        assert_eq!(req.plan_key, "r2c2");
    }

    #[test]
    fn test_request_ignores_forged_amount() {
        let json = r#"{"order_id":"ZAR-1","presence_token":"tok","plan_key":"r2c2","hostname":"box","amount":1}"#;
        let req: ProvisioningRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.plan_key, "r2c2");
    }
}
