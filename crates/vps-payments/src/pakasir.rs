//! Pakasir QRIS Gateway Client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use vps_core::OrderId;

use crate::error::{PaymentError, Result};
use crate::gateway::{GatewayTransaction, PaymentGateway};
use crate::http::{DEFAULT_CALL_TIMEOUT, build_client, decode_json};

/// Pakasir client configuration
#[derive(Clone, Debug)]
pub struct PakasirConfig {
    /// API base URL
    pub base_url: String,

    /// Project slug registered with Pakasir
    pub project: String,

    pub api_key: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl PakasirConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://app.pakasir.com";

    pub fn new(project: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.into(),
            project: project.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let project = std::env::var("PAKASIR_SLUG")
            .map_err(|_| PaymentError::Config("PAKASIR_SLUG not set".into()))?;
        let api_key = std::env::var("PAKASIR_API_KEY")
            .map_err(|_| PaymentError::Config("PAKASIR_API_KEY not set".into()))?;

        let mut config = Self::new(project, api_key);
        if let Ok(base_url) = std::env::var("PAKASIR_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct CreateTransactionBody<'a> {
    project: &'a str,
    api_key: &'a str,
    order_id: &'a str,
    amount: u64,
}

/// Create response. The gateway nests payment details under `payment` in
/// some versions and returns them flat in others.
#[derive(Debug, Default, Deserialize)]
struct CreateTransactionResponse {
    code: Option<String>,
    qris_string: Option<String>,
    payment_number: Option<String>,
    payment: Option<PaymentDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentDetails {
    code: Option<String>,
    payment_number: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl CreateTransactionResponse {
    fn into_transaction(self) -> GatewayTransaction {
        let (nested_code, nested_number) = self
            .payment
            .map(|p| (p.code, p.payment_number))
            .unwrap_or_default();

        GatewayTransaction {
            payment_code: non_empty(self.code).or_else(|| non_empty(nested_code)),
            payment_string: non_empty(nested_number)
                .or_else(|| non_empty(self.payment_number))
                .or_else(|| non_empty(self.qris_string)),
        }
    }
}

/// Read the status from `transaction.status`, falling back to a top-level
/// `status`. Non-string scalars are rendered as text.
fn extract_status(body: &Value) -> String {
    let tx = body
        .get("transaction")
        .filter(|t| t.is_object())
        .unwrap_or(body);

    match tx.get("status") {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Pakasir gateway client
pub struct PakasirClient {
    http: reqwest::Client,
    config: PakasirConfig,
}

impl PakasirClient {
    pub fn new(config: PakasirConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(config.timeout)?,
            config,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(PakasirConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PaymentGateway for PakasirClient {
    async fn create_transaction(&self, order_id: &OrderId, amount: u64) -> Result<GatewayTransaction> {
        let body = CreateTransactionBody {
            project: &self.config.project,
            api_key: &self.config.api_key,
            order_id: order_id.as_str(),
            amount,
        };

        let response = self
            .http
            .post(self.url("/api/transactioncreate/qris"))
            .json(&body)
            .send()
            .await?;

        let parsed: CreateTransactionResponse = decode_json(response).await?;
        Ok(parsed.into_transaction())
    }

    async fn transaction_status(&self, order_id: &OrderId, amount: u64) -> Result<String> {
        let amount = amount.to_string();
        let response = self
            .http
            .get(self.url("/api/transactiondetail"))
            .query(&[
                ("project", self.config.project.as_str()),
                ("amount", amount.as_str()),
                ("order_id", order_id.as_str()),
                ("api_key", self.config.api_key.as_str()),
            ])
            .send()
            .await?;

        let body: Value = decode_json(response).await?;
        Ok(extract_status(&body))
    }

    fn hosted_image_url(&self, payment_code: &str) -> String {
        format!("{}/qris/{payment_code}.png", self.config.base_url.trim_end_matches('/'))
    }

    fn name(&self) -> &str {
        "Pakasir"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> GatewayTransaction {
        serde_json::from_value::<CreateTransactionResponse>(body)
            .unwrap()
            .into_transaction()
    }

    #[test]
    fn test_config_defaults() {
        let config = PakasirConfig::new("zarvps", "key");
        assert_eq!(config.base_url, "https://app.pakasir.com");
        assert_eq!(config.timeout, DEFAULT_CALL_TIMEOUT);
    }

    #[test]
    fn test_nested_payment_response() {
        let tx = parse(json!({
            "payment": { "payment_number": "00020101021226", "code": "" }
        }));
        assert_eq!(tx.payment_code, None);
        assert_eq!(tx.payment_string.as_deref(), Some("00020101021226"));
    }

    #[test]
    fn test_top_level_code_wins() {
        let tx = parse(json!({
            "code": "PKS123",
            "payment": { "code": "OTHER", "payment_number": "000201" }
        }));
        assert_eq!(tx.payment_code.as_deref(), Some("PKS123"));
        assert_eq!(tx.payment_string.as_deref(), Some("000201"));
    }

    #[test]
    fn test_flat_qris_string() {
        let tx = parse(json!({ "qris_string": "000201abc" }));
        assert_eq!(tx.payment_string.as_deref(), Some("000201abc"));
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(parse(json!({})), GatewayTransaction::default());
    }

    #[test]
    fn test_status_extraction() {
        assert_eq!(extract_status(&json!({"transaction": {"status": "completed"}})), "completed");
        assert_eq!(extract_status(&json!({"status": "PENDING"})), "PENDING");
        assert_eq!(extract_status(&json!({"transaction": null, "status": "BERHASIL"})), "BERHASIL");
        assert_eq!(extract_status(&json!({"transaction": {}})), "");
        assert_eq!(extract_status(&json!({"status": 1})), "1");
    }

    #[test]
    fn test_hosted_image_url() {
        let client = PakasirClient::new(PakasirConfig::new("zarvps", "key")).unwrap();
        assert_eq!(
            client.hosted_image_url("PKS123"),
            "https://app.pakasir.com/qris/PKS123.png"
        );
    }
}
