//! DigitalOcean Droplet Client
//!
//! Implementation of `CloudProvider` on the DigitalOcean v2 API.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use vps_core::InstanceId;

use crate::cloud::{CloudProvider, DEFAULT_CALL_TIMEOUT, InstanceRequest};
use crate::error::{CloudError, Result};

/// DigitalOcean client configuration
#[derive(Clone, Debug)]
pub struct DigitalOceanConfig {
    /// API base URL
    pub base_url: String,

    /// Personal access token (sent as bearer credential)
    pub api_token: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl DigitalOceanConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.digitalocean.com";

    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.into(),
            api_token: api_token.into(),
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_token = std::env::var("DO_API_KEY")
            .map_err(|_| CloudError::Config("DO_API_KEY not set".into()))?;

        let mut config = Self::new(api_token);
        if let Ok(base_url) = std::env::var("DO_BASE_URL") {
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

#[derive(Deserialize)]
struct DropletEnvelope {
    droplet: Droplet,
}

#[derive(Deserialize)]
struct Droplet {
    id: u64,
    #[serde(default)]
    networks: Networks,
}

#[derive(Default, Deserialize)]
struct Networks {
    #[serde(default)]
    v4: Vec<V4Network>,
}

#[derive(Deserialize)]
struct V4Network {
    ip_address: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

impl Networks {
    /// Parseable IPv4 addresses, public interfaces first
    fn ipv4(&self) -> Vec<Ipv4Addr> {
        let mut nets: Vec<&V4Network> = self.v4.iter().collect();
        nets.sort_by_key(|n| n.kind != "public");

        nets.into_iter()
            .filter_map(|n| match n.ip_address.parse() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    tracing::warn!(ip = %n.ip_address, "Ignoring unparseable IPv4 address");
                    None
                }
            })
            .collect()
    }
}

/// DigitalOcean API client
pub struct DigitalOceanClient {
    http: reqwest::Client,
    config: DigitalOceanConfig,
}

impl DigitalOceanClient {
    pub fn new(config: DigitalOceanConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CloudError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(DigitalOceanConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(text);
            return Err(CloudError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CloudError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl CloudProvider for DigitalOceanClient {
    async fn create_instance(&self, request: &InstanceRequest) -> Result<InstanceId> {
        let response = self
            .http
            .post(self.url("/v2/droplets"))
            .bearer_auth(&self.config.api_token)
            .json(request)
            .send()
            .await?;

        let envelope: DropletEnvelope = Self::decode(response).await?;
        Ok(InstanceId(envelope.droplet.id))
    }

    async fn ipv4_addresses(&self, id: InstanceId) -> Result<Vec<Ipv4Addr>> {
        let response = self
            .http
            .get(self.url(&format!("/v2/droplets/{id}")))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        let envelope: DropletEnvelope = Self::decode(response).await?;
        Ok(envelope.droplet.networks.ipv4())
    }

    fn name(&self) -> &str {
        "DigitalOcean"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DigitalOceanConfig::new("token");
        assert_eq!(config.base_url, "https://api.digitalocean.com");
        assert_eq!(config.timeout, DEFAULT_CALL_TIMEOUT);
    }

    #[test]
    fn test_create_response_parsing() {
        let envelope: DropletEnvelope =
            serde_json::from_str(r#"{"droplet":{"id":3164444,"name":"box","networks":{"v4":[],"v6":[]}}}"#)
                .unwrap();
        assert_eq!(envelope.droplet.id, 3_164_444);
        assert!(envelope.droplet.networks.ipv4().is_empty());
    }

    #[test]
    fn test_public_address_first() {
        let envelope: DropletEnvelope = serde_json::from_str(
            r#"{"droplet":{"id":1,"networks":{"v4":[
                {"ip_address":"10.130.0.2","type":"private"},
                {"ip_address":"not-an-ip","type":"public"},
                {"ip_address":"203.0.113.10","type":"public"}
            ]}}}"#,
        )
        .unwrap();

        assert_eq!(
            envelope.droplet.networks.ipv4(),
            vec![Ipv4Addr::new(203, 0, 113, 10), Ipv4Addr::new(10, 130, 0, 2)]
        );
    }

    #[test]
    fn test_missing_networks() {
        let envelope: DropletEnvelope = serde_json::from_str(r#"{"droplet":{"id":9}}"#).unwrap();
        assert!(envelope.droplet.networks.ipv4().is_empty());
    }
}
