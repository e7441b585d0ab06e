//! Cloudflare Turnstile Presence Verifier

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};
use crate::gateway::{PresenceCheck, PresenceVerifier};
use crate::http::{DEFAULT_CALL_TIMEOUT, build_client, decode_json};

/// Turnstile configuration
#[derive(Clone, Debug)]
pub struct TurnstileConfig {
    /// Siteverify endpoint
    pub verify_url: String,

    /// Server-side secret
    pub secret_key: String,

    /// Public site key rendered into the checkout widget
    pub site_key: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,
}

impl TurnstileConfig {
    pub const DEFAULT_VERIFY_URL: &'static str =
        "https://challenges.cloudflare.com/turnstile/v0/siteverify";

    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            verify_url: Self::DEFAULT_VERIFY_URL.into(),
            secret_key: secret_key.into(),
            site_key: None,
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("TURNSTILE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("TURNSTILE_SECRET_KEY not set".into()))?;

        let mut config = Self::new(secret_key);
        config.site_key = std::env::var("TURNSTILE_SITE_KEY").ok();
        if let Ok(url) = std::env::var("TURNSTILE_VERIFY_URL") {
            config.verify_url = url;
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
struct SiteverifyBody<'a> {
    secret: &'a str,
    response: &'a str,
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// Turnstile siteverify client
pub struct TurnstileClient {
    http: reqwest::Client,
    config: TurnstileConfig,
}

impl TurnstileClient {
    pub fn new(config: TurnstileConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(config.timeout)?,
            config,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(TurnstileConfig::from_env()?)
    }

    /// Public site key, if configured
    pub fn site_key(&self) -> Option<&str> {
        self.config.site_key.as_deref()
    }
}

#[async_trait]
impl PresenceVerifier for TurnstileClient {
    async fn verify(&self, token: &str) -> Result<PresenceCheck> {
        let response = self
            .http
            .post(&self.config.verify_url)
            .json(&SiteverifyBody {
                secret: &self.config.secret_key,
                response: token,
            })
            .send()
            .await?;

        let parsed: SiteverifyResponse = decode_json(response).await?;
        Ok(PresenceCheck {
            success: parsed.success,
            error_codes: parsed.error_codes,
        })
    }
}
