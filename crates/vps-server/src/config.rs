//! Server Configuration
//!
//! Listener and shared settings. Gateway, presence-verification and cloud
//! credentials are loaded by their clients' own `from_env()`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Interface to bind (`BIND_HOST`, default `0.0.0.0`)
    pub host: String,

    /// Listening port (`PORT`, default 3000)
    pub port: u16,

    /// Deadline for every outbound call (`HTTP_TIMEOUT_SECS`, default 15)
    pub call_timeout: Duration,

    /// Static assets served on unmatched paths (`STATIC_DIR`, default `public`)
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            call_timeout: Duration::from_secs(15),
            static_dir: PathBuf::from("public"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = get("BIND_HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port: {port:?}"))?;
        }
        if let Some(secs) = get("HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("HTTP_TIMEOUT_SECS is not a number: {secs:?}"))?;
            anyhow::ensure!(secs > 0, "HTTP_TIMEOUT_SECS must be positive");
            config.call_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = get("STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.call_timeout, Duration::from_secs(15));
        assert_eq!(config.static_dir, PathBuf::from("public"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[("PORT", "8080"), ("BIND_HOST", "127.0.0.1"), ("HTTP_TIMEOUT_SECS", "5")]).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.call_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("PORT", "http")]).is_err());
        assert!(load(&[("HTTP_TIMEOUT_SECS", "0")]).is_err());
    }
}
