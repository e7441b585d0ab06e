//! Shared HTTP plumbing for the gateway and presence clients

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::{PaymentError, Result};

/// Default per-call deadline for every remote call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("vps-payments/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PaymentError::Config(format!("HTTP client: {e}")))
}

/// Reject non-2xx responses and decode the body as JSON
pub(crate) async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PaymentError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| PaymentError::Malformed(e.to_string()))
}

/// Run a remote call under a deadline
pub(crate) async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| PaymentError::Timeout(deadline))?
}
