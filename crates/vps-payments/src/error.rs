//! Payment Error Types

use std::time::Duration;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Transport-level failures of the gateway and presence-verification clients.
///
/// These never leave this crate's services: [`TransactionService`] and
/// [`PaymentVerifier`] translate them into [`vps_core::OrderError`].
///
/// [`TransactionService`]: crate::TransactionService
/// [`PaymentVerifier`]: crate::PaymentVerifier
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Connection, TLS or client-side timeout
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote answered with a non-success status
    #[error("Remote rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Malformed(String),

    /// Call exceeded its deadline
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::Malformed(_) | Self::Config(_) => false,
        }
    }
}
