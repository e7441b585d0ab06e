//! Error Types

use thiserror::Error;

/// Result type alias for checkout workflow operations
pub type Result<T> = std::result::Result<T, OrderError>;

/// Failure kinds of the checkout and provisioning workflow.
///
/// Every external-call failure is converted into one of these at the stage
/// where it happens. Address discovery timing out is not an error: it is
/// reported as [`InstanceAddress::Pending`](crate::InstanceAddress::Pending)
/// on a successful result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Request body missing, malformed or not JSON
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Plan key not present in the catalog
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    /// Hostname rejected before any remote call
    #[error("Invalid hostname: {0}")]
    InvalidHostname(String),

    /// Payment gateway failed to create a transaction, or answered without
    /// a usable payment artifact
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Presence-verification service could not be reached
    #[error("Captcha error: {0}")]
    CaptchaUnavailable(String),

    /// Presence token was rejected
    #[error("Captcha invalid")]
    CaptchaInvalid,

    /// Settlement status could not be fetched
    #[error("Payment check error: {0}")]
    PaymentCheck(String),

    /// Gateway reports the transaction as not settled yet
    #[error("Payment pending (status: {status:?})")]
    PaymentPending { status: String },

    /// Cloud provider refused or failed the instance creation
    #[error("Provisioning error: {0}")]
    Provisioning(String),
}

impl OrderError {
    /// Only a pending payment is worth re-submitting unchanged.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::PaymentPending { .. })
    }

    /// Stable machine-readable code for API responses
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::InvalidPlan(_) => "INVALID_PLAN",
            Self::InvalidHostname(_) => "INVALID_HOSTNAME",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::CaptchaUnavailable(_) => "CAPTCHA_ERROR",
            Self::CaptchaInvalid => "CAPTCHA_INVALID",
            Self::PaymentCheck(_) => "PAYMENT_CHECK_ERROR",
            Self::PaymentPending { .. } => "PAYMENT_PENDING",
            Self::Provisioning(_) => "PROVISIONING_ERROR",
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRequest(detail) => format!("Invalid request: {detail}"),
            Self::InvalidPlan(_) => "Invalid Plan".into(),
            Self::InvalidHostname(name) => format!("Invalid hostname '{name}'"),
            Self::Gateway(_) => "Gateway Error".into(),
            Self::CaptchaUnavailable(_) => "Captcha Error".into(),
            Self::CaptchaInvalid => "Captcha Invalid".into(),
            Self::PaymentCheck(_) => "Payment Check Error".into(),
            Self::PaymentPending { .. } => "Payment Pending".into(),
            Self::Provisioning(_) => "Provisioning Error".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_is_retryable() {
        assert!(OrderError::PaymentPending { status: "PENDING".into() }.is_retryable());
        assert!(!OrderError::CaptchaInvalid.is_retryable());
        assert!(!OrderError::Provisioning("boom".into()).is_retryable());
        assert!(!OrderError::Gateway("boom".into()).is_retryable());
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            OrderError::InvalidRequest("x".into()),
            OrderError::InvalidPlan("x".into()),
            OrderError::InvalidHostname("x".into()),
            OrderError::Gateway("x".into()),
            OrderError::CaptchaUnavailable("x".into()),
            OrderError::CaptchaInvalid,
            OrderError::PaymentCheck("x".into()),
            OrderError::PaymentPending { status: String::new() },
            OrderError::Provisioning("x".into()),
        ];
        let mut codes: Vec<_> = errors.iter().map(OrderError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
