//! # vps-payments
//!
//! Payment side of the VPS checkout: gateway transactions, human-presence
//! verification and settlement checks.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  create   ┌─────────────────┐  scan & pay  ┌─────────────┐
//! │   Buyer     │──────────▶│ Pakasir (QRIS)  │◀─────────────│ Buyer's app │
//! │  checkout   │◀──────────│  transaction    │              └─────────────┘
//! └─────────────┘ QR image  └─────────────────┘
//!        │ confirm                  ▲
//!        ▼                          │ transaction detail
//! ┌─────────────┐  token    ┌───────┴─────────┐
//! │  Turnstile  │◀──────────│ PaymentVerifier │
//! └─────────────┘           └─────────────────┘
//! ```
//!
//! Both remote services sit behind traits ([`PaymentGateway`],
//! [`PresenceVerifier`]); every call runs under a deadline and every failure
//! leaves this crate as a [`vps_core::OrderError`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vps_payments::{PakasirClient, TransactionService};
//!
//! let gateway = Arc::new(PakasirClient::from_env()?);
//! let service = TransactionService::new(gateway, catalog);
//!
//! let created = service.create_transaction("r2c2").await?;
//! // Show the buyer: created.artifact.url()
//! ```

mod error;
mod gateway;
mod http;
pub mod mock;
mod pakasir;
mod qr;
mod transaction;
mod turnstile;
mod verifier;

pub use error::{PaymentError, Result};
pub use gateway::{GatewayTransaction, PaymentGateway, PresenceCheck, PresenceVerifier};
pub use http::DEFAULT_CALL_TIMEOUT;
pub use pakasir::{PakasirClient, PakasirConfig};
pub use qr::QrRenderer;
pub use transaction::{CreatedTransaction, PaymentArtifact, TransactionService};
pub use turnstile::{TurnstileClient, TurnstileConfig};
pub use verifier::{PaymentVerifier, SETTLED_TOKENS, is_settled};
