//! HTTP Handlers

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use vps_core::{InstanceId, OrderError, OrderId, Plan, ProvisionedInstance, ProvisioningRequest};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,

    /// Whether re-submitting the same request later can succeed
    pub retryable: bool,
}

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub plans: Vec<Plan>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    pub plan: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub plan_key: String,
    pub plan: Plan,
    pub site_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Missing key is reported as an invalid plan
    #[serde(alias = "planKey", default)]
    pub plan_key: String,
}

#[derive(Debug, Serialize)]
pub struct CreateTransactionResponse {
    pub success: bool,
    pub order_id: OrderId,
    #[serde(rename = "qrUrl")]
    pub qr_url: String,
    pub amount: u64,
}

#[derive(Debug, Serialize)]
pub struct InstanceView {
    pub id: InstanceId,

    /// IPv4 address, or the pending marker
    pub ip: String,
    pub password: String,
    pub hostname: String,
    pub address_pending: bool,
}

impl From<ProvisionedInstance> for InstanceView {
    fn from(instance: ProvisionedInstance) -> Self {
        Self {
            id: instance.instance_id,
            ip: instance.address.to_string(),
            password: instance.initial_password.into_inner(),
            hostname: instance.hostname.to_string(),
            address_pending: instance.address.is_pending(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckStatusResponse {
    pub success: bool,
    pub data: InstanceView,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

const fn status_for(error: &OrderError) -> StatusCode {
    match error {
        OrderError::InvalidRequest(_) | OrderError::InvalidPlan(_) | OrderError::InvalidHostname(_) => {
            StatusCode::BAD_REQUEST
        }
        OrderError::CaptchaInvalid => StatusCode::FORBIDDEN,
        OrderError::PaymentPending { .. } => StatusCode::PAYMENT_REQUIRED,
        OrderError::Gateway(_)
        | OrderError::CaptchaUnavailable(_)
        | OrderError::PaymentCheck(_)
        | OrderError::Provisioning(_) => StatusCode::BAD_GATEWAY,
    }
}

fn api_error(error: &OrderError) -> ApiError {
    (
        status_for(error),
        Json(ErrorResponse {
            error: error.user_message(),
            code: error.code().into(),
            retryable: error.is_retryable(),
        }),
    )
}

/// Unreadable JSON bodies get the same error shape as workflow errors
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| api_error(&OrderError::InvalidRequest(rejection.body_text())))
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Plan catalog
pub async fn list_plans(State(state): State<AppState>) -> Json<PlansResponse> {
    Json(PlansResponse {
        plans: state.catalog.plans().to_vec(),
    })
}

/// Data for the checkout view of one plan
pub async fn checkout(
    State(state): State<AppState>,
    Query(query): Query<CheckoutQuery>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let plan = state.catalog.lookup(&query.plan).map_err(|e| api_error(&e))?;

    Ok(Json(CheckoutResponse {
        plan_key: plan.key.clone(),
        plan: plan.clone(),
        site_key: state.site_key.clone(),
    }))
}

/// Register a gateway transaction and return the QR image to pay with
pub async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<Json<CreateTransactionResponse>, ApiError> {
    let payload = body(payload)?;
    let created = state
        .transactions
        .create_transaction(&payload.plan_key)
        .await
        .map_err(|e| api_error(&e))?;

    Ok(Json(CreateTransactionResponse {
        success: true,
        qr_url: created.artifact.url().to_string(),
        order_id: created.order.order_id,
        amount: created.order.amount,
    }))
}

/// Confirm presence and payment, then provision. Blocks for up to the
/// address poll bound.
pub async fn check_status(
    State(state): State<AppState>,
    payload: Result<Json<ProvisioningRequest>, JsonRejection>,
) -> Result<Json<CheckStatusResponse>, ApiError> {
    let payload = body(payload)?;
    let instance = state
        .orchestrator
        .confirm(&payload)
        .await
        .map_err(|e| api_error(&e))?;

    Ok(Json(CheckStatusResponse {
        success: true,
        data: instance.into(),
    }))
}
