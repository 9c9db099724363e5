//! # Request Handlers
//!
//! Axum request handlers for the development payment server.

use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use blossom_core::{InvoiceRequest, PaymentDetails, PaymentError, StatusResponse};
use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

// =============================================================================
// Response Types
// =============================================================================

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn payment_error_to_response(err: PaymentError) -> ApiError {
    let code = err.status_code();
    if code >= 500 {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }

    let mut response = ErrorResponse::new(err.to_string(), code);
    if let PaymentError::InvoiceNotFound { invoice_id } = &err {
        response = response.with_details(format!("invoice_id={}", invoice_id));
    }
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "blossom-payd",
        "version": env!("CARGO_PKG_VERSION"),
        "invoices": state.invoices.len()
    }))
}

/// Issue an invoice for a Blossom server purchase
#[instrument(skip(state, request), fields(amount_sats = request.amount_sats))]
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(request): Json<InvoiceRequest>,
) -> Result<(StatusCode, Json<PaymentDetails>), ApiError> {
    let ttl = Duration::try_seconds(state.config.invoice_ttl_secs).ok_or_else(|| {
        payment_error_to_response(PaymentError::Configuration(format!(
            "invoice TTL out of range: {}s",
            state.config.invoice_ttl_secs
        )))
    })?;
    let details = state
        .invoices
        .create(&request, ttl, Utc::now())
        .map_err(payment_error_to_response)?;

    info!(
        "Issued invoice {} for {} sats",
        details.invoice_id, details.amount_sats
    );

    Ok((StatusCode::CREATED, Json(details)))
}

/// Report the status of an invoice
#[instrument(skip(state))]
pub async fn get_payment_status(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let status = state
        .invoices
        .status(&invoice_id, Utc::now())
        .map_err(payment_error_to_response)?;

    Ok(Json(StatusResponse::new(status)))
}

/// Simulate settlement by forcing an invoice's status
#[instrument(skip(state, body))]
pub async fn update_payment_status(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    Json(body): Json<StatusResponse>,
) -> Result<Json<StatusResponse>, ApiError> {
    let next = body.parse_status().map_err(payment_error_to_response)?;
    let status = state
        .invoices
        .set_status(&invoice_id, next, Utc::now())
        .map_err(payment_error_to_response)?;

    Ok(Json(StatusResponse::new(status)))
}

/// Cancel a pending invoice
#[instrument(skip(state))]
pub async fn cancel_payment(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let status = state
        .invoices
        .cancel(&invoice_id, Utc::now())
        .map_err(payment_error_to_response)?;

    Ok(Json(StatusResponse::new(status)))
}
