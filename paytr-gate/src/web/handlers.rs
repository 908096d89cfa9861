//! Webhook endpoint handlers.
//!
//! By the time [`paytr_webhook`] runs, the notification has already been
//! verified and de-duplicated by [`verify_paytr`]. Crediting the order is
//! left to whatever consumes the admitted event.
//!
//! [`verify_paytr`]: crate::web::middleware::verify_paytr

use std::sync::Arc;

use axum::{http::StatusCode, Extension, Json};
use serde::Serialize;
use tracing::info;

use crate::gate::{Gate, VerifiedEvent};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<Gate>,
}

impl AppState {
    pub fn new(gate: Gate) -> Self {
        Self {
            gate: Arc::new(gate),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// PayTR Webhook
// =============================================================================

/// Webhook response.
#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

/// PayTR notification endpoint, reached only for admitted notifications.
pub async fn paytr_webhook(Extension(event): Extension<VerifiedEvent>) -> Json<WebhookResponse> {
    info!(
        merchant_oid = %event.business_id,
        fingerprint = %event.fingerprint,
        status = event.payload.get("status").map(String::as_str).unwrap_or(""),
        total_amount = event.payload.get("total_amount").map(String::as_str).unwrap_or(""),
        "paytr_verified"
    );

    Json(WebhookResponse { status: "ok" })
}

/// Fallback for unknown routes.
pub async fn not_found() -> (StatusCode, Json<WebhookResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(WebhookResponse {
            status: "not_found",
        }),
    )
}
