//! Request middleware that runs the verification gate.
//!
//! The body is buffered verbatim before any parsing so the fingerprint is
//! taken over the exact bytes PayTR sent. Admitted requests continue with
//! the same body and a [`VerifiedEvent`] in their extensions.
//!
//! [`VerifiedEvent`]: crate::gate::VerifiedEvent

use axum::{
    body::{self, Body},
    extract::{Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use crate::gate::{IncomingEvent, RejectReason, Verdict};
use crate::web::handlers::{AppState, WebhookResponse};

/// Header some PayTR setups use instead of the `hash` form field.
pub const ALT_SIGNATURE_HEADER: &str = "X-Paytr-Hash";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Largest notification body accepted.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Gate a PayTR notification before it reaches its handler.
pub async fn verify_paytr(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let raw = match body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "paytr_body_unreadable");
            return status_response(StatusCode::BAD_REQUEST, "rejected");
        }
    };

    let alt_signature = parts
        .headers
        .get(ALT_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    // Only form bodies carry fields; anything else can still be signed via the header.
    let event = if is_form(&parts.headers) {
        IncomingEvent::from_urlencoded(raw.to_vec(), alt_signature)
    } else {
        IncomingEvent {
            raw: raw.to_vec(),
            alt_signature,
            ..Default::default()
        }
    };

    match state.gate.evaluate(&event) {
        Verdict::Admit(verified) => {
            let mut request = Request::from_parts(parts, Body::from(raw));
            request.extensions_mut().insert(verified);
            next.run(request).await
        }
        Verdict::Duplicate(reason) => {
            info!(reason = reason.as_str(), "paytr_notification_duplicate");
            status_response(StatusCode::OK, reason.ack_body())
        }
        Verdict::Reject(reason) => {
            warn!(reason = reason.as_str(), "paytr_notification_rejected");
            reject_response(reason)
        }
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}

/// Map a rejection to its HTTP answer.
///
/// The body never says which check failed; the reason is only logged.
pub fn reject_response(reason: RejectReason) -> Response {
    if reason.is_operational() {
        status_response(StatusCode::INTERNAL_SERVER_ERROR, "error")
    } else {
        status_response(StatusCode::BAD_REQUEST, "rejected")
    }
}

fn status_response(code: StatusCode, status: &'static str) -> Response {
    (code, Json(WebhookResponse { status })).into_response()
}
