//! Web server module for receiving PayTR notifications.
//!
//! This module provides a thin web layer that:
//! - Buffers the raw notification body
//! - Runs it through the verification gate
//! - Maps the verdict to an HTTP answer PayTR understands
//!
//! | Verdict | Status | Body |
//! |---|---|---|
//! | reject, misconfigured | 500 | `error` |
//! | reject, missing or bad signature | 400 | `rejected` |
//! | duplicate order id | 200 | `duplicate-oid` |
//! | duplicate payload | 200 | `duplicate` |
//! | admit | 200 | `ok` |

pub mod handlers;
pub mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

pub use handlers::{health, not_found, paytr_webhook, AppState, HealthResponse, WebhookResponse};
pub use middleware::{reject_response, verify_paytr, ALT_SIGNATURE_HEADER, MAX_BODY_BYTES};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/webhooks/paytr",
            post(paytr_webhook).layer(from_fn_with_state(state.clone(), verify_paytr)),
        )
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{self, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::default_field_order;
    use crate::gate::{Gate, MerchantSecrets};

    const GOLDEN_HASH: &str = "4LYs9RE2q1YcojJVcU6ezteLDZM6xiYaMXsvDqursCU=";
    const BODY: &str = "merchant_oid=A1&status=success&total_amount=100";

    fn configured_router() -> Router {
        let secrets = MerchantSecrets {
            key: "K".to_string(),
            salt: "S".to_string(),
        };
        router(AppState::new(Gate::new(Some(secrets), default_field_order())))
    }

    fn signed_body(hash: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(hash.as_bytes()).collect();
        format!("{}&hash={}", BODY, encoded)
    }

    fn post_notification(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhooks/paytr")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body.into())
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let app = configured_router();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_admit_then_duplicate_oid() {
        let app = configured_router();

        let (status, body) = send(&app, post_notification(signed_body(GOLDEN_HASH))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(&app, post_notification(signed_body(GOLDEN_HASH))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "duplicate-oid");
    }

    #[tokio::test]
    async fn test_header_signature() {
        let app = configured_router();
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/paytr")
            .header("content-type", "application/x-www-form-urlencoded")
            .header(ALT_SIGNATURE_HEADER, GOLDEN_HASH)
            .body(Body::from(BODY))
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_non_form_body_fields_are_ignored() {
        let app = configured_router();
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/paytr")
            .header("content-type", "text/plain")
            .body(Body::from(signed_body(GOLDEN_HASH)))
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "rejected");
    }

    #[tokio::test]
    async fn test_missing_signature_is_bad_request() {
        let app = configured_router();

        let (status, body) = send(&app, post_notification(BODY)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "rejected");
    }

    #[tokio::test]
    async fn test_tampered_signature_is_bad_request() {
        let app = configured_router();
        let tampered = GOLDEN_HASH.replacen('4', "5", 1);

        let (status, body) = send(&app, post_notification(signed_body(&tampered))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "rejected");
    }

    #[tokio::test]
    async fn test_misconfigured_is_server_error() {
        let app = router(AppState::new(Gate::new(None, default_field_order())));

        let (status, body) = send(&app, post_notification(signed_body(GOLDEN_HASH))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_replayed_payload_without_oid_is_duplicate() {
        let secrets = MerchantSecrets {
            key: "K".to_string(),
            salt: "S".to_string(),
        };
        let order = vec!["status".to_string(), "total_amount".to_string()];
        let app = router(AppState::new(Gate::new(Some(secrets), order)));

        let hash = crate::gate::sign("success100S", "K").unwrap();
        let encoded: String = url::form_urlencoded::byte_serialize(hash.as_bytes()).collect();
        let body = format!("status=success&total_amount=100&hash={}", encoded);

        let (status, json) = send(&app, post_notification(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");

        let (status, json) = send(&app, post_notification(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "duplicate");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let app = configured_router();
        let huge = vec![b'a'; MAX_BODY_BYTES + 1];

        let (status, body) = send(&app, post_notification(huge)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "rejected");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = configured_router();
        let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "not_found");
    }
}
