//! Webhook endpoint handlers.
//!
//! Both endpoints are stateless and request-scoped: nothing is persisted
//! between requests, and the only shared state is the immutable
//! configuration and the relay client inside [`AppState`].

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::relay::{RelayClient, RelayOutcome};
use crate::web::signature::verify_signature;
use crate::Config;

/// Header carrying the kiosk's HMAC signature of the request body.
pub const SIGNATURE_HEADER: &str = "X-Kiosk-Signature-256";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: RelayClient,
}

impl AppState {
    pub fn new(config: Config, relay: RelayClient) -> Self {
        Self {
            config: Arc::new(config),
            relay,
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
pub async fn health() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Kiosk Webhook
// =============================================================================

/// Kiosk webhook endpoint.
///
/// If the request carries an `X-Kiosk-Signature-256` header, it is verified
/// against the raw body before anything is parsed; a bad signature rejects
/// the request without processing the payload. Requests without the header
/// are accepted unverified, matching the kiosk's observed behavior.
pub async fn kiosk_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    if let Some(value) = headers.get(SIGNATURE_HEADER) {
        // A header that is present but unreadable must reject, not pass
        // through as if it were absent.
        let signature = value.to_str().ok();
        if !verify_signature(&body, &state.config.secret, signature) {
            error!("webhook_signature_invalid");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error");
        }
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "webhook_invalid_json");
            return (StatusCode::BAD_REQUEST, "Invalid JSON payload");
        }
    };

    info!(payload = %payload, "webhook_payload_received");

    (StatusCode::OK, "Payload received!")
}

// =============================================================================
// Add To Album
// =============================================================================

/// One asset reference from the kiosk payload.
#[derive(Debug, Deserialize)]
pub struct AssetRef {
    #[serde(default)]
    pub id: Option<String>,
}

/// Album request payload.
#[derive(Debug, Deserialize)]
pub struct AddToAlbumRequest {
    #[serde(default)]
    pub assets: Option<Vec<AssetRef>>,
}

/// Endpoint that adds the supplied assets to the configured album.
///
/// Assets are relayed in the order supplied. An asset without an id is
/// logged and skipped; an ordinary remote failure is recovered inside the
/// relay client and does not abort the batch. Only a relay fault (a
/// contract violation, not a remote failure) aborts the batch, and assets
/// not yet reached are never attempted.
pub async fn add_to_album(
    State(state): State<AppState>,
    Json(request): Json<AddToAlbumRequest>,
) -> Response {
    let assets = match request.assets {
        Some(assets) => assets,
        None => {
            warn!("album_assets_missing");
            return (StatusCode::BAD_REQUEST, "Missing asset ID").into_response();
        }
    };

    info!(asset_count = assets.len(), "album_batch_start");

    for asset in assets {
        let asset_id = match asset.id {
            Some(id) => id,
            None => {
                error!("album_asset_missing_id");
                continue;
            }
        };

        match state
            .relay
            .add_to_album(&state.config.album_id, &asset_id)
            .await
        {
            Ok(RelayOutcome::Success(_)) => {
                info!(asset_id = %asset_id, "album_asset_added");
            }
            Ok(RelayOutcome::Failed(e)) => {
                // The relay client already logged the failure with URL and
                // status context; this only ties it to the asset id.
                debug!(asset_id = %asset_id, error = %e, "album_asset_add_failed");
            }
            Err(fault) => {
                error!(asset_id = %asset_id, error = %fault, "album_batch_aborted");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to add asset to album: {fault}"),
                )
                    .into_response();
            }
        }
    }

    info!("album_batch_complete");

    (StatusCode::OK, "Added to album").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::app;

    use axum::body::Body;
    use axum::http::Request;
    use hmac::{Hmac, Mac};
    use http_body_util::BodyExt;
    use sha2::Sha256;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_SECRET: &str = "test-secret";

    fn test_state(base_url: &str) -> AppState {
        let config = Config {
            secret: TEST_SECRET.to_string(),
            immich_url: base_url.to_string(),
            immich_api_key: "test-api-key".to_string(),
            album_id: "album-1".to_string(),
            port: 0,
            request_timeout_ms: 2000,
        };
        let relay = RelayClient::new(&config).unwrap();
        AppState::new(config, relay)
    }

    fn sign(body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SECRET.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn webhook_request(body: &'static str, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("Content-Type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn album_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/add-to-album")
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        let app = app(test_state(&server.uri()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_webhook_valid_signature() {
        let server = MockServer::start().await;
        let app = app(test_state(&server.uri()));

        let body = r#"{"event":"asset.created"}"#;
        let response = app
            .oneshot(webhook_request(body, Some(sign(body.as_bytes()))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Payload received!");
    }

    #[tokio::test]
    async fn test_webhook_invalid_signature() {
        let server = MockServer::start().await;
        let app = app(test_state(&server.uri()));

        let response = app
            .oneshot(webhook_request(
                r#"{"event":"asset.created"}"#,
                Some(sign(b"different body")),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "Error");
    }

    #[tokio::test]
    async fn test_webhook_no_signature_accepted() {
        let server = MockServer::start().await;
        let app = app(test_state(&server.uri()));

        let response = app
            .oneshot(webhook_request(r#"{"event":"asset.created"}"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_webhook_invalid_json() {
        let server = MockServer::start().await;
        let app = app(test_state(&server.uri()));

        let body = "not json";
        let response = app
            .oneshot(webhook_request(body, Some(sign(body.as_bytes()))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_album_missing_assets_key() {
        let server = MockServer::start().await;

        // No outbound call may be made.
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let app = app(test_state(&server.uri()));
        let response = app.oneshot(album_request("{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Missing asset ID");
    }

    #[tokio::test]
    async fn test_album_empty_assets() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let app = app(test_state(&server.uri()));
        let response = app.oneshot(album_request(r#"{"assets":[]}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Added to album");
    }

    #[tokio::test]
    async fn test_album_skips_assets_without_id() {
        let server = MockServer::start().await;

        // Exactly two calls: "a" and "c"; the middle asset has no id.
        Mock::given(method("PUT"))
            .and(path("/api/albums/album-1/assets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(2)
            .mount(&server)
            .await;

        let app = app(test_state(&server.uri()));
        let response = app
            .oneshot(album_request(
                r#"{"assets":[{"id":"a"},{},{"id":"c"}]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Added to album");
    }

    #[tokio::test]
    async fn test_album_fault_aborts_batch_with_500() {
        // A base URL that endpoints cannot be joined against faults on the
        // first asset; the batch aborts and no outbound call is ever made.
        let app = app(test_state("mailto:kiosk@example.com"));

        let response = app
            .oneshot(album_request(r#"{"assets":[{"id":"a"},{"id":"b"}]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert!(
            body.starts_with("Failed to add asset to album:"),
            "unexpected body: {body}"
        );
    }

    #[tokio::test]
    async fn test_album_remote_failures_do_not_abort_batch() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let app = app(test_state(&server.uri()));
        let response = app
            .oneshot(album_request(r#"{"assets":[{"id":"a"},{"id":"b"}]}"#))
            .await
            .unwrap();

        // Ordinary remote failures are tolerated per asset.
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Added to album");
    }
}
