//! Web server module for handling inbound kiosk webhooks.
//!
//! Two endpoints plus a health check:
//! - `/webhook` verifies the kiosk signature and logs the payload
//! - `/add-to-album` relays each supplied asset to the Immich album

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    add_to_album, health, kiosk_webhook, AddToAlbumRequest, AppState, AssetRef, HealthResponse,
    SIGNATURE_HEADER,
};
pub use signature::verify_signature;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(kiosk_webhook))
        .route("/add-to-album", post(add_to_album))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
