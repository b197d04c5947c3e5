//! Kiosk Relay - webhook receiver that forwards assets to an Immich album.
//!
//! ## Architecture
//!
//! ```text
//! Kiosk webhooks → Web Server → [signature verification] → RelayClient → Immich
//! ```
//!
//! Handlers are stateless; the only process-wide state is the immutable
//! configuration and the shared HTTP client.

pub mod config;
pub mod relay;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use relay::{RelayClient, RelayError, RelayFault, RelayOutcome};
pub use web::AppState;
