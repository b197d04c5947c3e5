//! Outbound relay module for the Immich API.

pub mod client;

pub use client::{RelayClient, RelayError, RelayFault, RelayOutcome};
