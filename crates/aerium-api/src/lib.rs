//! HTTP and WebSocket client for the IAQ backend.
//!
//! The backend is an externally owned service; this crate is the only place
//! that knows its wire shapes and URL layout. It exposes:
//!
//! - **[`IaqClient`]** — `reqwest`-based access to the measurement window
//!   query, the site configuration document, and the preventive-action
//!   prediction endpoint.
//! - **[`PushHandle`]** — the live push channel. Connects to the backend's
//!   WebSocket endpoint, keeps the connection alive with periodic pings,
//!   reconnects with exponential backoff, and fans parsed [`PushMessage`]s
//!   out through a `tokio::sync::broadcast` channel.
//! - **Wire types** ([`types`]) — serde DTOs for everything the backend
//!   sends. Domain conversion happens in `aerium-core`, not here.

pub mod client;
pub mod error;
pub mod transport;
pub mod types;
pub mod websocket;

pub use client::IaqClient;
pub use error::Error;
pub use transport::TransportConfig;
pub use types::{
    EnseigneRecord, MeasurementRecord, PieceRecord, PredictionResponse, PreventiveActionRecord,
    SiteConfigResponse,
};
pub use websocket::{PushHandle, PushMessage, ReconnectConfig};
