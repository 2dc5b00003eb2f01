//! WebSocket push channel with auto-reconnect and keep-alive.
//!
//! The backend multiplexes several message kinds over one socket
//! (`measurement`, `prediction`, `action`, `alert`, `module_state`).
//! This module connects, pings the server on a fixed cadence so idle
//! connections aren't reaped, and streams parsed [`PushMessage`]s through
//! a [`tokio::sync::broadcast`] channel. Reconnection uses exponential
//! backoff with jitter.
//!
//! # Example
//!
//! ```rust,ignore
//! use aerium_api::websocket::{PushHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let ws_url = Url::parse("ws://iaq.local:8000/ws")?;
//!
//! let handle = PushHandle::connect(ws_url, ReconnectConfig::default(), cancel.clone());
//! let mut rx = handle.subscribe();
//!
//! while let Ok(msg) = rx.recv().await {
//!     println!("{}: {:?}", msg.topic, msg.room);
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Channel capacity & keep-alive cadence ────────────────────────────

const PUSH_CHANNEL_CAPACITY: usize = 1024;
const PING_INTERVAL: Duration = Duration::from_secs(30);

// ── PushMessage ──────────────────────────────────────────────────────

/// A parsed message from the backend push channel.
///
/// The backend tags every message with a `type` and, for room-scoped
/// topics, the brand ("enseigne") and room ("salle") it concerns.
/// Payload fields live under `data` (or `values` on older backends);
/// `extra` captures anything else so nothing is silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    /// Message kind: `"measurement"`, `"prediction"`, `"action"`,
    /// `"alert"`, `"module_state"`, or `"connection"` (greeting).
    #[serde(alias = "type")]
    pub topic: String,

    /// Brand this message concerns, if room-scoped.
    #[serde(default, alias = "enseigne")]
    pub brand: Option<String>,

    /// Room this message concerns, if room-scoped.
    #[serde(default, alias = "salle")]
    pub room: Option<String>,

    /// ISO-8601 timestamp stamped by the backend at broadcast time.
    #[serde(default)]
    pub timestamp: Option<String>,

    /// Topic payload.
    #[serde(default, alias = "values")]
    pub data: serde_json::Value,

    /// All remaining fields the backend sends.
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for push-channel reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── PushHandle ───────────────────────────────────────────────────────

/// Handle to a running push-channel task.
///
/// Subscribe as many consumers as needed; call [`shutdown`](Self::shutdown)
/// to tear down the background task.
pub struct PushHandle {
    message_rx: broadcast::Receiver<Arc<PushMessage>>,
    cancel: CancellationToken,
}

impl PushHandle {
    /// Spawn the connection loop and return immediately.
    ///
    /// The first connection attempt happens asynchronously — subscribe to
    /// the receiver to start consuming messages.
    pub fn connect(ws_url: Url, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        let (message_tx, message_rx) = broadcast::channel(PUSH_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            push_loop(ws_url, message_tx, reconnect, task_cancel).await;
        });

        Self { message_rx, cancel }
    }

    /// Get a new broadcast receiver for the message stream.
    ///
    /// If a consumer falls behind it receives
    /// [`broadcast::error::RecvError::Lagged`] — acceptable here, since the
    /// core only ever cares about the latest state per room.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PushMessage>> {
        self.message_rx.resubscribe()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn push_loop(
    ws_url: Url,
    message_tx: broadcast::Sender<Arc<PushMessage>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &message_tx, &cancel) => {
                match result {
                    // Clean disconnect: reset the counter, reconnect immediately.
                    Ok(()) => {
                        tracing::info!("push channel disconnected cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "push channel error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "push channel reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), attempt, "waiting before reconnect");

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }

                        attempt += 1;
                    }
                }
            }
        }
    }

    tracing::debug!("push channel loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one WebSocket connection and read until it drops.
///
/// A ping frame is sent every [`PING_INTERVAL`] so proxies and the backend
/// keep the idle connection open between bursts of measurements.
async fn connect_and_read(
    url: &Url,
    message_tx: &broadcast::Sender<Arc<PushMessage>>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to push channel");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("push channel connected");

    let (mut write, mut read) = ws_stream.split();
    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; swallow it.
    ping.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            _ = ping.tick() => {
                if let Err(e) = write.send(tungstenite::Message::Ping(tungstenite::Bytes::new())).await {
                    return Err(Error::WebSocketConnect(format!("ping failed: {e}")));
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        parse_and_broadcast(text.as_str(), message_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_))) => {
                        // tungstenite answers pings automatically; pongs
                        // just confirm our keep-alive got through.
                        tracing::trace!("push channel ping/pong");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(code = %cf.code, reason = %cf.reason, "push channel close frame");
                        } else {
                            tracing::info!("push channel close frame (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("push channel stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, raw frames — the backend never sends these.
                    }
                }
            }
        }
    }
}

// ── Message parsing ──────────────────────────────────────────────────

/// Parse a text frame and broadcast the message if it decodes.
///
/// Malformed frames are logged and skipped — a bad broadcast from the
/// backend must never take down the intake pipeline.
fn parse_and_broadcast(text: &str, message_tx: &broadcast::Sender<Arc<PushMessage>>) {
    let msg: PushMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse push message");
            return;
        }
    };

    // Ignore send errors — just means no active subscribers right now.
    let _ = message_tx.send(Arc::new(msg));
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is ±25% to spread reconnection storms from multiple dashboards
/// hitting the same backend.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(i32::try_from(attempt).unwrap_or(i32::MAX));
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number. Not random,
    // but good enough to desynchronize reconnecting clients.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_increases_exponentially() {
        let config = ReconnectConfig::default();

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);

        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d10 = calculate_backoff(10, &config);
        // With jitter up to 1.25x, the effective ceiling is 12.5s.
        assert!(
            d10 <= Duration::from_secs(13),
            "delay at attempt 10 ({d10:?}) should be capped near max_delay"
        );
    }

    #[test]
    fn deserialize_measurement_message() {
        let json = r#"{
            "type": "measurement",
            "timestamp": "2026-03-02T10:05:00Z",
            "sensor_id": "bureau1",
            "enseigne": "Maison",
            "salle": "Bureau",
            "values": { "co2": 950.0, "pm25": 8.2 }
        }"#;

        let msg: PushMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.topic, "measurement");
        assert_eq!(msg.brand.as_deref(), Some("Maison"));
        assert_eq!(msg.room.as_deref(), Some("Bureau"));
        assert_eq!(msg.data["co2"], 950.0);
        assert_eq!(msg.extra["sensor_id"], "bureau1");
    }

    #[test]
    fn deserialize_connection_greeting() {
        let json = r#"{
            "type": "connection",
            "status": "connected",
            "timestamp": "2026-03-02T10:00:00Z",
            "subscriptions": ["measurements", "predictions"]
        }"#;

        let msg: PushMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.topic, "connection");
        assert!(msg.brand.is_none());
        assert_eq!(msg.extra["status"], "connected");
    }

    #[test]
    fn parse_and_broadcast_valid_message() {
        let (tx, mut rx) = broadcast::channel(16);

        let raw = serde_json::json!({
            "type": "prediction",
            "enseigne": "Maison",
            "salle": "Bureau",
            "data": { "predicted_score": 72.5 }
        });

        parse_and_broadcast(&raw.to_string(), &tx);

        let msg = rx.try_recv().unwrap();
        assert_eq!(msg.topic, "prediction");
        assert_eq!(msg.data["predicted_score"], 72.5);
    }

    #[test]
    fn parse_and_broadcast_malformed_json() {
        let (tx, mut rx) = broadcast::channel::<Arc<PushMessage>>(16);

        parse_and_broadcast("not json at all", &tx);

        // Should not panic, should just log and skip.
        assert!(rx.try_recv().is_err());
    }
}
