//! Monitor configuration.

use std::time::Duration;

use url::Url;

/// Everything the [`Monitor`](crate::Monitor) needs to talk to a backend.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Backend root URL, e.g. `http://iaq.local:8000`.
    pub base_url: Url,

    /// Push channel URL. Derived from `base_url` when `None`.
    pub ws_url: Option<Url>,

    /// Measurement poll cadence.
    pub poll_interval: Duration,

    /// Prediction refresh cadence.
    pub prediction_interval: Duration,

    /// Window query span, in hours.
    pub window_hours: u32,

    /// Window aggregation step ("1min", "5min", "daily", ...).
    pub window_step: String,

    /// HTTP timeout.
    pub timeout: Duration,

    /// Whether to open the push channel at all. Polling still runs as a
    /// fallback either way.
    pub websocket_enabled: bool,
}

impl MonitorConfig {
    /// Config with dashboard defaults for the given backend URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            ws_url: None,
            poll_interval: Duration::from_secs(5),
            prediction_interval: Duration::from_secs(60),
            window_hours: 1,
            window_step: "1min".into(),
            timeout: Duration::from_secs(30),
            websocket_enabled: true,
        }
    }
}
