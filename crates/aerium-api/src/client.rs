// IAQ backend HTTP client
//
// Wraps `reqwest::Client` with backend-specific URL construction and
// uniform status/body handling. All methods return decoded wire types;
// callers never see raw responses.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{MeasurementRecord, PredictionResponse, SiteConfigResponse};

/// HTTP client for the IAQ backend.
///
/// The backend exposes a small read surface: a measurement window query,
/// the site configuration document, and the preventive-action prediction
/// endpoint. Writes (config CRUD, action execution) are outside the
/// dashboard core and are not wrapped here.
pub struct IaqClient {
    http: reqwest::Client,
    base_url: Url,
}

impl IaqClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the backend root, e.g. `http://iaq.local:8000`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client` (test seam).
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Derive the WebSocket URL for the push channel from the base URL.
    pub fn push_url(&self) -> Result<Url, Error> {
        let mut url = self.api_url("ws", &[])?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::WebSocketConnect(format!("cannot derive ws scheme for {url}")))?;
        Ok(url)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the measurement window for a brand/room.
    ///
    /// Returns records as the backend sends them: possibly unordered and
    /// possibly containing duplicate timestamps. Ordering and deduplication
    /// are the intake layer's job.
    pub async fn measurement_window(
        &self,
        brand: &str,
        room: &str,
        hours: u32,
        step: &str,
    ) -> Result<Vec<MeasurementRecord>, Error> {
        let hours = hours.to_string();
        let url = self.api_url(
            "api/iaq/window",
            &[
                ("enseigne", brand),
                ("salle", room),
                ("hours", &hours),
                ("step", step),
            ],
        )?;
        self.get_json(url).await
    }

    /// Fetch the site configuration (brand/room hierarchy). Read-only.
    pub async fn site_config(&self) -> Result<SiteConfigResponse, Error> {
        let url = self.api_url("api/config", &[])?;
        self.get_json(url).await
    }

    /// Fetch the latest preventive-action predictions for a brand/room.
    pub async fn preventive_actions(
        &self,
        brand: &str,
        room: &str,
    ) -> Result<PredictionResponse, Error> {
        let url = self.api_url(
            "api/iaq/actions/preventive",
            &[("enseigne", brand), ("salle", room)],
        )?;
        self.get_json(url).await
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// Build a full URL for a backend path with query parameters.
    fn api_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, Error> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Send a GET request, enforce a 2xx status, and decode the body.
    ///
    /// On a decode failure the raw body is preserved in the error — the
    /// dashboard logs it and falls back to the last known good state.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if status != StatusCode::OK {
            return Err(Error::Backend {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: truncate_body(&body),
        })
    }
}

/// Cap error bodies so a misbehaving backend can't flood the logs.
fn truncate_body(body: &str) -> String {
    const MAX: usize = 512;
    if body.len() <= MAX {
        body.to_owned()
    } else {
        let cut = body
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        format!("{}…", &body[..cut])
    }
}
