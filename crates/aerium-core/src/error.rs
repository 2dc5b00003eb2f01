use thiserror::Error;

/// Top-level error type for the `aerium-core` crate.
///
/// Maps backend failures and lifecycle misuse into diagnostics the UI can
/// show. Per the fail-safe policy, none of these ever blanks the alert
/// store — the dashboard degrades to its last known good state.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Failure at the API boundary (transport, backend, decode).
    #[error("backend API error: {0}")]
    Api(#[from] aerium_api::Error),

    /// Operation requires a connected monitor.
    #[error("monitor is not connected")]
    Disconnected,

    /// Operation requires a selected room.
    #[error("no room selected")]
    NoContext,

    /// The requested brand/room is not in the site configuration.
    #[error("unknown room: {brand}/{room}")]
    UnknownRoom { brand: String, room: String },

    /// The site configuration has no rooms to select.
    #[error("site configuration is empty")]
    EmptySite,
}
