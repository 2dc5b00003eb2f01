//! Alert pipeline and reactive data layer between `aerium-api` and the
//! dashboard UI.
//!
//! This crate owns everything with decision logic in it:
//!
//! - **[`thresholds`]** — pure functions mapping a sensor value to a
//!   [`Severity`] tier per pollutant, against fixed band tables.
//! - **[`aggregate`]** — merges per-pollutant severities into per-device
//!   alert assessments (`max`-merge over a fixed contribution map) and
//!   derives a recommended corrective action per device.
//! - **[`AlertStore`]** — reactive storage for [`AlertPoint`]s keyed by
//!   (brand, room, device), with the monotonic latest-sample slot per room.
//!   Mutations broadcast snapshots through `tokio::sync::watch`.
//! - **[`SessionStore`]** — session-scoped persistence: navigation state,
//!   per-room actuation states, and the rolling score history window.
//! - **[`ContextTracker`]** — the active brand/room selection, with
//!   epoch-tagged tickets so stale network responses are discarded rather
//!   than applied to the wrong room.
//! - **[`Monitor`]** — central facade managing the full lifecycle:
//!   [`connect()`](Monitor::connect) loads the site configuration and
//!   spawns background tasks (measurement polling, push-channel bridge,
//!   prediction refresh); [`select_room()`](Monitor::select_room) runs the
//!   context-switch choreography.

pub mod aggregate;
pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod intake;
pub mod model;
pub mod monitor;
pub mod score;
pub mod store;
pub mod thresholds;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::MonitorConfig;
pub use context::{ContextState, ContextTicket, ContextTracker, RoomContext};
pub use error::CoreError;
pub use monitor::{ConnectionState, Monitor, MonitorEvent};
pub use store::{AlertKey, AlertStore, SessionStore};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    ActionKey,
    ActuationState,
    AlertPoint,
    Brand,
    DeviceKind,
    Direction,
    IssueDetail,
    Pollutant,
    PredictionReport,
    PreventiveAction,
    Room,
    RoomModel,
    Sample,
    SceneObject,
    Severity,
    SiteConfig,
};
