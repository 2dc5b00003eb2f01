//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use aerium_core::model::{AlertPoint, DeviceKind, PredictionReport, Sample};
use aerium_core::RoomContext;

use crate::screen::ScreenId;

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Warning,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Screen navigation ──────────────────────────────────────────
    SwitchScreen(ScreenId),

    // ── Room navigation ────────────────────────────────────────────
    NextRoom,
    PrevRoom,
    NextBrand,

    // ── Data events (from the monitor stream) ──────────────────────
    ContextChanged(RoomContext),
    AlertsUpdated(Arc<Vec<Arc<AlertPoint>>>),
    SampleApplied(Sample),
    ScoreUpdated { at: DateTime<Utc>, score: f64 },
    PredictionUpdated(Arc<PredictionReport>),

    // ── Connection status ──────────────────────────────────────────
    Connected,
    Connecting,
    Disconnected(String),

    // ── Marker / table interaction ─────────────────────────────────
    SelectNext,
    SelectPrev,
    ToggleSelected,
    ToggleDevice(DeviceKind),
    OpenDetail,
    CloseDetail,

    // ── Notifications ──────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,

    // ── Help ───────────────────────────────────────────────────────
    ToggleHelp,
}
