//! Alert points — the per-(brand, room, device) alert entity.

use serde::{Deserialize, Serialize};

use super::device::{ActionKey, ActuationState, DeviceKind};
use super::pollutant::{Direction, Pollutant};
use super::severity::Severity;

/// One contributing pollutant breach, derived fresh on every evaluation
/// cycle. Only `warning` and `danger` pollutants appear as issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueDetail {
    pub pollutant: Pollutant,
    pub severity: Severity,
    /// The measured value that breached the band.
    pub value: f64,
    /// Which side of the band was breached.
    pub direction: Direction,
    /// The boundary value of the band that was exceeded.
    pub threshold: f64,
}

impl IssueDetail {
    pub fn name(&self) -> &'static str {
        self.pollutant.label()
    }

    pub fn unit(&self) -> &'static str {
        self.pollutant.unit()
    }
}

/// The alert state of one device in one room.
///
/// Created when a room is seeded from its model, destroyed on room change,
/// mutated by the aggregation pass (severity/issues/action) and by user
/// interaction (actuation) — never both at once. `actuation` survives
/// navigation via the session store; everything else is recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPoint {
    pub device: DeviceKind,
    pub brand: String,
    pub room: String,

    /// Eligible for the alert table: severity is not `none`. Devices at
    /// exactly `info` stay active but are hidden from the room overlay.
    pub active: bool,
    pub severity: Severity,
    pub action: ActionKey,
    pub issues: Vec<IssueDetail>,

    /// User-toggled physical state, independent of severity.
    pub actuation: ActuationState,

    /// Normalized (x, y) position on the room plan, from the matched
    /// model object. Drives marker placement in the overlay.
    pub position: (f64, f64),
}

impl AlertPoint {
    /// Whether the room overlay should render a marker for this point.
    ///
    /// `info` severity is table-only: the marker is hidden so the room
    /// view highlights genuine problems.
    pub fn marker_visible(&self) -> bool {
        self.severity >= Severity::Warning
    }
}
