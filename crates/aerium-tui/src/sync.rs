//! Marker synchronization — the view-model reconciled from alert points.
//!
//! Three views stay consistent with the alert store: the room overlay
//! markers, the alert table, and the detail panel. All three are owned by
//! [`MarkerBoard`] and recomputed on every [`sync`](MarkerBoard::sync) —
//! the render pass is a pure projection, nothing is ever read back out of
//! the screen. A revision counter only moves when a sync actually changed
//! something, which is what makes repeated identical syncs invisible.

use std::sync::Arc;

use aerium_core::model::{ActionKey, ActuationState, AlertPoint, DeviceKind, IssueDetail, Severity};

/// One marker on the room overlay.
///
/// Only `warning`/`danger` points materialize as markers; `info` devices
/// stay table-only so the room view highlights genuine problems.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerView {
    pub device: DeviceKind,
    pub severity: Severity,
    pub action: ActionKey,
    pub actuation: ActuationState,
    /// Normalized (x, y) on the room plan.
    pub position: (f64, f64),
}

/// One row of the alert table. Rows are ordered most-severe-first.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub device: DeviceKind,
    pub severity: Severity,
    pub action: ActionKey,
    pub actuation: ActuationState,
    pub issues: String,
}

/// The open detail panel, pinned to one device.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub device: DeviceKind,
    pub point: Arc<AlertPoint>,
}

/// The reconciled view-model for one room.
#[derive(Debug, Default)]
pub struct MarkerBoard {
    markers: Vec<MarkerView>,
    rows: Vec<TableRow>,
    detail: Option<DetailView>,
    /// Bumped only when a sync changes a view. Stable revision ⇒ the
    /// screen has nothing new to show.
    revision: u64,
}

impl MarkerBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile all three views against the current alert points.
    ///
    /// Idempotent: syncing the same points twice leaves the revision (and
    /// therefore everything rendered from it) untouched. The detail panel
    /// refreshes in place while its device remains active, and closes
    /// itself when the device disappears from the active set.
    pub fn sync(&mut self, points: &[Arc<AlertPoint>]) {
        let markers: Vec<MarkerView> = points
            .iter()
            .filter(|p| p.marker_visible())
            .map(|p| MarkerView {
                device: p.device,
                severity: p.severity,
                action: p.action,
                actuation: p.actuation,
                position: p.position,
            })
            .collect();

        let mut active: Vec<&Arc<AlertPoint>> = points.iter().filter(|p| p.active).collect();
        active.sort_by_key(|p| (p.severity.table_weight(), p.device));
        let rows: Vec<TableRow> = active
            .iter()
            .map(|p| TableRow {
                device: p.device,
                severity: p.severity,
                action: p.action,
                actuation: p.actuation,
                issues: summarize_issues(&p.issues),
            })
            .collect();

        if markers != self.markers || rows != self.rows {
            self.markers = markers;
            self.rows = rows;
            self.revision += 1;
        }

        // Detail panel: refresh in place, or auto-close when the subject
        // is gone.
        if let Some(detail) = &self.detail {
            match points.iter().find(|p| p.device == detail.device && p.active) {
                Some(point) => {
                    if !Arc::ptr_eq(point, &detail.point) && **point != *detail.point {
                        self.detail = Some(DetailView {
                            device: detail.device,
                            point: Arc::clone(point),
                        });
                        self.revision += 1;
                    }
                }
                None => {
                    self.detail = None;
                    self.revision += 1;
                }
            }
        }
    }

    // ── Detail panel ─────────────────────────────────────────────────

    /// Open the detail panel for a device. No-op if the device has no
    /// alert point in the last synced set.
    pub fn open_detail(&mut self, device: DeviceKind, points: &[Arc<AlertPoint>]) -> bool {
        let Some(point) = points.iter().find(|p| p.device == device) else {
            return false;
        };
        self.detail = Some(DetailView {
            device,
            point: Arc::clone(point),
        });
        self.revision += 1;
        true
    }

    pub fn close_detail(&mut self) {
        if self.detail.take().is_some() {
            self.revision += 1;
        }
    }

    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn markers(&self) -> &[MarkerView] {
        &self.markers
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Hit-test a normalized overlay position against the markers.
    pub fn marker_at(&self, x: f64, y: f64, tolerance: f64) -> Option<DeviceKind> {
        self.markers
            .iter()
            .find(|m| {
                (m.position.0 - x).abs() <= tolerance && (m.position.1 - y).abs() <= tolerance
            })
            .map(|m| m.device)
    }
}

/// Compact one-line issue summary for a table row, most severe first.
fn summarize_issues(issues: &[IssueDetail]) -> String {
    let mut sorted: Vec<&IssueDetail> = issues.iter().collect();
    sorted.sort_by_key(|i| i.severity.table_weight());
    sorted
        .iter()
        .map(|i| {
            let arrow = match i.direction {
                aerium_core::model::Direction::High => '>',
                aerium_core::model::Direction::Low => '<',
            };
            format!("{} {:.0}{} {arrow} {:.0}", i.name(), i.value, i.unit(), i.threshold)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
