// ── Reactive alert point storage ──
//
// Lock-free concurrent storage with push-based change notification via
// `watch` channels. The UI never reads severity back out of rendered
// markers — this store is the single source of truth and every view is a
// projection of its snapshots.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::aggregate::DeviceAssessment;
use crate::model::{ActuationState, AlertPoint, DeviceKind, Sample};

/// Identity of an alert point: scoped by brand and room, one per device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertKey {
    pub brand: String,
    pub room: String,
    pub device: DeviceKind,
}

impl AlertKey {
    pub fn new(brand: impl Into<String>, room: impl Into<String>, device: DeviceKind) -> Self {
        Self {
            brand: brand.into(),
            room: room.into(),
            device,
        }
    }

    fn scope_matches(&self, brand: &str, room: &str) -> bool {
        self.brand == brand && self.room == room
    }
}

/// Reactive store for [`AlertPoint`]s plus the latest-sample slot per room.
///
/// Severity/issues/action flow in through [`upsert`](Self::upsert);
/// actuation flows in only through [`set_actuation`](Self::set_actuation)
/// and [`toggle_actuation`](Self::toggle_actuation) — the two never touch
/// each other's fields. Every mutation rebuilds the snapshot broadcast to
/// subscribers, so repeated identical syncs are naturally idempotent.
pub struct AlertStore {
    points: DashMap<AlertKey, Arc<AlertPoint>>,

    /// Most recent applied sample per (brand, room). Guards the monotonic
    /// timestamp invariant: out-of-order and duplicate samples are dropped.
    latest: DashMap<(String, String), Sample>,

    /// Full snapshot, rebuilt on mutation, ordered by (brand, room, device).
    snapshot: watch::Sender<Arc<Vec<Arc<AlertPoint>>>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let (version, _) = watch::channel(0u64);
        Self {
            points: DashMap::new(),
            latest: DashMap::new(),
            snapshot,
            version,
        }
    }

    // ── Room seeding ─────────────────────────────────────────────────

    /// Create alert points for a freshly entered room.
    ///
    /// One point per matched marker, inactive until the first sample is
    /// aggregated. Actuation comes from `restored` (session persistence)
    /// or falls back to the device default.
    pub fn seed_room(
        &self,
        brand: &str,
        room: &str,
        markers: &[(DeviceKind, (f64, f64))],
        restored: impl Fn(DeviceKind) -> Option<ActuationState>,
    ) {
        for &(device, position) in markers {
            let key = AlertKey::new(brand, room, device);
            let actuation = restored(device).unwrap_or_else(|| device.default_actuation());
            self.points.insert(
                key,
                Arc::new(AlertPoint {
                    device,
                    brand: brand.to_owned(),
                    room: room.to_owned(),
                    active: false,
                    severity: crate::model::Severity::None,
                    action: crate::aggregate::suggest_action(
                        device,
                        // No sample yet: every rule variable is NaN, so the
                        // rule tables fall through to their defaults.
                        &Sample {
                            timestamp: chrono::DateTime::<chrono::Utc>::MIN_UTC,
                            co2: f64::NAN,
                            pm25: f64::NAN,
                            tvoc: f64::NAN,
                            temperature: f64::NAN,
                            humidity: f64::NAN,
                            global_score: None,
                        },
                    ),
                    issues: Vec::new(),
                    actuation,
                    position,
                }),
            );
        }
        self.publish();
    }

    // ── Severity path ────────────────────────────────────────────────

    /// Replace severity, issues, and recommended action for one device.
    ///
    /// Never alters `actuation` — that is user state, not derived state.
    /// Creates the point if the room was never seeded (no model object
    /// matched), anchored at the plan origin.
    pub fn upsert(&self, key: &AlertKey, assessment: &DeviceAssessment) {
        let updated = match self.points.get(key) {
            Some(existing) => {
                let mut point = AlertPoint::clone(&existing);
                point.severity = assessment.severity;
                point.issues = assessment.issues.clone();
                point.action = assessment.action;
                point.active = assessment.severity.is_active();
                point
            }
            None => AlertPoint {
                device: key.device,
                brand: key.brand.clone(),
                room: key.room.clone(),
                active: assessment.severity.is_active(),
                severity: assessment.severity,
                action: assessment.action,
                issues: assessment.issues.clone(),
                actuation: key.device.default_actuation(),
                position: (0.0, 0.0),
            },
        };
        self.points.insert(key.clone(), Arc::new(updated));
        self.publish();
    }

    /// Apply a sample to the latest-slot for a room.
    ///
    /// Returns `false` (and leaves the store untouched) when the sample's
    /// timestamp is not strictly newer than the one already applied —
    /// out-of-order and duplicate deliveries are dropped, not reordered.
    pub fn apply_sample(&self, brand: &str, room: &str, sample: &Sample) -> bool {
        let scope = (brand.to_owned(), room.to_owned());
        if let Some(current) = self.latest.get(&scope) {
            if sample.timestamp <= current.timestamp {
                return false;
            }
        }
        self.latest.insert(scope, sample.clone());
        true
    }

    /// The most recently applied sample for a room, if any.
    pub fn latest_sample(&self, brand: &str, room: &str) -> Option<Sample> {
        self.latest
            .get(&(brand.to_owned(), room.to_owned()))
            .map(|s| s.clone())
    }

    // ── Actuation path ───────────────────────────────────────────────

    /// Set a device's actuation state. Severity and issues are untouched.
    pub fn set_actuation(&self, key: &AlertKey, state: ActuationState) -> bool {
        let Some(existing) = self.points.get(key).map(|p| Arc::clone(&p)) else {
            return false;
        };
        let mut point = AlertPoint::clone(&existing);
        point.actuation = state;
        self.points.insert(key.clone(), Arc::new(point));
        self.publish();
        true
    }

    /// Toggle a device's actuation state, returning the new state.
    pub fn toggle_actuation(&self, key: &AlertKey) -> Option<ActuationState> {
        let current = self.points.get(key).map(|p| p.actuation)?;
        let next = current.toggle();
        self.set_actuation(key, next);
        Some(next)
    }

    // ── Context switches ─────────────────────────────────────────────

    /// Drop every alert point and latest-sample slot that does not belong
    /// to the given scope. Markers must never leak across rooms.
    pub fn clear_except(&self, brand: &str, room: &str) {
        self.points.retain(|key, _| key.scope_matches(brand, room));
        self.latest
            .retain(|(b, r), _| b == brand && r == room);
        self.publish();
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// All alert points for one room, ordered by device.
    pub fn room_points(&self, brand: &str, room: &str) -> Vec<Arc<AlertPoint>> {
        let mut points: Vec<Arc<AlertPoint>> = self
            .points
            .iter()
            .filter(|entry| entry.key().scope_matches(brand, room))
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        points.sort_by_key(|p| p.device);
        points
    }

    pub fn point(&self, key: &AlertKey) -> Option<Arc<AlertPoint>> {
        self.points.get(key).map(|p| Arc::clone(&p))
    }

    /// Current full snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<Arc<AlertPoint>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<AlertPoint>>>> {
        self.snapshot.subscribe()
    }

    /// Subscribe to the version counter (bumped on every mutation).
    pub fn subscribe_version(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Rebuild the ordered snapshot and notify subscribers.
    fn publish(&self) {
        let mut points: Vec<Arc<AlertPoint>> = self
            .points
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        points.sort_by(|a, b| {
            (&a.brand, &a.room, a.device).cmp(&(&b.brand, &b.room, b.device))
        });
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(points));
        self.version.send_modify(|v| *v += 1);
    }
}
