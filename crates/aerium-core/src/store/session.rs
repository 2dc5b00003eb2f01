// ── Session-scoped persistence ──
//
// The browser-era dashboard kept this in sessionStorage under
// `activeEnseigne` / `activeRoom` / `objectStates_{brand}_{room}` /
// `scoreHistory`. Here it is an in-memory store with an exportable
// snapshot; durability beyond the session is explicitly not a goal.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ActuationState, DeviceKind};

/// How much score history the dashboard sparkline keeps.
const SCORE_WINDOW_SECS: i64 = 60;

#[derive(Debug, Default)]
struct SessionInner {
    active: Option<(String, String)>,
    /// (brand, room) → device → actuation.
    object_states: HashMap<(String, String), HashMap<DeviceKind, ActuationState>>,
    /// Rolling window of (timestamp, global score).
    score_history: VecDeque<(DateTime<Utc>, f64)>,
}

/// Session-scoped state that survives navigation but not the process.
///
/// Actuation states are keyed by (brand, room, device) so returning to a
/// room restores exactly what the user left; severity state is never
/// persisted here — it is rederived from the next sample.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<SessionInner>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Navigation ───────────────────────────────────────────────────

    pub fn set_active(&self, brand: &str, room: &str) {
        self.lock().active = Some((brand.to_owned(), room.to_owned()));
    }

    pub fn active(&self) -> Option<(String, String)> {
        self.lock().active.clone()
    }

    // ── Actuation persistence ────────────────────────────────────────

    pub fn save_actuation(&self, brand: &str, room: &str, device: DeviceKind, state: ActuationState) {
        self.lock()
            .object_states
            .entry((brand.to_owned(), room.to_owned()))
            .or_default()
            .insert(device, state);
    }

    /// Saved actuation for one device in one room, if any.
    pub fn actuation(&self, brand: &str, room: &str, device: DeviceKind) -> Option<ActuationState> {
        self.lock()
            .object_states
            .get(&(brand.to_owned(), room.to_owned()))
            .and_then(|devices| devices.get(&device).copied())
    }

    /// All saved actuation states for one room.
    pub fn room_actuation(&self, brand: &str, room: &str) -> HashMap<DeviceKind, ActuationState> {
        self.lock()
            .object_states
            .get(&(brand.to_owned(), room.to_owned()))
            .cloned()
            .unwrap_or_default()
    }

    // ── Score history ────────────────────────────────────────────────

    /// Append a global score and prune entries older than the window.
    pub fn push_score(&self, at: DateTime<Utc>, score: f64) {
        let mut inner = self.lock();
        inner.score_history.push_back((at, score));
        let horizon = at - Duration::seconds(SCORE_WINDOW_SECS);
        while inner
            .score_history
            .front()
            .is_some_and(|(t, _)| *t < horizon)
        {
            inner.score_history.pop_front();
        }
    }

    pub fn score_history(&self) -> Vec<(DateTime<Utc>, f64)> {
        self.lock().score_history.iter().copied().collect()
    }

    // ── Snapshot export / restore ────────────────────────────────────

    /// Export for on-disk session caching (done by `aerium-config`).
    pub fn export(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            active: inner.active.clone(),
            object_states: inner
                .object_states
                .iter()
                .map(|((brand, room), devices)| SavedRoomStates {
                    brand: brand.clone(),
                    room: room.clone(),
                    devices: devices.iter().map(|(d, s)| (*d, *s)).collect(),
                })
                .collect(),
        }
    }

    /// Restore a previously exported snapshot. Score history is not
    /// restored — it only makes sense within a live session.
    pub fn restore(&self, snapshot: SessionSnapshot) {
        let mut inner = self.lock();
        inner.active = snapshot.active;
        inner.object_states = snapshot
            .object_states
            .into_iter()
            .map(|saved| {
                (
                    (saved.brand, saved.room),
                    saved.devices.into_iter().collect(),
                )
            })
            .collect();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionInner> {
        // Poisoning can only come from a panic mid-mutation; all mutations
        // here are infallible, so recover the data rather than propagate.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Serializable session state for the on-disk cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub active: Option<(String, String)>,
    #[serde(default)]
    pub object_states: Vec<SavedRoomStates>,
}

/// Saved actuation states for one room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedRoomStates {
    pub brand: String,
    pub room: String,
    pub devices: Vec<(DeviceKind, ActuationState)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn actuation_round_trips_per_room() {
        let store = SessionStore::new();
        store.save_actuation("Maison", "Bureau", DeviceKind::Window, ActuationState::Open);
        store.save_actuation("Maison", "Chambre", DeviceKind::Window, ActuationState::Closed);

        assert_eq!(
            store.actuation("Maison", "Bureau", DeviceKind::Window),
            Some(ActuationState::Open)
        );
        assert_eq!(
            store.actuation("Maison", "Chambre", DeviceKind::Window),
            Some(ActuationState::Closed)
        );
        assert_eq!(store.actuation("Maison", "Bureau", DeviceKind::Door), None);
    }

    #[test]
    fn score_history_prunes_outside_the_window() {
        let store = SessionStore::new();
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).single().expect("valid");

        store.push_score(t0, 80.0);
        store.push_score(t0 + Duration::seconds(30), 75.0);
        store.push_score(t0 + Duration::seconds(90), 70.0);

        let history = store.score_history();
        // The t0 entry is more than 60s older than the newest push.
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].1, 75.0);
        assert_eq!(history[1].1, 70.0);
    }

    #[test]
    fn snapshot_round_trip_preserves_actuation_and_navigation() {
        let store = SessionStore::new();
        store.set_active("Maison", "Bureau");
        store.save_actuation("Maison", "Bureau", DeviceKind::Ventilation, ActuationState::On);

        let restored = SessionStore::new();
        restored.restore(store.export());

        assert_eq!(restored.active(), Some(("Maison".into(), "Bureau".into())));
        assert_eq!(
            restored.actuation("Maison", "Bureau", DeviceKind::Ventilation),
            Some(ActuationState::On)
        );
    }
}
