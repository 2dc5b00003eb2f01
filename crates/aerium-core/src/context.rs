//! Context tracking: which brand and room the dashboard is looking at.
//!
//! Navigation is where stale data sneaks in: a measurement fetch issued
//! for room A can land after the user has switched to room B. There is no
//! hard cancellation for an in-flight HTTP request, so every request
//! snapshots a [`ContextTicket`] at issue time and the response is only
//! applied if the ticket still matches — otherwise it is discarded.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle of the tracker: no context until the configuration has been
/// loaded and a first room selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Uninitialized,
    Ready,
}

/// The active (brand, room) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomContext {
    pub brand: String,
    pub room: String,
}

impl RoomContext {
    pub fn new(brand: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            room: room.into(),
        }
    }
}

impl std::fmt::Display for RoomContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.brand, self.room)
    }
}

/// A snapshot of the context at request-issue time.
///
/// Carry one of these alongside any asynchronous work scoped to a room;
/// check [`ContextTracker::is_current`] before applying the result.
#[derive(Debug, Clone)]
pub struct ContextTicket {
    pub context: RoomContext,
    epoch: u64,
}

/// Tracks the selected brand/room and hands out staleness tickets.
#[derive(Debug, Default)]
pub struct ContextTracker {
    current: Mutex<Option<RoomContext>>,
    epoch: AtomicU64,
}

impl ContextTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ContextState {
        if self.lock().is_some() {
            ContextState::Ready
        } else {
            ContextState::Uninitialized
        }
    }

    /// Switch to a new room. Bumps the epoch, invalidating every ticket
    /// issued for the previous context.
    pub fn select(&self, brand: &str, room: &str) -> ContextTicket {
        let context = RoomContext::new(brand, room);
        *self.lock() = Some(context.clone());
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        ContextTicket { context, epoch }
    }

    /// The current context, if a room has been selected.
    pub fn current(&self) -> Option<RoomContext> {
        self.lock().clone()
    }

    /// A ticket for the current context, for tagging outgoing requests.
    pub fn ticket(&self) -> Option<ContextTicket> {
        let context = self.lock().clone()?;
        Some(ContextTicket {
            context,
            epoch: self.epoch.load(Ordering::SeqCst),
        })
    }

    /// Whether a ticket still names the live context. False after any
    /// navigation since the ticket was issued.
    pub fn is_current(&self, ticket: &ContextTicket) -> bool {
        ticket.epoch == self.epoch.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<RoomContext>> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uninitialized_until_first_selection() {
        let tracker = ContextTracker::new();
        assert_eq!(tracker.state(), ContextState::Uninitialized);
        assert!(tracker.ticket().is_none());

        tracker.select("Maison", "Bureau");
        assert_eq!(tracker.state(), ContextState::Ready);
        assert_eq!(
            tracker.current(),
            Some(RoomContext::new("Maison", "Bureau"))
        );
    }

    #[test]
    fn navigation_invalidates_outstanding_tickets() {
        let tracker = ContextTracker::new();
        let ticket_a = tracker.select("Maison", "Bureau");
        assert!(tracker.is_current(&ticket_a));

        let ticket_b = tracker.select("Maison", "Chambre");
        assert!(!tracker.is_current(&ticket_a), "stale ticket must be rejected");
        assert!(tracker.is_current(&ticket_b));
    }

    #[test]
    fn reselecting_the_same_room_still_bumps_the_epoch() {
        // A re-entered room restarts its intake cycle; responses from the
        // previous entry are just as stale as another room's.
        let tracker = ContextTracker::new();
        let before = tracker.select("Maison", "Bureau");
        let after = tracker.select("Maison", "Bureau");
        assert!(!tracker.is_current(&before));
        assert!(tracker.is_current(&after));
    }

    #[test]
    fn tickets_capture_the_context_they_were_issued_for() {
        let tracker = ContextTracker::new();
        tracker.select("Maison", "Bureau");
        let ticket = tracker.ticket().expect("context selected");
        assert_eq!(ticket.context, RoomContext::new("Maison", "Bureau"));
    }
}
