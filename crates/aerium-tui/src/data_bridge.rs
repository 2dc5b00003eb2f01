//! Data bridge — connects [`Monitor`] streams to TUI actions.
//!
//! Runs as a background task: connects the monitor, then forwards every
//! monitor event and connection-state transition as an [`Action`] through
//! the TUI's action channel.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use aerium_core::{ConnectionState, Monitor, MonitorEvent};

use crate::action::{Action, Notification};

/// Spawn the data bridge connecting the [`Monitor`] to the TUI.
///
/// Connects to the backend, then loops forwarding events until cancelled.
pub async fn spawn_data_bridge(
    monitor: Monitor,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let _ = action_tx.send(Action::Connecting);

    let mut events = monitor.events();
    let mut conn_state = monitor.connection_state();

    if let Err(e) = monitor.connect().await {
        warn!(error = %e, "failed to connect to backend");
        let _ = action_tx.send(Action::Disconnected(format!("{e}")));
        return;
    }

    let _ = action_tx.send(Action::Connected);

    // Initial snapshot so the screens have data immediately.
    if let Some(context) = monitor.current_context() {
        let _ = action_tx.send(Action::ContextChanged(context));
        let _ = action_tx.send(Action::AlertsUpdated(std::sync::Arc::new(
            monitor.room_points(),
        )));
    }

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(event) = events.recv() => {
                let action = match event {
                    MonitorEvent::ContextChanged(context) => Action::ContextChanged(context),
                    MonitorEvent::AlertsUpdated(points) => Action::AlertsUpdated(points),
                    MonitorEvent::SampleApplied { sample, .. } => Action::SampleApplied(sample),
                    MonitorEvent::ScoreUpdated { at, score } => Action::ScoreUpdated { at, score },
                    MonitorEvent::PredictionUpdated(report) => Action::PredictionUpdated(report),
                    MonitorEvent::Fault(message) => Action::Notify(Notification::warning(message)),
                };
                let _ = action_tx.send(action);
            }

            Ok(()) = conn_state.changed() => {
                let state = conn_state.borrow_and_update().clone();
                let action = match state {
                    ConnectionState::Connected => Action::Connected,
                    ConnectionState::Connecting => Action::Connecting,
                    ConnectionState::Disconnected => Action::Disconnected("disconnected".into()),
                    ConnectionState::Failed => Action::Disconnected("connection failed".into()),
                };
                let _ = action_tx.send(action);
            }
        }
    }

    monitor.disconnect().await;
    debug!("data bridge shut down");
}
