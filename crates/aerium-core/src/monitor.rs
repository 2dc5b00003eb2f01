// ── Monitor facade ──
//
// Full lifecycle management for a dashboard session against one backend.
// Loads the site configuration, runs the context-switch choreography, and
// owns the background intake tasks (measurement polling, push bridge,
// prediction refresh). All derived state flows into the AlertStore; the
// UI only ever projects store snapshots.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use aerium_api::{IaqClient, PushHandle, PushMessage, ReconnectConfig, TransportConfig};

use crate::aggregate;
use crate::config::MonitorConfig;
use crate::context::{ContextTicket, ContextTracker, RoomContext};
use crate::error::CoreError;
use crate::intake;
use crate::model::{AlertPoint, PredictionReport, RoomModel, Sample, SiteConfig};
use crate::score;
use crate::store::{AlertKey, AlertStore, SessionStore};

const EVENT_CHANNEL_SIZE: usize = 256;

// ── ConnectionState ──────────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── MonitorEvent ─────────────────────────────────────────────────────

/// Typed event channel replacing the original's DOM CustomEvents.
///
/// Everything the UI reacts to arrives through this broadcast stream;
/// there is no implicit event bus.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// Navigation completed: the store is seeded for this room.
    ContextChanged(RoomContext),
    /// A fresh sample passed the monotonic gate and was aggregated.
    SampleApplied { context: RoomContext, sample: Sample },
    /// Alert points for the active room, post-aggregation or -toggle.
    AlertsUpdated(Arc<Vec<Arc<AlertPoint>>>),
    /// A global score entered the rolling history window.
    ScoreUpdated { at: DateTime<Utc>, score: f64 },
    /// New preventive-action predictions (display-only).
    PredictionUpdated(Arc<PredictionReport>),
    /// Non-fatal trouble worth a toast (network/parse failures).
    Fault(String),
}

// ── Monitor ──────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<MonitorInner>`. Owns the stores, the
/// context tracker, and the background intake tasks.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    client: IaqClient,
    alerts: Arc<AlertStore>,
    session: Arc<SessionStore>,
    context: ContextTracker,
    site: RwLock<Option<Arc<SiteConfig>>>,
    connection_state: watch::Sender<ConnectionState>,
    event_tx: broadcast::Sender<MonitorEvent>,
    cancel: CancellationToken,
    /// Child token for the current connection — cancelled on disconnect,
    /// replaced on reconnect (avoids permanent cancellation).
    cancel_child: Mutex<CancellationToken>,
    ws_handle: Mutex<Option<PushHandle>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Monitor {
    /// Create a new Monitor from configuration. Does NOT connect —
    /// call [`connect()`](Self::connect) to load the site configuration
    /// and start background tasks.
    pub fn new(config: MonitorConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            timeout: config.timeout,
            ..TransportConfig::default()
        };
        let client = IaqClient::new(config.base_url.clone(), &transport)?;

        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Ok(Self {
            inner: Arc::new(MonitorInner {
                config,
                client,
                alerts: Arc::new(AlertStore::new()),
                session: Arc::new(SessionStore::new()),
                context: ContextTracker::new(),
                site: RwLock::new(None),
                connection_state,
                event_tx,
                cancel,
                cancel_child: Mutex::new(cancel_child),
                ws_handle: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    pub fn alerts(&self) -> &Arc<AlertStore> {
        &self.inner.alerts
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    pub fn site(&self) -> Option<Arc<SiteConfig>> {
        self.read_site()
    }

    pub fn current_context(&self) -> Option<RoomContext> {
        self.inner.context.current()
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to the monitor event stream.
    pub fn events(&self) -> broadcast::Receiver<MonitorEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Alert points of the active room, ordered by device.
    pub fn room_points(&self) -> Vec<Arc<AlertPoint>> {
        match self.inner.context.current() {
            Some(ctx) => self.inner.alerts.room_points(&ctx.brand, &ctx.room),
            None => Vec::new(),
        }
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Connect to the backend.
    ///
    /// Loads the site configuration, restores the session's last room (or
    /// falls back to the first configured one), then spawns background
    /// tasks: measurement polling, prediction refresh, and the push
    /// bridge when enabled.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        // Fresh child token for this connection (supports reconnect).
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let site = match self.inner.client.site_config().await {
            Ok(resp) => Arc::new(SiteConfig::from(resp)),
            Err(e) => {
                let _ = self.inner.connection_state.send(ConnectionState::Failed);
                return Err(e.into());
            }
        };
        info!(brands = site.brands.len(), "site configuration loaded");
        *self.write_site() = Some(Arc::clone(&site));

        // Initial room: last visited if still configured, else the first.
        let (brand, room) = match self.inner.session.active() {
            Some((brand, room))
                if site.brand(&brand).is_some_and(|b| b.room(&room).is_some()) =>
            {
                (brand, room)
            }
            _ => match site.first_room() {
                Some((brand, room)) => (brand.name.clone(), room.name.clone()),
                None => {
                    let _ = self.inner.connection_state.send(ConnectionState::Failed);
                    return Err(CoreError::EmptySite);
                }
            },
        };
        if let Err(e) = self.select_room(&brand, &room).await {
            let _ = self.inner.connection_state.send(ConnectionState::Failed);
            return Err(e);
        }

        // Spawn background tasks.
        let mut handles = self.inner.task_handles.lock().await;

        {
            let monitor = self.clone();
            let cancel = child.clone();
            let interval = self.inner.config.poll_interval;
            handles.push(tokio::spawn(poll_task(monitor, interval, cancel)));
        }

        {
            let monitor = self.clone();
            let cancel = child.clone();
            let interval = self.inner.config.prediction_interval;
            handles.push(tokio::spawn(prediction_task(monitor, interval, cancel)));
        }

        if self.inner.config.websocket_enabled {
            self.spawn_push_bridge(&child, &mut handles).await;
        }
        drop(handles);

        let _ = self.inner.connection_state.send(ConnectionState::Connected);
        info!("connected to backend");
        Ok(())
    }

    /// Open the push channel and bridge its messages into the pipeline.
    /// Non-fatal on failure — polling keeps the dashboard alive.
    async fn spawn_push_bridge(
        &self,
        cancel: &CancellationToken,
        handles: &mut Vec<JoinHandle<()>>,
    ) {
        let ws_url = match &self.inner.config.ws_url {
            Some(url) => url.clone(),
            None => match self.inner.client.push_url() {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, "cannot derive push URL (polling only)");
                    return;
                }
            },
        };

        let ws_cancel = cancel.child_token();
        let handle = PushHandle::connect(ws_url, ReconnectConfig::default(), ws_cancel.clone());
        let rx = handle.subscribe();

        let monitor = self.clone();
        handles.push(tokio::spawn(push_bridge_task(monitor, rx, ws_cancel)));

        *self.inner.ws_handle.lock().await = Some(handle);
        info!("push channel bridge spawned");
    }

    /// Disconnect from the backend: cancel background tasks, close the
    /// push channel, reset connection state. Stores are left intact so a
    /// reconnect picks up where the session left off.
    pub async fn disconnect(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        if let Some(handle) = self.inner.ws_handle.lock().await.take() {
            handle.shutdown();
        }

        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Switch the dashboard to a room.
    ///
    /// The choreography, in order: invalidate outstanding tickets, drop
    /// every alert point outside the new scope, regenerate markers from
    /// the room model, restore persisted actuation, then kick off an
    /// immediate intake refresh for the new context. A refresh failure is
    /// reported as a fault, not an error — the room is still entered.
    pub async fn select_room(&self, brand: &str, room: &str) -> Result<(), CoreError> {
        let site = self.read_site().ok_or(CoreError::Disconnected)?;
        let known = site.brand(brand).is_some_and(|b| b.room(room).is_some());
        if !known {
            return Err(CoreError::UnknownRoom {
                brand: brand.to_owned(),
                room: room.to_owned(),
            });
        }

        let ticket = self.inner.context.select(brand, room);
        debug!(context = %ticket.context, "room selected");

        self.inner.alerts.clear_except(brand, room);

        let markers = self.room_model(brand, room).markers();
        let session = Arc::clone(&self.inner.session);
        self.inner.alerts.seed_room(brand, room, &markers, |device| {
            session.actuation(brand, room, device)
        });

        self.inner.session.set_active(brand, room);

        let _ = self
            .inner
            .event_tx
            .send(MonitorEvent::ContextChanged(ticket.context.clone()));
        self.publish_room_alerts(&ticket.context);

        // Immediate refresh so the new room isn't blank until the next
        // poll tick. Failures degrade to the empty seeded state.
        if let Err(e) = self.refresh_window(&ticket).await {
            self.report_fault(format!("measurement refresh failed: {e}"));
        }
        if let Err(e) = self.refresh_predictions(&ticket).await {
            self.report_fault(format!("prediction refresh failed: {e}"));
        }

        Ok(())
    }

    /// The room model used for marker generation.
    ///
    /// Deployments with bespoke per-room scenes would resolve them here;
    /// every room currently uses the standard plan.
    fn room_model(&self, _brand: &str, _room: &str) -> RoomModel {
        RoomModel::standard()
    }

    // ── Intake ───────────────────────────────────────────────────────

    /// Fetch the measurement window for a ticket's room and apply the
    /// newest sample, unless the context has moved on since.
    pub async fn refresh_window(&self, ticket: &ContextTicket) -> Result<(), CoreError> {
        let records = self
            .inner
            .client
            .measurement_window(
                &ticket.context.brand,
                &ticket.context.room,
                self.inner.config.window_hours,
                &self.inner.config.window_step,
            )
            .await?;

        if !self.inner.context.is_current(ticket) {
            debug!(context = %ticket.context, "discarding stale window response");
            return Ok(());
        }

        let samples: Vec<Sample> = records.iter().map(Sample::from).collect();
        if let Some(latest) = intake::latest_of_batch(samples) {
            self.apply_if_current(ticket, latest);
        }
        Ok(())
    }

    /// Fetch predictions for a ticket's room; display-only.
    pub async fn refresh_predictions(&self, ticket: &ContextTicket) -> Result<(), CoreError> {
        let resp = self
            .inner
            .client
            .preventive_actions(&ticket.context.brand, &ticket.context.room)
            .await?;

        if !self.inner.context.is_current(ticket) {
            debug!(context = %ticket.context, "discarding stale prediction response");
            return Ok(());
        }

        let report = Arc::new(PredictionReport::from(resp));
        let _ = self
            .inner
            .event_tx
            .send(MonitorEvent::PredictionUpdated(report));
        Ok(())
    }

    /// Apply a sample for a ticket's context, dropping it when navigation
    /// has moved on. Returns whether it was applied.
    fn apply_if_current(&self, ticket: &ContextTicket, sample: Sample) -> bool {
        if !self.inner.context.is_current(ticket) {
            debug!(context = %ticket.context, "discarding sample for stale context");
            return false;
        }
        self.apply_sample(&ticket.context, sample)
    }

    /// Run one sample through the pipeline: monotonic gate → aggregation
    /// → store upserts → score history → events.
    fn apply_sample(&self, context: &RoomContext, sample: Sample) -> bool {
        if !self
            .inner
            .alerts
            .apply_sample(&context.brand, &context.room, &sample)
        {
            debug!(context = %context, ts = %sample.timestamp, "dropping out-of-order sample");
            return false;
        }

        for (device, assessment) in aggregate::aggregate(&sample) {
            let key = AlertKey::new(context.brand.clone(), context.room.clone(), device);
            // Only devices the room model produced get alert points;
            // aggregation results for absent fixtures are meaningless.
            if self.inner.alerts.point(&key).is_some() {
                self.inner.alerts.upsert(&key, &assessment);
            }
        }

        let assessment = score::effective(&sample);
        self.inner
            .session
            .push_score(sample.timestamp, assessment.score);
        let _ = self.inner.event_tx.send(MonitorEvent::ScoreUpdated {
            at: sample.timestamp,
            score: assessment.score,
        });

        let _ = self.inner.event_tx.send(MonitorEvent::SampleApplied {
            context: context.clone(),
            sample,
        });
        self.publish_room_alerts(context);
        true
    }

    // ── User interaction ─────────────────────────────────────────────

    /// Toggle a device's actuation state in the active room.
    ///
    /// Persists the new state to the session store and republishes the
    /// room's alert points. Severity and issues are untouched — the two
    /// axes are independent by contract.
    pub fn toggle_device(
        &self,
        device: crate::model::DeviceKind,
    ) -> Result<crate::model::ActuationState, CoreError> {
        let context = self.inner.context.current().ok_or(CoreError::NoContext)?;
        let key = AlertKey::new(context.brand.clone(), context.room.clone(), device);

        let state = self
            .inner
            .alerts
            .toggle_actuation(&key)
            .ok_or(CoreError::UnknownRoom {
                brand: context.brand.clone(),
                room: context.room.clone(),
            })?;

        self.inner
            .session
            .save_actuation(&context.brand, &context.room, device, state);
        self.publish_room_alerts(&context);
        Ok(state)
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn publish_room_alerts(&self, context: &RoomContext) {
        let points = self
            .inner
            .alerts
            .room_points(&context.brand, &context.room);
        let _ = self
            .inner
            .event_tx
            .send(MonitorEvent::AlertsUpdated(Arc::new(points)));
    }

    fn report_fault(&self, message: String) {
        warn!("{message}");
        let _ = self.inner.event_tx.send(MonitorEvent::Fault(message));
    }

    fn read_site(&self) -> Option<Arc<SiteConfig>> {
        match self.inner.site.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write_site(&self) -> std::sync::RwLockWriteGuard<'_, Option<Arc<SiteConfig>>> {
        match self.inner.site.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Periodic measurement polling. Runs even with the push channel open —
/// it backfills after push gaps and covers backends without WebSocket.
async fn poll_task(monitor: Monitor, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The immediate first tick duplicates the select_room refresh.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let Some(ticket) = monitor.inner.context.ticket() else { continue };
                if let Err(e) = monitor.refresh_window(&ticket).await {
                    monitor.report_fault(format!("measurement poll failed: {e}"));
                }
            }
        }
    }
    debug!("poll task shut down");
}

/// Periodic prediction refresh.
async fn prediction_task(monitor: Monitor, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let Some(ticket) = monitor.inner.context.ticket() else { continue };
                if let Err(e) = monitor.refresh_predictions(&ticket).await {
                    monitor.report_fault(format!("prediction poll failed: {e}"));
                }
            }
        }
    }
    debug!("prediction task shut down");
}

/// Bridge task: push messages → pipeline.
///
/// Filters by the live context at arrival time (not a ticket — a push
/// message is only ever relevant to the room being looked at right now).
async fn push_bridge_task(
    monitor: Monitor,
    mut rx: broadcast::Receiver<Arc<PushMessage>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = rx.recv() => {
                match result {
                    Ok(msg) => handle_push_message(&monitor, &msg),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Fine: only the latest state per room matters.
                        warn!(skipped = n, "push bridge lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    debug!("push bridge shut down");
}

fn handle_push_message(monitor: &Monitor, msg: &PushMessage) {
    let Some(context) = monitor.inner.context.current() else {
        return;
    };

    if intake::measurement_matches(msg, &context) {
        match intake::sample_from_push(msg) {
            Some(sample) => {
                monitor.apply_sample(&context, sample);
            }
            None => debug!("push measurement without usable timestamp, skipping"),
        }
        return;
    }

    if msg.topic == "prediction"
        && msg.brand.as_deref() == Some(context.brand.as_str())
        && msg.room.as_deref() == Some(context.room.as_str())
    {
        if let Ok(resp) =
            serde_json::from_value::<aerium_api::PredictionResponse>(msg.data.clone())
        {
            let report = Arc::new(PredictionReport::from(resp));
            let _ = monitor
                .inner
                .event_tx
                .send(MonitorEvent::PredictionUpdated(report));
        }
    }
    // Other topics (action, alert, module_state) are server-side echoes
    // the dashboard derives locally; ignore them.
}
