//! Application core — event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use aerium_core::model::SiteConfig;
use aerium_core::{Monitor, RoomContext};

use crate::action::{Action, Notification, NotificationLevel};
use crate::event::{Event, EventReader};
use crate::screen::{Screen, ScreenId};
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;

/// How long a toast stays on screen.
const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// Connection status as seen by the TUI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Top-level application state and event loop.
pub struct App {
    active_screen: ScreenId,
    screens: HashMap<ScreenId, Box<dyn Screen>>,
    running: bool,
    connection_status: ConnectionStatus,
    help_visible: bool,
    site: Option<Arc<SiteConfig>>,
    context: Option<RoomContext>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    monitor: Option<Monitor>,
    data_cancel: CancellationToken,
    notification: Option<(Notification, Instant)>,
}

impl App {
    /// Create the app with all screens. Without a [`Monitor`] the UI runs
    /// in a disconnected shell (useful when the backend URL is missing).
    pub fn new(monitor: Option<Monitor>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screens: HashMap<ScreenId, Box<dyn Screen>> = create_screens().into_iter().collect();

        Self {
            active_screen: ScreenId::Room,
            screens,
            running: true,
            connection_status: ConnectionStatus::default(),
            help_visible: false,
            site: None,
            context: None,
            action_tx,
            action_rx,
            monitor,
            data_cancel: CancellationToken::new(),
            notification: None,
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }

        if let Some(monitor) = self.monitor.clone() {
            let cancel = self.data_cancel.clone();
            let tx = self.action_tx.clone();
            tokio::spawn(async move {
                crate::data_bridge::spawn_data_bridge(monitor, tx, cancel).await;
            });
        }

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(50),  // 20 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(action) = self.handle_mouse_event(mouse)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if matches!(action, Action::Render) {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    // ── Input mapping ────────────────────────────────────────────────

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // Help overlay swallows everything except its own dismissal.
        if self.help_visible {
            return Ok(Some(Action::ToggleHelp));
        }

        let global = match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Char('?') => Some(Action::ToggleHelp),
            KeyCode::Tab => Some(Action::SwitchScreen(self.active_screen.next())),
            KeyCode::Char(c @ '1'..='9') => {
                ScreenId::from_number(c.to_digit(10).unwrap_or(0).try_into().unwrap_or(0))
                    .map(Action::SwitchScreen)
            }
            KeyCode::Char(']') => Some(Action::NextRoom),
            KeyCode::Char('[') => Some(Action::PrevRoom),
            KeyCode::Char('b') => Some(Action::NextBrand),
            _ => None,
        };
        if global.is_some() {
            return Ok(global);
        }

        match self.screens.get_mut(&self.active_screen) {
            Some(screen) => screen.handle_key_event(key),
            None => Ok(None),
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        match self.screens.get_mut(&self.active_screen) {
            Some(screen) => screen.handle_mouse_event(mouse),
            None => Ok(None),
        }
    }

    // ── Action processing ────────────────────────────────────────────

    #[allow(clippy::too_many_lines)]
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::Render | Action::Resize(..) => {}
            Action::Tick => {
                if let Some((_, shown_at)) = &self.notification {
                    if shown_at.elapsed() > NOTIFICATION_TTL {
                        self.notification = None;
                    }
                }
            }
            Action::SwitchScreen(id) => self.active_screen = *id,
            Action::ToggleHelp => self.help_visible = !self.help_visible,
            Action::Notify(notification) => {
                self.notification = Some((notification.clone(), Instant::now()));
            }
            Action::DismissNotification => self.notification = None,

            Action::Connected => {
                self.connection_status = ConnectionStatus::Connected;
                self.site = self.monitor.as_ref().and_then(Monitor::site);
            }
            Action::Connecting => self.connection_status = ConnectionStatus::Connecting,
            Action::Disconnected(reason) => {
                self.connection_status = ConnectionStatus::Disconnected;
                self.notification = Some((Notification::error(reason.clone()), Instant::now()));
            }

            Action::ContextChanged(context) => {
                self.context = Some(context.clone());
                if self.site.is_none() {
                    self.site = self.monitor.as_ref().and_then(Monitor::site);
                }
            }

            Action::NextRoom => self.navigate(Navigate::RoomForward),
            Action::PrevRoom => self.navigate(Navigate::RoomBack),
            Action::NextBrand => self.navigate(Navigate::BrandForward),

            Action::ToggleDevice(device) => {
                if let Some(monitor) = &self.monitor {
                    match monitor.toggle_device(*device) {
                        Ok(state) => {
                            info!(device = device.key(), state = state.label(), "device toggled");
                        }
                        Err(e) => {
                            warn!(error = %e, "device toggle failed");
                            let _ = self
                                .action_tx
                                .send(Action::Notify(Notification::warning(format!("{e}"))));
                        }
                    }
                }
            }

            _ => {}
        }

        // Screens see every action; follow-ups go back through the queue.
        let mut follow_ups = Vec::new();
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                follow_ups.push(follow_up);
            }
        }
        for follow_up in follow_ups {
            self.action_tx.send(follow_up)?;
        }

        Ok(())
    }

    /// Resolve and kick off a room/brand navigation.
    fn navigate(&mut self, direction: Navigate) {
        let Some(site) = &self.site else { return };
        let Some(target) = next_context(site, self.context.as_ref(), direction) else {
            return;
        };
        let Some(monitor) = self.monitor.clone() else {
            return;
        };

        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = monitor.select_room(&target.brand, &target.room).await {
                warn!(error = %e, "room selection failed");
                let _ = tx.send(Action::Notify(Notification::error(format!("{e}"))));
            }
        });
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

        self.render_tab_bar(frame, rows[0]);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, rows[1]);
        }

        self.render_status_bar(frame, rows[2]);

        if self.help_visible {
            self.render_help(frame);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|id| Line::from(format!(" {id} ")))
            .collect();
        let selected = ScreenId::ALL
            .iter()
            .position(|&id| id == self.active_screen)
            .unwrap_or(0);

        let context_label = self
            .context
            .as_ref()
            .map_or_else(|| "—".to_owned(), ToString::to_string);
        let status = match self.connection_status {
            ConnectionStatus::Connected => Span::styled("● ", Style::default().fg(ratatui::style::Color::Green)),
            ConnectionStatus::Connecting => Span::styled("◌ ", Style::default().fg(ratatui::style::Color::Yellow)),
            ConnectionStatus::Disconnected => Span::styled("○ ", Style::default().fg(ratatui::style::Color::Red)),
        };

        let columns = Layout::horizontal([Constraint::Fill(1), Constraint::Length(
            u16::try_from(context_label.chars().count()).unwrap_or(u16::MAX).saturating_add(3),
        )])
        .split(area);

        let tabs = Tabs::new(titles)
            .select(selected)
            .highlight_style(Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, columns[0]);

        frame.render_widget(
            Paragraph::new(Line::from(vec![status, Span::raw(context_label)])),
            columns[1],
        );
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.notification {
            Some((notification, _)) => {
                let color = match notification.level {
                    NotificationLevel::Info => ratatui::style::Color::Green,
                    NotificationLevel::Warning => ratatui::style::Color::Yellow,
                    NotificationLevel::Error => ratatui::style::Color::Red,
                };
                Line::from(Span::styled(
                    notification.message.clone(),
                    Style::default().fg(color),
                ))
            }
            None => Line::from(Span::styled(
                " q quit · tab screens · [/] rooms · b brand · space toggle · enter details · ? help",
                Style::default().fg(theme::DIM),
            )),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_help(&self, frame: &mut Frame) {
        let area = centered(frame.area(), 44, 13);
        frame.render_widget(Clear, area);

        let lines = vec![
            Line::from(Span::styled("Keys", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from("  1/2, tab   switch screen"),
            Line::from("  ] / [      next / previous room"),
            Line::from("  b          next brand"),
            Line::from("  j/k        move selection"),
            Line::from("  space, t   toggle device open/closed"),
            Line::from("  enter      open detail panel"),
            Line::from("  esc        close detail panel"),
            Line::from("  ?          toggle this help"),
            Line::from("  q          quit"),
        ];
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title(" Help ")
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(theme::ACCENT)),
            ),
            area,
        );
    }
}

// ── Navigation resolution ────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Navigate {
    RoomForward,
    RoomBack,
    BrandForward,
}

/// Compute the next (brand, room) for a navigation step, wrapping within
/// the site configuration. `None` when the site has no rooms at all.
fn next_context(
    site: &SiteConfig,
    current: Option<&RoomContext>,
    direction: Navigate,
) -> Option<RoomContext> {
    let brands: Vec<_> = site.brands.iter().filter(|b| !b.rooms.is_empty()).collect();
    if brands.is_empty() {
        return None;
    }

    let brand_idx = current
        .and_then(|ctx| brands.iter().position(|b| b.name == ctx.brand))
        .unwrap_or(0);
    let brand = brands.get(brand_idx)?;
    let room_idx = current
        .and_then(|ctx| brand.rooms.iter().position(|r| r.name == ctx.room))
        .unwrap_or(0);

    let (brand, room) = match direction {
        Navigate::RoomForward => {
            let room = &brand.rooms[(room_idx + 1) % brand.rooms.len()];
            (*brand, room)
        }
        Navigate::RoomBack => {
            let len = brand.rooms.len();
            let room = &brand.rooms[(room_idx + len - 1) % len];
            (*brand, room)
        }
        Navigate::BrandForward => {
            let brand = brands[(brand_idx + 1) % brands.len()];
            let room = brand.rooms.first()?;
            (brand, room)
        }
    };

    Some(RoomContext::new(brand.name.clone(), room.name.clone()))
}

/// A centered rect of at most (width, height) inside `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerium_core::model::{Brand, Room};

    fn site() -> SiteConfig {
        SiteConfig {
            active: true,
            brands: vec![
                Brand {
                    id: "e1".into(),
                    name: "Maison".into(),
                    rooms: vec![
                        Room { id: "p1".into(), name: "Bureau".into(), kind: None },
                        Room { id: "p2".into(), name: "Chambre".into(), kind: None },
                    ],
                },
                Brand {
                    id: "e2".into(),
                    name: "Atelier".into(),
                    rooms: vec![Room { id: "p3".into(), name: "Hall".into(), kind: None }],
                },
            ],
        }
    }

    #[test]
    fn room_navigation_wraps_within_the_brand() {
        let site = site();
        let at_last = RoomContext::new("Maison", "Chambre");
        let next = next_context(&site, Some(&at_last), Navigate::RoomForward).expect("next");
        assert_eq!(next, RoomContext::new("Maison", "Bureau"));

        let back = next_context(&site, Some(&next), Navigate::RoomBack).expect("back");
        assert_eq!(back, RoomContext::new("Maison", "Chambre"));
    }

    #[test]
    fn brand_navigation_enters_the_first_room() {
        let site = site();
        let current = RoomContext::new("Maison", "Chambre");
        let next = next_context(&site, Some(&current), Navigate::BrandForward).expect("next");
        assert_eq!(next, RoomContext::new("Atelier", "Hall"));
    }

    #[test]
    fn navigation_without_context_starts_at_the_first_brand() {
        let site = site();
        let next = next_context(&site, None, Navigate::RoomForward).expect("next");
        assert_eq!(next, RoomContext::new("Maison", "Chambre"));
    }

    #[test]
    fn empty_site_yields_no_navigation() {
        let site = SiteConfig { active: true, brands: Vec::new() };
        assert!(next_context(&site, None, Navigate::RoomForward).is_none());
    }
}
