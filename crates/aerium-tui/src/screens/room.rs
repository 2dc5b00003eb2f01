//! Room screen — the digital twin: plan overlay, alert table, detail panel.
//!
//! Everything drawn here is a projection of the [`MarkerBoard`], which is
//! itself reconciled from alert-store snapshots. Clicking or toggling a
//! marker dispatches an action; the visible state only changes when the
//! store answers with a fresh snapshot.

use std::cell::Cell;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell as TableCell, Paragraph, Row, Table},
};

use aerium_core::model::AlertPoint;
use aerium_core::RoomContext;

use crate::action::Action;
use crate::screen::{Screen, ScreenId};
use crate::sync::MarkerBoard;
use crate::theme;

/// Click tolerance in normalized plan units.
const HIT_TOLERANCE: f64 = 0.08;

pub struct RoomScreen {
    board: MarkerBoard,
    points: Arc<Vec<Arc<AlertPoint>>>,
    context: Option<RoomContext>,
    /// Selected row in the alert table.
    selected: usize,
    /// Plan area of the last render, for mouse hit-testing.
    plan_area: Cell<Rect>,
}

impl RoomScreen {
    pub fn new() -> Self {
        Self {
            board: MarkerBoard::new(),
            points: Arc::new(Vec::new()),
            context: None,
            selected: 0,
            plan_area: Cell::new(Rect::default()),
        }
    }

    fn selected_device(&self) -> Option<aerium_core::model::DeviceKind> {
        self.board.rows().get(self.selected).map(|r| r.device)
    }

    fn clamp_selection(&mut self) {
        let len = self.board.rows().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    // ── Rendering helpers ────────────────────────────────────────────

    fn render_plan(&self, frame: &mut Frame, area: Rect) {
        let title = self.context.as_ref().map_or_else(
            || " Room ".to_owned(),
            |ctx| format!(" {} — {} ", ctx.brand, ctx.room),
        );
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.plan_area.set(inner);

        if inner.width < 4 || inner.height < 3 {
            return;
        }

        for marker in self.board.markers() {
            let x = inner.x + scaled(marker.position.0, inner.width.saturating_sub(1));
            let y = inner.y + scaled(marker.position.1, inner.height.saturating_sub(1));

            let glyph = theme::marker_glyph(marker.severity);
            let label = format!(
                "{} {} ({})",
                glyph,
                marker.device.label(),
                marker.actuation.label()
            );
            let width = u16::try_from(label.chars().count()).unwrap_or(u16::MAX);
            let width = width.min(inner.right().saturating_sub(x));
            if width == 0 {
                continue;
            }
            let marker_area = Rect::new(x, y, width, 1);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    label,
                    theme::severity_style(marker.severity),
                ))),
                marker_area,
            );
        }

        if self.board.markers().is_empty() {
            let hint = Paragraph::new(Line::from(Span::styled(
                "no active alerts in this room",
                Style::default().fg(theme::DIM),
            )));
            let hint_area = Rect::new(inner.x + 1, inner.y + inner.height / 2, inner.width.saturating_sub(2), 1);
            frame.render_widget(hint, hint_area);
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(["Device", "Severity", "State", "Action", "Issues"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = self.board.rows().iter().enumerate().map(|(i, row)| {
            let style = if i == self.selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Row::new([
                TableCell::from(row.device.label()),
                TableCell::from(Span::styled(
                    row.severity.label(),
                    theme::severity_style(row.severity),
                )),
                TableCell::from(row.actuation.label()),
                TableCell::from(row.action.label()),
                TableCell::from(row.issues.clone()),
            ])
            .style(style)
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Length(9),
                Constraint::Length(7),
                Constraint::Length(9),
                Constraint::Fill(1),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .title(" Alerts ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        );
        frame.render_widget(table, area);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let Some(detail) = self.board.detail() else {
            return;
        };
        let point = &detail.point;

        let mut lines = vec![
            Line::from(vec![
                Span::raw("Severity: "),
                Span::styled(point.severity.label(), theme::severity_style(point.severity)),
            ]),
            Line::from(format!("State: {}", point.actuation.label())),
            Line::from(format!("Suggested: {}", point.action.label())),
            Line::from(""),
        ];
        if point.issues.is_empty() {
            lines.push(Line::from(Span::styled(
                "no issues",
                Style::default().fg(theme::DIM),
            )));
        } else {
            for issue in &point.issues {
                lines.push(Line::from(Span::styled(
                    format!(
                        "{} {:.1} {} (limit {:.0})",
                        issue.name(),
                        issue.value,
                        issue.unit(),
                        issue.threshold
                    ),
                    theme::severity_style(issue.severity),
                )));
            }
        }

        let panel = Paragraph::new(lines).block(
            Block::default()
                .title(format!(" {} ", point.device.label()))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(theme::ACCENT)),
        );
        frame.render_widget(panel, area);
    }
}

impl Screen for RoomScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Down | KeyCode::Char('j') => Some(Action::SelectNext),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::SelectPrev),
            KeyCode::Enter => Some(Action::OpenDetail),
            KeyCode::Esc => Some(Action::CloseDetail),
            KeyCode::Char(' ' | 't') => Some(Action::ToggleSelected),
            _ => None,
        };
        Ok(action)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(None);
        }
        let plan = self.plan_area.get();
        if plan.width < 2 || plan.height < 2 {
            return Ok(None);
        }
        if mouse.column < plan.x
            || mouse.column >= plan.right()
            || mouse.row < plan.y
            || mouse.row >= plan.bottom()
        {
            return Ok(None);
        }

        let x = f64::from(mouse.column - plan.x) / f64::from(plan.width.saturating_sub(1).max(1));
        let y = f64::from(mouse.row - plan.y) / f64::from(plan.height.saturating_sub(1).max(1));

        Ok(self
            .board
            .marker_at(x, y, HIT_TOLERANCE)
            .map(Action::ToggleDevice))
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::ContextChanged(context) => {
                // Fresh room, fresh board — nothing may leak across rooms.
                self.board = MarkerBoard::new();
                self.points = Arc::new(Vec::new());
                self.context = Some(context.clone());
                self.selected = 0;
            }
            Action::AlertsUpdated(points) => {
                self.points = Arc::clone(points);
                self.board.sync(points);
                self.clamp_selection();
            }
            Action::SelectNext => {
                if self.selected + 1 < self.board.rows().len() {
                    self.selected += 1;
                }
            }
            Action::SelectPrev => {
                self.selected = self.selected.saturating_sub(1);
            }
            Action::ToggleSelected => {
                return Ok(self.selected_device().map(Action::ToggleDevice));
            }
            Action::OpenDetail => {
                if let Some(device) = self.selected_device() {
                    let points = Arc::clone(&self.points);
                    self.board.open_detail(device, &points);
                }
            }
            Action::CloseDetail => {
                self.board.close_detail();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let columns = if self.board.detail().is_some() {
            Layout::horizontal([Constraint::Fill(2), Constraint::Fill(1)]).split(area)
        } else {
            Layout::horizontal([Constraint::Fill(1)]).split(area)
        };

        let rows = Layout::vertical([Constraint::Fill(2), Constraint::Fill(1)]).split(columns[0]);
        self.render_plan(frame, rows[0]);
        self.render_table(frame, rows[1]);

        if columns.len() > 1 {
            self.render_detail(frame, columns[1]);
        }
    }

    fn id(&self) -> ScreenId {
        ScreenId::Room
    }
}

/// Scale a normalized coordinate onto a 0..=max cell offset.
fn scaled(norm: f64, max: u16) -> u16 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
    {
        (norm.clamp(0.0, 1.0) * f64::from(max)).round() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerium_core::model::{ActionKey, ActuationState, DeviceKind, Severity};

    fn point(device: DeviceKind, severity: Severity) -> Arc<AlertPoint> {
        Arc::new(AlertPoint {
            device,
            brand: "Maison".into(),
            room: "Bureau".into(),
            active: severity.is_active(),
            severity,
            action: ActionKey::Open,
            issues: Vec::new(),
            actuation: device.default_actuation(),
            position: (0.5, 0.5),
        })
    }

    #[test]
    fn toggle_selected_dispatches_for_the_highlighted_row() {
        let mut screen = RoomScreen::new();
        screen
            .update(&Action::AlertsUpdated(Arc::new(vec![
                point(DeviceKind::Door, Severity::Danger),
                point(DeviceKind::Window, Severity::Info),
            ])))
            .expect("update");

        // First row is the most severe: the door.
        let follow_up = screen.update(&Action::ToggleSelected).expect("update");
        assert!(matches!(follow_up, Some(Action::ToggleDevice(DeviceKind::Door))));
    }

    #[test]
    fn context_change_resets_the_board() {
        let mut screen = RoomScreen::new();
        screen
            .update(&Action::AlertsUpdated(Arc::new(vec![point(
                DeviceKind::Door,
                Severity::Danger,
            )])))
            .expect("update");
        assert_eq!(screen.board.rows().len(), 1);

        screen
            .update(&Action::ContextChanged(RoomContext::new("Maison", "Chambre")))
            .expect("update");
        assert!(screen.board.rows().is_empty());
        assert!(screen.board.detail().is_none());
    }

    #[test]
    fn selection_clamps_when_rows_shrink() {
        let mut screen = RoomScreen::new();
        screen
            .update(&Action::AlertsUpdated(Arc::new(vec![
                point(DeviceKind::Door, Severity::Danger),
                point(DeviceKind::Window, Severity::Warning),
            ])))
            .expect("update");
        screen.update(&Action::SelectNext).expect("update");
        assert_eq!(screen.selected, 1);

        screen
            .update(&Action::AlertsUpdated(Arc::new(vec![point(
                DeviceKind::Door,
                Severity::Danger,
            )])))
            .expect("update");
        assert_eq!(screen.selected, 0);
    }
}
