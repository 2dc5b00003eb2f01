//! Readings screen — latest values, score history, preventive actions.

use std::collections::VecDeque;
use std::sync::Arc;

use color_eyre::eyre::Result;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Sparkline},
};

use aerium_core::model::{Pollutant, PredictionReport, Sample};
use aerium_core::score::ScoreLevel;
use aerium_core::thresholds;

use crate::action::Action;
use crate::screen::{Screen, ScreenId};
use crate::theme;

/// Sparkline backlog, matching the session store's rolling window at the
/// fastest push cadence.
const SCORE_POINTS: usize = 60;

pub struct ReadingsScreen {
    sample: Option<Sample>,
    score: Option<f64>,
    score_history: VecDeque<u64>,
    prediction: Option<Arc<PredictionReport>>,
}

impl ReadingsScreen {
    pub fn new() -> Self {
        Self {
            sample: None,
            score: None,
            score_history: VecDeque::with_capacity(SCORE_POINTS),
            prediction: None,
        }
    }

    fn render_values(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Latest reading ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded);

        let lines = match &self.sample {
            Some(sample) => {
                let mut lines = vec![Line::from(Span::styled(
                    format!("as of {}", sample.timestamp.format("%H:%M:%S")),
                    Style::default().fg(theme::DIM),
                ))];
                for pollutant in Pollutant::ALL {
                    let value = sample.value(pollutant);
                    let severity = thresholds::evaluate(pollutant, value);
                    let rendered = if value.is_nan() {
                        "—".to_owned()
                    } else {
                        format!("{value:.1} {}", pollutant.unit())
                    };
                    lines.push(Line::from(vec![
                        Span::raw(format!("{:<12}", pollutant.label())),
                        Span::styled(rendered, theme::severity_style(severity)),
                    ]));
                }
                lines
            }
            None => vec![Line::from(Span::styled(
                "no data",
                Style::default().fg(theme::DIM),
            ))],
        };

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_score(&self, frame: &mut Frame, area: Rect) {
        let title = match self.score {
            Some(score) => format!(
                " IAQ score: {score:.0} ({}) ",
                ScoreLevel::from_score(score).label()
            ),
            None => " IAQ score ".to_owned(),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded);

        let data: Vec<u64> = self.score_history.iter().copied().collect();
        let sparkline = Sparkline::default()
            .block(block)
            .max(100)
            .style(Style::default().fg(theme::ACCENT))
            .data(&data);
        frame.render_widget(sparkline, area);
    }

    fn render_predictions(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Preventive actions ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded);

        let lines = match &self.prediction {
            Some(report) if !report.actions.is_empty() => {
                let mut lines = Vec::new();
                if let Some(predicted) = report.predicted_score {
                    lines.push(Line::from(Span::styled(
                        format!("predicted score: {predicted:.0}"),
                        Style::default().fg(theme::DIM),
                    )));
                }
                for action in &report.actions {
                    let target = action
                        .device
                        .map_or(action.module.as_str(), |d| d.label());
                    let mut spans = vec![
                        Span::styled(
                            format!("[{}] ", action.priority.label()),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::raw(format!("{target}: {}", action.action)),
                    ];
                    if let Some(reason) = &action.reason {
                        spans.push(Span::styled(
                            format!(" — {reason}"),
                            Style::default().fg(theme::DIM),
                        ));
                    }
                    lines.push(Line::from(spans));
                }
                lines
            }
            Some(_) => vec![Line::from(Span::styled(
                "nothing to do",
                Style::default().fg(theme::DIM),
            ))],
            None => vec![Line::from(Span::styled(
                "no prediction yet",
                Style::default().fg(theme::DIM),
            ))],
        };

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

impl Screen for ReadingsScreen {
    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::ContextChanged(_) => {
                self.sample = None;
                self.score = None;
                self.score_history.clear();
                self.prediction = None;
            }
            Action::SampleApplied(sample) => {
                self.sample = Some(sample.clone());
            }
            Action::ScoreUpdated { score, .. } => {
                self.score = Some(*score);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
                self.score_history.push_back(score.clamp(0.0, 100.0) as u64);
                while self.score_history.len() > SCORE_POINTS {
                    self.score_history.pop_front();
                }
            }
            Action::PredictionUpdated(report) => {
                self.prediction = Some(Arc::clone(report));
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::vertical([
            Constraint::Length(9),
            Constraint::Length(5),
            Constraint::Fill(1),
        ])
        .split(area);

        self.render_values(frame, rows[0]);
        self.render_score(frame, rows[1]);
        self.render_predictions(frame, rows[2]);
    }

    fn id(&self) -> ScreenId {
        ScreenId::Readings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> Sample {
        Sample {
            timestamp: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).single().expect("valid"),
            co2: 800.0,
            pm25: 5.0,
            tvoc: 100.0,
            temperature: 21.0,
            humidity: 50.0,
            global_score: Some(84.0),
        }
    }

    #[test]
    fn context_change_clears_stale_readings() {
        let mut screen = ReadingsScreen::new();
        screen.update(&Action::SampleApplied(sample())).expect("update");
        screen
            .update(&Action::ScoreUpdated { at: sample().timestamp, score: 84.0 })
            .expect("update");
        assert!(screen.sample.is_some());

        screen
            .update(&Action::ContextChanged(aerium_core::RoomContext::new(
                "Maison", "Chambre",
            )))
            .expect("update");
        assert!(screen.sample.is_none());
        assert!(screen.score_history.is_empty());
    }

    #[test]
    fn score_history_is_capped() {
        let mut screen = ReadingsScreen::new();
        for i in 0..100 {
            screen
                .update(&Action::ScoreUpdated {
                    at: sample().timestamp,
                    score: f64::from(i),
                })
                .expect("update");
        }
        assert_eq!(screen.score_history.len(), SCORE_POINTS);
    }
}
