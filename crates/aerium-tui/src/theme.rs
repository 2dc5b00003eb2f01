//! Severity palette and shared styles.

use ratatui::style::{Color, Modifier, Style};

use aerium_core::model::Severity;

pub const ACCENT: Color = Color::Cyan;
pub const DIM: Color = Color::DarkGray;

/// Color for a severity tier, matching the original dashboard palette.
pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Danger => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Blue,
        Severity::None => DIM,
    }
}

pub fn severity_style(severity: Severity) -> Style {
    let style = Style::default().fg(severity_color(severity));
    if severity == Severity::Danger {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

/// Marker glyph for the overlay, by severity.
pub fn marker_glyph(severity: Severity) -> &'static str {
    match severity {
        Severity::Danger => "◉",
        Severity::Warning => "●",
        _ => "○",
    }
}
