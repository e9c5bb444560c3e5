//! Status bar widget: activity spinner, inline notices, and key hints.

use super::app::TuiApp;
use super::theme::THEME;
use client::Phase;
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

/// Braille-pattern spinner frames for the status bar animation.
const SPINNER: &[char] = &['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];

pub fn spinner_frame(tick: u8) -> char {
    SPINNER[(tick as usize) % SPINNER.len()]
}

/// Renders the chat view's status line.
pub fn render(app: &TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let spinner = spinner_frame(app.spinner_tick);
    let line = if app.sending {
        Line::from(Span::styled(
            format!(" {spinner} Waiting for reply..."),
            Style::default().fg(THEME.status_spinner),
        ))
    } else if app.phase == Phase::Loading {
        Line::from(Span::styled(
            format!(" {spinner} Syncing status..."),
            Style::default().fg(THEME.status_spinner),
        ))
    } else if let Some(note) = &app.status_note {
        Line::from(Span::styled(
            format!(" {note}"),
            Style::default().fg(THEME.warning),
        ))
    } else if app.chat_enabled() {
        Line::from(Span::styled(
            " Enter:send  ↑↓:scroll  Ctrl+S:settings  Esc:quit",
            Style::default().fg(THEME.status_hint),
        ))
    } else {
        Line::from(vec![
            Span::styled(" Chat locked ", Style::default().fg(THEME.lock_border)),
            Span::styled(
                " Ctrl+S:settings  Esc:quit",
                Style::default().fg(THEME.status_hint),
            ),
        ])
    };
    frame.render_widget(Paragraph::new(line), area);
}
