//! Boot screens shown before the first status snapshot arrives.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::Paragraph,
};

use super::theme::THEME;

const LOGO: &str = r"                  _           _
 _ __ __  __ ___| |__   __ _| |_
| '_ \\ \/ // __| '_ \ / _` | __|
| |_) |>  <| (__| | | | (_| | |_
| .__//_/\_\\___|_| |_|\__,_|\__|
|_|";

fn centered(area: Rect) -> (Rect, Rect) {
    let [logo, body] = Layout::vertical([Constraint::Length(7), Constraint::Length(4)])
        .flex(Flex::Center)
        .areas(area);
    let [logo] = Layout::horizontal([Constraint::Length(34)])
        .flex(Flex::Center)
        .areas(logo);
    (logo, body)
}

fn render_logo(frame: &mut Frame<'_>, area: Rect) {
    let style = Style::default().fg(THEME.logo).add_modifier(Modifier::BOLD);
    frame.render_widget(Paragraph::new(Text::styled(LOGO, style)), area);
}

/// Spinner while the first `/status` fetch is outstanding.
pub fn render_loading(frame: &mut Frame<'_>, area: Rect, spinner: char, backend_url: &str) {
    let (logo, body) = centered(area);
    render_logo(frame, logo);
    let text = Text::from(vec![
        Line::from(Span::styled(
            format!("{spinner} Connecting to backend..."),
            Style::default().fg(THEME.status_spinner),
        )),
        Line::from(Span::styled(
            backend_url.to_string(),
            Style::default().fg(THEME.fg_muted),
        )),
    ]);
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), body);
}

/// Generic failure screen; details are only in the log.
pub fn render_error(frame: &mut Frame<'_>, area: Rect, backend_url: &str) {
    let (logo, body) = centered(area);
    render_logo(frame, logo);
    let text = Text::from(vec![
        Line::from(Span::styled(
            "Backend unreachable",
            Style::default()
                .fg(THEME.error)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("Could not load status from {backend_url}."),
            Style::default().fg(THEME.fg_dim),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "r:retry  Esc:quit",
            Style::default().fg(THEME.status_hint),
        )),
    ]);
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), body);
}
