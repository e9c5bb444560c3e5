//! Chat view: header, transcript, lock overlay, and input box.

use super::app::TuiApp;
use super::status;
use super::theme::THEME;
use proto::{AuthStatus, Role};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub const NO_MODEL_LABEL: &str = "No model selected";

/// Renders the whole chat view into `area`.
pub fn render(app: &mut TuiApp, frame: &mut Frame<'_>, area: Rect) {
    // Layout: header(1) | history(fill) | status(1) | input(3)
    let [header, history, status_area, input] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(3),
    ])
    .areas(area);

    render_header(app, frame, header);
    render_history(app, frame, history);
    if !app.chat_enabled() {
        render_lock_overlay(app, frame, history);
    }
    status::render(app, frame, status_area);
    render_input(app, frame, input);
}

fn render_header(app: &TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let state = app.state.as_ref();
    let model = state.and_then(|s| s.model_label()).unwrap_or(NO_MODEL_LABEL);
    let provider = state.and_then(|s| s.provider.as_deref()).unwrap_or("-");
    let (chip, chip_color) = if app.chat_enabled() {
        ("● ready", THEME.success)
    } else {
        ("● locked", THEME.lock_border)
    };
    let title = Line::from(vec![
        Span::styled(
            " pxchat ",
            Style::default()
                .fg(THEME.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {model} "), Style::default().fg(THEME.accent_bright)),
        Span::styled(format!(" {provider} "), Style::default().fg(THEME.fg_muted)),
        Span::styled(format!(" {chip}"), Style::default().fg(chip_color)),
    ]);
    frame.render_widget(Paragraph::new(title), area);
}

fn render_history(app: &mut TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let locked = !app.chat_enabled();
    let text_style = if locked {
        Style::default().fg(THEME.fg_dim)
    } else {
        Style::default().fg(THEME.fg)
    };

    let mut lines: Vec<Line<'_>> = Vec::new();
    for msg in app.transcript.messages() {
        lines.push(Line::from(""));
        let (label, color) = match msg.role {
            Role::User => ("You: ", THEME.user_label),
            Role::Assistant => ("Assistant: ", THEME.assistant_label),
        };
        let indent = " ".repeat(label.len());
        for (i, line) in msg.content.lines().enumerate() {
            if i == 0 {
                lines.push(Line::from(vec![
                    Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                    Span::styled(line.to_string(), text_style),
                ]));
            } else {
                lines.push(Line::from(Span::styled(format!("{indent}{line}"), text_style)));
            }
        }
    }

    // Inner width (area minus 1-cell border on each side).
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let content_height: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(inner_width).max(1))
        .sum();
    let visible_height = area.height.saturating_sub(2) as usize;
    let max_scroll = content_height.saturating_sub(visible_height).min(u16::MAX as usize) as u16;
    let scroll = app.history_scroll.min(max_scroll);
    // Persist the clamped value so scrolling up from the bottom is immediate.
    app.history_scroll = scroll;

    let history = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(THEME.border)),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(history, area);
}

fn render_lock_overlay(app: &TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let [column] = Layout::horizontal([Constraint::Length(52)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::vertical([Constraint::Length(7)])
        .flex(Flex::Center)
        .areas(column);

    let reason = match app.state.as_ref().map(|s| s.auth) {
        Some(AuthStatus::Failed) => "The backend rejected the stored API key.",
        _ => "Credentials have not been verified yet.",
    };
    let text = Text::from(vec![
        Line::from(Span::styled(
            "Chat disabled",
            Style::default()
                .fg(THEME.lock_border)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(reason, Style::default().fg(THEME.fg))),
        Line::from(Span::styled(
            "Press Enter or Ctrl+S to open Settings.",
            Style::default().fg(THEME.info),
        )),
    ]);

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(THEME.lock_border))
                .style(Style::default().bg(THEME.overlay_bg)),
        ),
        popup,
    );
}

fn render_input(app: &TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let editable = app.chat_enabled() && !app.sending;
    let border_color = if editable {
        THEME.border_active
    } else {
        THEME.fg_muted
    };
    let (display, style) = if !app.chat_enabled() {
        ("Chat disabled", Style::default().fg(THEME.fg_muted))
    } else if app.input.is_empty() {
        ("Type a message...", Style::default().fg(THEME.fg_muted))
    } else {
        (app.input.value(), Style::default().fg(THEME.fg))
    };
    let title = if app.chat_enabled() {
        " Input "
    } else {
        " Input (locked) "
    };

    let input = Paragraph::new(Span::styled(display, style)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title),
    );
    frame.render_widget(input, area);

    if editable && app.settings.is_none() {
        frame.set_cursor_position((area.x + 1 + app.input.cursor_col(), area.y + 1));
    }
}
