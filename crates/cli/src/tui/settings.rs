//! Settings modal: switch model, replace the API key, or reset everything.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use proto::{ApiError, ModelInfo, UpdateRequest};
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tracing::{debug, warn};

use super::action::Command;
use super::input::TextInput;
use super::setup::normalize_api_key;
use super::theme::THEME;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Model,
    ApiKey,
}

/// What closing the modal should do to the app.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Stay(Command),
    Close,
}

#[derive(Debug)]
pub struct SettingsModal {
    pub provider: String,
    /// Model active when the modal opened.
    pub current_model: Option<String>,
    pub models: Vec<ModelInfo>,
    pub model_cursor: usize,
    pub models_loading: bool,
    pub api_key: TextInput,
    pub focus: Focus,
    pub confirm_reset: bool,
    pub saving: bool,
    pub notice: Option<String>,
}

impl SettingsModal {
    /// Opens the modal and returns the command loading the provider's models.
    pub fn open(provider: String, current_model: Option<String>) -> (Self, Command) {
        let load = Command::LoadModels(provider.clone());
        let modal = Self {
            provider,
            current_model,
            models: Vec::new(),
            model_cursor: 0,
            models_loading: true,
            api_key: TextInput::new(),
            focus: Focus::Model,
            confirm_reset: false,
            saving: false,
            notice: None,
        };
        (modal, load)
    }

    pub fn selected_model(&self) -> Option<&ModelInfo> {
        self.models.get(self.model_cursor)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Outcome {
        if self.saving {
            return Outcome::Stay(Command::None);
        }
        if self.confirm_reset {
            self.confirm_reset = false;
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                self.saving = true;
                return Outcome::Stay(Command::Reset);
            }
            self.notice = Some("Reset cancelled.".into());
            return Outcome::Stay(Command::None);
        }

        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => Outcome::Close,
            (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
                self.confirm_reset = true;
                self.notice = None;
                Outcome::Stay(Command::None)
            }
            (_, KeyCode::Tab) | (_, KeyCode::BackTab) => {
                self.focus = match self.focus {
                    Focus::Model => Focus::ApiKey,
                    Focus::ApiKey => Focus::Model,
                };
                Outcome::Stay(Command::None)
            }
            (_, KeyCode::Enter) => self.save(),
            (_, KeyCode::Up) if self.focus == Focus::Model => {
                self.model_cursor = self.model_cursor.saturating_sub(1);
                Outcome::Stay(Command::None)
            }
            (_, KeyCode::Down) if self.focus == Focus::Model => {
                if self.model_cursor + 1 < self.models.len() {
                    self.model_cursor += 1;
                }
                Outcome::Stay(Command::None)
            }
            _ if self.focus == Focus::ApiKey => {
                self.api_key.handle_key(key);
                Outcome::Stay(Command::None)
            }
            _ => Outcome::Stay(Command::None),
        }
    }

    /// Builds the update. The selected model is always sent so every save
    /// re-verifies; a blank key keeps the stored one.
    fn save(&mut self) -> Outcome {
        let api_key = match normalize_api_key(self.api_key.value(), false) {
            Ok(key) => key,
            Err(err) => {
                self.notice = Some(err.to_string());
                return Outcome::Stay(Command::None);
            }
        };
        let model_id = self.selected_model().map(|m| m.id.clone());
        let request = UpdateRequest { model_id, api_key };
        if request.is_empty() {
            debug!("No model loaded and no key entered");
            self.notice = Some("Select a model or enter an API key.".into());
            return Outcome::Stay(Command::None);
        }
        self.saving = true;
        self.notice = None;
        Outcome::Stay(Command::SaveSettings(request))
    }

    pub fn on_models(&mut self, provider: &str, result: Result<Vec<ModelInfo>, ApiError>) {
        if provider != self.provider {
            return;
        }
        self.models_loading = false;
        match result {
            Ok(models) => {
                self.model_cursor = self
                    .current_model
                    .as_ref()
                    .and_then(|current| models.iter().position(|m| &m.id == current))
                    .unwrap_or(0);
                self.models = models;
            }
            Err(err) => {
                warn!(provider, error = %err, "Failed to load models for settings");
                self.notice = Some("Could not load models, see log.".into());
            }
        }
    }

    /// Save or reset failed; the modal stays open.
    pub fn on_failed(&mut self, what: &str, err: &ApiError) {
        warn!(error = %err, "{what} failed");
        self.saving = false;
        self.notice = Some(format!("{what} failed, see log."));
    }
}

/// Renders the modal over the chat view.
pub fn render(modal: &SettingsModal, frame: &mut Frame<'_>, area: Rect, spinner: char) {
    let [column] = Layout::horizontal([Constraint::Length(60)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::vertical([Constraint::Length(18)])
        .flex(Flex::Center)
        .areas(column);

    let label = |text: &'static str, focused: bool| {
        let style = if focused {
            Style::default()
                .fg(THEME.accent_bright)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(THEME.fg_muted)
        };
        Line::from(Span::styled(text, style))
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(" Provider  ", Style::default().fg(THEME.fg_muted)),
            Span::styled(modal.provider.as_str(), Style::default().fg(THEME.fg)),
        ]),
        Line::from(""),
        label(" Model", modal.focus == Focus::Model),
    ];

    if modal.models_loading {
        lines.push(Line::from(Span::styled(
            format!("   {spinner} Loading models..."),
            Style::default().fg(THEME.status_spinner),
        )));
    } else {
        // Keep the list to a fixed window around the cursor.
        let start = modal.model_cursor.saturating_sub(3);
        for (i, model) in modal.models.iter().enumerate().skip(start).take(6) {
            let active = modal.current_model.as_deref() == Some(model.id.as_str());
            let marker = if i == modal.model_cursor { " › " } else { "   " };
            let suffix = if active { "  (active)" } else { "" };
            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(THEME.selected_marker)),
                Span::styled(
                    format!("{}{suffix}", model.name),
                    if i == modal.model_cursor {
                        Style::default().fg(THEME.fg)
                    } else {
                        Style::default().fg(THEME.fg_dim)
                    },
                ),
            ]));
        }
    }

    lines.push(Line::from(""));
    lines.push(label(" New API key (blank keeps current)", modal.focus == Focus::ApiKey));
    let key_row = lines.len();
    lines.push(Line::from(Span::raw(format!("   {}", modal.api_key.masked()))));
    lines.push(Line::from(""));

    if modal.saving {
        lines.push(Line::from(Span::styled(
            format!(" {spinner} Saving..."),
            Style::default().fg(THEME.status_spinner),
        )));
    } else if modal.confirm_reset {
        lines.push(Line::from(Span::styled(
            " Reset all configuration? Press y to confirm, any key to cancel.",
            Style::default().fg(THEME.error).add_modifier(Modifier::BOLD),
        )));
    } else if let Some(notice) = &modal.notice {
        lines.push(Line::from(Span::styled(
            format!(" {notice}"),
            Style::default().fg(THEME.warning),
        )));
    }
    lines.push(Line::from(Span::styled(
        " Tab switch  Enter save  Ctrl+R reset  Esc close",
        Style::default().fg(THEME.status_hint),
    )));

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(Text::from(lines)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(THEME.border_active))
                .style(Style::default().bg(THEME.overlay_bg))
                .title(" Settings "),
        ),
        popup,
    );

    if modal.focus == Focus::ApiKey && !modal.saving && !modal.confirm_reset {
        frame.set_cursor_position((
            popup.x + 1 + 3 + modal.api_key.masked_cursor_col(),
            popup.y + 1 + key_row as u16,
        ));
    }
}
