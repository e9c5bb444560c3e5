//! TUI application state, rendering, and input handling.

use client::{BlockReason, Phase, SystemState, Transcript, prepare_send};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use tracing::{debug, info, warn};

use super::action::{Action, Command};
use super::input::TextInput;
use super::settings::{Outcome, SettingsModal};
use super::setup::SetupWizard;
use super::status::spinner_frame;
use super::{boot, chat, settings, setup};

/// Which top-level screen the current state maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// No snapshot yet, fetch outstanding.
    Loading,
    /// Boot fetch failed; offer a retry.
    BootError,
    /// Backend not configured.
    Setup,
    /// Configured; locked or not.
    Chat,
}

/// Full state for the TUI session.
pub struct TuiApp {
    /// Controller phase as of the last observation.
    pub phase: Phase,
    /// Controller snapshot as of the last observation.
    pub state: Option<SystemState>,
    pub boot_failed: bool,
    pub transcript: Transcript,
    pub input: TextInput,
    /// A chat request is in flight.
    pub sending: bool,
    /// Vertical scroll offset for the history panel.
    pub history_scroll: u16,
    pub wizard: SetupWizard,
    pub settings: Option<SettingsModal>,
    /// One-line notice in the chat status bar.
    pub status_note: Option<String>,
    pub backend_url: String,
    /// Spinner animation tick counter.
    pub spinner_tick: u8,
    /// Whether the user requested exit.
    pub should_quit: bool,
}

impl TuiApp {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            phase: Phase::Uninitialized,
            state: None,
            boot_failed: false,
            transcript: Transcript::new(),
            input: TextInput::new(),
            sending: false,
            history_scroll: 0,
            wizard: SetupWizard::new(),
            settings: None,
            status_note: None,
            backend_url: backend_url.into(),
            spinner_tick: 0,
            should_quit: false,
        }
    }

    pub fn view(&self) -> View {
        match &self.state {
            Some(state) if state.configured => View::Chat,
            Some(_) => View::Setup,
            None if self.boot_failed => View::BootError,
            None => View::Loading,
        }
    }

    pub fn chat_enabled(&self) -> bool {
        self.state.as_ref().is_some_and(SystemState::chat_enabled)
    }

    /// Whether anything is animating.
    pub fn is_busy(&self) -> bool {
        self.sending
            || self.phase == Phase::Loading
            || self.view() == View::Loading
            || self.wizard.busy
            || self.wizard.models_loading
            || self
                .settings
                .as_ref()
                .is_some_and(|m| m.saving || m.models_loading)
    }

    pub fn tick(&mut self) {
        self.spinner_tick = self.spinner_tick.wrapping_add(1);
    }

    /// Takes the controller's current phase and snapshot. Returns any load
    /// the newly visible screen needs.
    pub fn observe(&mut self, phase: Phase, state: Option<SystemState>) -> Command {
        if self.phase != phase {
            debug!(from = %self.phase, to = %phase, "Phase changed");
        }
        self.phase = phase;
        self.state = state;
        if self.view() == View::Setup {
            self.settings = None;
            return self.wizard.request_providers();
        }
        Command::None
    }

    // ── Input handling ───────────────────────────────────────

    /// Handle a keyboard event.
    pub fn handle_key(&mut self, key: KeyEvent) -> Command {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Command::None;
        }

        match self.view() {
            View::Loading => {
                if key.code == KeyCode::Esc {
                    self.should_quit = true;
                }
                Command::None
            }
            View::BootError => match key.code {
                KeyCode::Char('r') => {
                    self.boot_failed = false;
                    Command::Refresh
                }
                KeyCode::Esc | KeyCode::Char('q') => {
                    self.should_quit = true;
                    Command::None
                }
                _ => Command::None,
            },
            View::Setup => {
                if key.code == KeyCode::Esc
                    && self.wizard.step == setup::Step::Provider
                    && !self.wizard.busy
                {
                    self.should_quit = true;
                    return Command::None;
                }
                self.wizard.handle_key(key)
            }
            View::Chat => self.handle_chat_key(key),
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent) -> Command {
        if let Some(modal) = self.settings.as_mut() {
            return match modal.handle_key(key) {
                Outcome::Stay(command) => command,
                Outcome::Close => {
                    self.settings = None;
                    Command::None
                }
            };
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('s')) => self.open_settings(),
            (_, KeyCode::Esc) => {
                self.should_quit = true;
                Command::None
            }
            (_, KeyCode::Enter) => self.submit(),
            (_, KeyCode::Up) => {
                self.history_scroll = self.history_scroll.saturating_sub(1);
                Command::None
            }
            (_, KeyCode::Down) => {
                self.history_scroll = self.history_scroll.saturating_add(1);
                Command::None
            }
            (_, KeyCode::PageUp) => {
                self.history_scroll = self.history_scroll.saturating_sub(10);
                Command::None
            }
            (_, KeyCode::PageDown) => {
                self.history_scroll = self.history_scroll.saturating_add(10);
                Command::None
            }
            _ if self.chat_enabled() && !self.sending => {
                self.input.handle_key(key);
                Command::None
            }
            _ => Command::None,
        }
    }

    fn open_settings(&mut self) -> Command {
        let Some(state) = self.state.as_ref() else {
            return Command::None;
        };
        let Some(provider) = state.provider.clone() else {
            self.status_note = Some("No provider configured; reset to run setup again.".into());
            return Command::None;
        };
        let (modal, load) = SettingsModal::open(provider, state.model.clone());
        self.settings = Some(modal);
        load
    }

    fn submit(&mut self) -> Command {
        if !self.chat_enabled() {
            return self.open_settings();
        }
        if self.sending {
            return Command::None;
        }
        match prepare_send(self.state.as_ref(), self.input.value()) {
            Ok(request) => {
                let content = self.input.take();
                debug!(len = content.len(), model = %request.model_id, "Sending chat message");
                self.transcript.push_user(content);
                self.sending = true;
                self.status_note = None;
                self.scroll_to_bottom();
                Command::SendChat(request)
            }
            Err(BlockReason::EmptyMessage) => Command::None,
            Err(reason) => {
                debug!(?reason, "Send blocked");
                self.status_note = Some("No model selected. Open Settings with Ctrl+S.".into());
                Command::None
            }
        }
    }

    /// Applies a finished background task.
    pub fn apply(&mut self, action: Action) -> Command {
        match action {
            Action::Refreshed(Ok(phase)) => {
                self.boot_failed = false;
                debug!(phase = %phase, "Refresh finished");
                Command::None
            }
            Action::Refreshed(Err(err)) => {
                warn!(error = %err, "Status refresh failed");
                if self.state.is_none() {
                    self.boot_failed = true;
                } else {
                    self.status_note = Some("Could not reach backend, see log.".into());
                }
                Command::None
            }
            Action::ProvidersLoaded(result) => {
                self.wizard.on_providers(result);
                Command::None
            }
            Action::ModelsLoaded { provider, result } => {
                match self.settings.as_mut() {
                    Some(modal) => modal.on_models(&provider, result),
                    None => self.wizard.on_models(&provider, result),
                }
                Command::None
            }
            Action::ModelAdded { provider, result } => {
                self.wizard.on_model_added(&provider, result)
            }
            Action::SetupFinished(Ok(phase)) => {
                info!(phase = %phase, "Setup complete");
                self.wizard = SetupWizard::new();
                Command::None
            }
            Action::SetupFinished(Err(err)) => {
                self.wizard.on_setup_failed(&err);
                Command::None
            }
            Action::SettingsSaved(Ok(phase)) => {
                self.settings = None;
                self.status_note = (phase == Phase::ReadyLocked)
                    .then(|| "Credentials were not accepted; chat stays locked.".to_string());
                Command::None
            }
            Action::SettingsSaved(Err(err)) => {
                self.modal_failed("Saving", &err);
                Command::None
            }
            Action::ResetFinished(Ok(())) => {
                info!("Configuration reset from settings");
                self.settings = None;
                self.input.clear();
                self.wizard = SetupWizard::new();
                self.status_note = None;
                Command::None
            }
            Action::ResetFinished(Err(err)) => {
                self.modal_failed("Reset", &err);
                Command::None
            }
            Action::ChatReplied(result) => {
                match &result {
                    Ok(_) => self.status_note = None,
                    Err(err) => {
                        debug!(error = %err, "Chat reply was an error");
                        self.status_note = Some("Request failed, see log.".into());
                    }
                }
                self.transcript.apply_reply(&result);
                self.sending = false;
                self.scroll_to_bottom();
                Command::None
            }
        }
    }

    fn modal_failed(&mut self, what: &str, err: &proto::ApiError) {
        match self.settings.as_mut() {
            Some(modal) => modal.on_failed(what, err),
            None => warn!(error = %err, "{what} failed"),
        }
    }

    // ── Rendering ────────────────────────────────────────────

    /// Render the entire TUI into the given frame.
    pub fn render(&mut self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let spinner = spinner_frame(self.spinner_tick);
        match self.view() {
            View::Loading => boot::render_loading(frame, area, spinner, &self.backend_url),
            View::BootError => boot::render_error(frame, area, &self.backend_url),
            View::Setup => setup::render(&self.wizard, frame, area, spinner),
            View::Chat => {
                chat::render(self, frame, area);
                if let Some(modal) = &self.settings {
                    settings::render(modal, frame, area, spinner);
                }
            }
        }
    }

    /// Ensure scroll is at the bottom (for auto-scroll on new messages).
    pub fn scroll_to_bottom(&mut self) {
        // Set to a large value; chat::render clamps it to max_scroll.
        self.history_scroll = u16::MAX;
    }
}
