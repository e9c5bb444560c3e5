//! First-run setup wizard: provider, then model, then API key.

use crossterm::event::{KeyCode, KeyEvent};
use proto::{ApiError, InputError, ModelInfo, NewModel, ProviderInfo, SetupRequest};
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tracing::{debug, warn};

use super::action::Command;
use super::input::TextInput;
use super::theme::THEME;

/// Providers whose backend calls need a credential.
const KEY_REQUIRED_PROVIDERS: &[&str] = &["groq", "openai", "huggingface", "custom-openai"];
/// Providers without a fixed catalog; the user registers models.
const CUSTOM_MODEL_PROVIDERS: &[&str] = &["local", "custom-openai"];

pub fn requires_api_key(provider: &str) -> bool {
    KEY_REQUIRED_PROVIDERS.contains(&provider)
}

pub fn accepts_custom_models(provider: &str) -> bool {
    CUSTOM_MODEL_PROVIDERS.contains(&provider)
}

/// Trims `raw`. A blank key is `Ok(None)` unless `required`.
pub fn normalize_api_key(raw: &str, required: bool) -> Result<Option<String>, InputError> {
    let key = raw.trim();
    if key.is_empty() {
        return if required {
            Err(InputError::Empty("API key"))
        } else {
            Ok(None)
        };
    }
    if key.chars().any(char::is_whitespace) {
        return Err(InputError::WhitespaceInKey);
    }
    Ok(Some(key.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Provider,
    Model,
    AddModel,
    ApiKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Id,
    Name,
    BaseUrl,
}

/// "Add model" form for providers in [`CUSTOM_MODEL_PROVIDERS`].
#[derive(Debug, Clone, Default)]
pub struct ModelForm {
    pub id: TextInput,
    pub name: TextInput,
    pub base_url: TextInput,
    pub focus: FormField,
}

impl ModelForm {
    fn fields(provider: &str) -> &'static [FormField] {
        if provider == "custom-openai" {
            &[FormField::Id, FormField::Name, FormField::BaseUrl]
        } else {
            &[FormField::Id, FormField::Name]
        }
    }

    fn focus_next(&mut self, provider: &str) {
        let fields = Self::fields(provider);
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(pos + 1) % fields.len()];
    }

    fn focused_mut(&mut self) -> &mut TextInput {
        match self.focus {
            FormField::Id => &mut self.id,
            FormField::Name => &mut self.name,
            FormField::BaseUrl => &mut self.base_url,
        }
    }

    /// Validates the form into a registration request for `provider`.
    pub fn build(&self, provider: &str) -> Result<NewModel, InputError> {
        let id = self.id.value().trim();
        if id.is_empty() {
            return Err(InputError::Empty("Model ID"));
        }
        let name = self.name.value().trim();
        if name.is_empty() {
            return Err(InputError::Empty("Display name"));
        }
        let base_url = if provider == "custom-openai" {
            let url = self.base_url.value().trim();
            if url.is_empty() {
                return Err(InputError::Empty("Base URL"));
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(InputError::InvalidBaseUrl);
            }
            Some(url.to_string())
        } else {
            None
        };
        Ok(NewModel {
            provider: provider.to_string(),
            id: id.to_string(),
            name: name.to_string(),
            base_url,
        })
    }
}

/// Wizard state. Lives until setup succeeds or the app resets it.
#[derive(Debug)]
pub struct SetupWizard {
    pub step: Step,
    pub providers: Vec<ProviderInfo>,
    pub provider_cursor: usize,
    providers_requested: bool,
    pub models: Vec<ModelInfo>,
    pub model_cursor: usize,
    pub models_loading: bool,
    pub form: ModelForm,
    pub api_key: TextInput,
    /// A model registration or the setup submission is in flight.
    pub busy: bool,
    pub notice: Option<String>,
}

impl Default for SetupWizard {
    fn default() -> Self {
        Self {
            step: Step::Provider,
            providers: Vec::new(),
            provider_cursor: 0,
            providers_requested: false,
            models: Vec::new(),
            model_cursor: 0,
            models_loading: false,
            form: ModelForm::default(),
            api_key: TextInput::new(),
            busy: false,
            notice: None,
        }
    }
}

impl SetupWizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the provider list as requested; returns the load command once.
    pub fn request_providers(&mut self) -> Command {
        if self.providers_requested {
            return Command::None;
        }
        self.providers_requested = true;
        Command::LoadProviders
    }

    pub fn selected_provider(&self) -> Option<&ProviderInfo> {
        match self.step {
            Step::Provider => None,
            _ => self.providers.get(self.provider_cursor),
        }
    }

    pub fn selected_model(&self) -> Option<&ModelInfo> {
        match self.step {
            Step::ApiKey => self.models.get(self.model_cursor),
            _ => None,
        }
    }

    fn provider_id(&self) -> Option<String> {
        self.providers.get(self.provider_cursor).map(|p| p.id.clone())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Command {
        if self.busy {
            return Command::None;
        }
        let Some(provider) = self.provider_id() else {
            // Nothing to pick yet; only a retry makes sense.
            if key.code == KeyCode::Char('r') {
                self.providers_requested = false;
                self.notice = None;
                return self.request_providers();
            }
            return Command::None;
        };

        match self.step {
            Step::Provider => match key.code {
                KeyCode::Up => {
                    self.provider_cursor = self.provider_cursor.saturating_sub(1);
                    Command::None
                }
                KeyCode::Down => {
                    if self.provider_cursor + 1 < self.providers.len() {
                        self.provider_cursor += 1;
                    }
                    Command::None
                }
                KeyCode::Enter => {
                    self.notice = None;
                    self.models.clear();
                    self.model_cursor = 0;
                    self.models_loading = true;
                    self.step = Step::Model;
                    debug!(provider = %provider, "Provider selected");
                    Command::LoadModels(provider)
                }
                _ => Command::None,
            },
            Step::Model => match key.code {
                KeyCode::Esc => {
                    self.step = Step::Provider;
                    self.notice = None;
                    Command::None
                }
                KeyCode::Up => {
                    self.model_cursor = self.model_cursor.saturating_sub(1);
                    Command::None
                }
                KeyCode::Down => {
                    if self.model_cursor + 1 < self.models.len() {
                        self.model_cursor += 1;
                    }
                    Command::None
                }
                KeyCode::Char('a') if accepts_custom_models(&provider) => {
                    self.open_form();
                    Command::None
                }
                KeyCode::Enter if !self.models_loading => {
                    if !self.models.is_empty() {
                        self.notice = None;
                        self.api_key.clear();
                        self.step = Step::ApiKey;
                    } else if accepts_custom_models(&provider) {
                        self.open_form();
                    } else {
                        self.notice = Some("No models available for this provider.".into());
                    }
                    Command::None
                }
                _ => Command::None,
            },
            Step::AddModel => match key.code {
                KeyCode::Esc => {
                    self.step = Step::Model;
                    self.notice = None;
                    Command::None
                }
                KeyCode::Tab => {
                    self.form.focus_next(&provider);
                    Command::None
                }
                KeyCode::Enter => match self.form.build(&provider) {
                    Ok(model) => {
                        self.notice = None;
                        self.busy = true;
                        Command::AddModel(model)
                    }
                    Err(err) => {
                        self.notice = Some(err.to_string());
                        Command::None
                    }
                },
                _ => {
                    self.form.focused_mut().handle_key(key);
                    Command::None
                }
            },
            Step::ApiKey => match key.code {
                KeyCode::Esc => {
                    self.step = Step::Model;
                    self.notice = None;
                    Command::None
                }
                KeyCode::Enter => self.submit(provider),
                _ => {
                    self.api_key.handle_key(key);
                    Command::None
                }
            },
        }
    }

    fn open_form(&mut self) {
        self.form = ModelForm::default();
        self.notice = None;
        self.step = Step::AddModel;
    }

    fn submit(&mut self, provider: String) -> Command {
        let Some(model) = self.models.get(self.model_cursor) else {
            self.step = Step::Model;
            return Command::None;
        };
        match normalize_api_key(self.api_key.value(), requires_api_key(&provider)) {
            Ok(api_key) => {
                self.notice = None;
                self.busy = true;
                Command::Setup(SetupRequest {
                    provider,
                    model_id: model.id.clone(),
                    api_key,
                })
            }
            Err(err) => {
                self.notice = Some(err.to_string());
                Command::None
            }
        }
    }

    pub fn on_providers(&mut self, result: Result<Vec<ProviderInfo>, ApiError>) {
        match result {
            Ok(providers) => {
                debug!(count = providers.len(), "Providers loaded");
                self.providers = providers;
                self.provider_cursor = 0;
                if self.providers.is_empty() {
                    self.notice = Some("Backend offers no providers. Press r to retry.".into());
                }
            }
            Err(err) => {
                warn!(error = %err, "Failed to load providers");
                self.providers.clear();
                self.notice = Some("Could not load providers. Press r to retry.".into());
            }
        }
    }

    pub fn on_models(&mut self, provider: &str, result: Result<Vec<ModelInfo>, ApiError>) {
        if self.selected_provider().map(|p| p.id.as_str()) != Some(provider) {
            debug!(provider, "Ignoring model list for deselected provider");
            return;
        }
        self.models_loading = false;
        match result {
            Ok(models) => {
                self.model_cursor = 0;
                self.models = models;
                if self.models.is_empty() && accepts_custom_models(provider) {
                    self.notice = Some("No models yet. Press a to add one.".into());
                }
            }
            Err(err) => {
                warn!(provider, error = %err, "Failed to load models");
                self.models.clear();
                self.notice = Some("Could not load models, see log.".into());
            }
        }
    }

    pub fn on_model_added(&mut self, provider: &str, result: Result<(), ApiError>) -> Command {
        self.busy = false;
        match result {
            Ok(()) => {
                self.form = ModelForm::default();
                self.step = Step::Model;
                self.models_loading = true;
                self.notice = None;
                Command::LoadModels(provider.to_string())
            }
            Err(err) => {
                warn!(provider, error = %err, "Failed to register model");
                self.notice = Some("Could not add model, see log.".into());
                Command::None
            }
        }
    }

    pub fn on_setup_failed(&mut self, err: &ApiError) {
        warn!(error = %err, "Setup failed");
        self.busy = false;
        self.notice = Some("Setup failed, see log.".into());
    }
}

fn pick_list<'a>(items: impl Iterator<Item = &'a str>, cursor: usize, active: bool) -> Vec<Line<'a>> {
    items
        .enumerate()
        .map(|(i, name)| {
            if i == cursor && active {
                Line::from(vec![
                    Span::styled(" › ", Style::default().fg(THEME.selected_marker)),
                    Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
                ])
            } else {
                Line::from(Span::styled(
                    format!("   {name}"),
                    Style::default().fg(THEME.fg_dim),
                ))
            }
        })
        .collect()
}

fn field_line<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let label_style = if focused {
        Style::default().fg(THEME.accent_bright)
    } else {
        Style::default().fg(THEME.fg_muted)
    };
    Line::from(vec![
        Span::styled(format!(" {label:<14}"), label_style),
        Span::raw(value),
    ])
}

/// Renders the wizard centered in `area`.
pub fn render(wizard: &SetupWizard, frame: &mut Frame<'_>, area: Rect, spinner: char) {
    let [column] = Layout::horizontal([Constraint::Length(64)])
        .flex(Flex::Center)
        .areas(area);
    let [card] = Layout::vertical([Constraint::Length(20)])
        .flex(Flex::Center)
        .areas(column);

    let (step_no, heading) = match wizard.step {
        Step::Provider => (1, "Choose a provider"),
        Step::Model => (2, "Choose a model"),
        Step::AddModel => (2, "Add a model"),
        Step::ApiKey => (3, "API key"),
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!(" Step {step_no} of 3 · {heading}"),
            Style::default().fg(THEME.fg).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if let Some(provider) = wizard.selected_provider() {
        lines.push(field_line("Provider", provider.name.clone(), false));
    }
    if let Some(model) = wizard.selected_model() {
        lines.push(field_line("Model", model.name.clone(), false));
    }
    if wizard.step != Step::Provider {
        lines.push(Line::from(""));
    }

    let provider_id = wizard
        .providers
        .get(wizard.provider_cursor)
        .map(|p| p.id.as_str())
        .unwrap_or_default();

    match wizard.step {
        Step::Provider if wizard.providers.is_empty() && wizard.notice.is_none() => {
            lines.push(Line::from(Span::styled(
                format!(" {spinner} Loading providers..."),
                Style::default().fg(THEME.status_spinner),
            )));
        }
        Step::Provider => {
            lines.extend(pick_list(
                wizard.providers.iter().map(|p| p.name.as_str()),
                wizard.provider_cursor,
                true,
            ));
        }
        Step::Model if wizard.models_loading => {
            lines.push(Line::from(Span::styled(
                format!(" {spinner} Loading models..."),
                Style::default().fg(THEME.status_spinner),
            )));
        }
        Step::Model => {
            lines.extend(pick_list(
                wizard.models.iter().map(|m| m.name.as_str()),
                wizard.model_cursor,
                true,
            ));
        }
        Step::AddModel => {
            let form = &wizard.form;
            lines.push(field_line(
                "Model ID",
                form.id.value().to_string(),
                form.focus == FormField::Id,
            ));
            lines.push(field_line(
                "Display name",
                form.name.value().to_string(),
                form.focus == FormField::Name,
            ));
            if provider_id == "custom-openai" {
                lines.push(field_line(
                    "Base URL",
                    form.base_url.value().to_string(),
                    form.focus == FormField::BaseUrl,
                ));
            }
        }
        Step::ApiKey => {
            let label = if requires_api_key(provider_id) {
                "API key"
            } else {
                "API key (opt.)"
            };
            lines.push(field_line(label, wizard.api_key.masked(), true));
            lines.push(Line::from(Span::styled(
                "   Stored by the backend only.",
                Style::default().fg(THEME.fg_muted),
            )));
        }
    }

    lines.push(Line::from(""));
    if wizard.busy {
        lines.push(Line::from(Span::styled(
            format!(" {spinner} Saving..."),
            Style::default().fg(THEME.status_spinner),
        )));
    } else if let Some(notice) = &wizard.notice {
        lines.push(Line::from(Span::styled(
            format!(" {notice}"),
            Style::default().fg(THEME.warning),
        )));
    }

    let hint = match wizard.step {
        Step::Provider => " ↑↓ select  Enter next  Esc quit",
        Step::Model if accepts_custom_models(provider_id) => {
            " ↑↓ select  Enter next  a add model  Esc back"
        }
        Step::Model => " ↑↓ select  Enter next  Esc back",
        Step::AddModel => " Tab next field  Enter add  Esc back",
        Step::ApiKey => " Enter finish setup  Esc back",
    };
    lines.push(Line::from(Span::styled(
        hint,
        Style::default().fg(THEME.status_hint),
    )));

    let card_widget = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(THEME.border_active))
                .title(Span::styled(
                    " pxchat setup ",
                    Style::default().fg(THEME.logo).add_modifier(Modifier::BOLD),
                )),
        );
    frame.render_widget(card_widget, card);

    // Cursor sits inside the block border, after the 15-column label.
    let cursor = match wizard.step {
        Step::ApiKey => Some((wizard.api_key.masked_cursor_col(), 0)),
        Step::AddModel => {
            let form = &wizard.form;
            Some(match form.focus {
                FormField::Id => (form.id.cursor_col(), 0),
                FormField::Name => (form.name.cursor_col(), 1),
                FormField::BaseUrl => (form.base_url.cursor_col(), 2),
            })
        }
        _ => None,
    };
    if let Some((col, row)) = cursor
        && !wizard.busy
    {
        // heading, blank, provider, [model], blank
        let first_field_row = if wizard.step == Step::ApiKey { 5 } else { 4 };
        frame.set_cursor_position((card.x + 1 + 15 + col, card.y + 1 + first_field_row + row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(wizard: &mut SetupWizard, text: &str) {
        for c in text.chars() {
            wizard.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn provider(id: &str) -> ProviderInfo {
        ProviderInfo {
            id: id.into(),
            name: id.to_uppercase(),
        }
    }

    fn model(id: &str) -> ModelInfo {
        ModelInfo {
            id: id.into(),
            name: id.into(),
        }
    }

    fn wizard_with(providers: &[&str]) -> SetupWizard {
        let mut wizard = SetupWizard::new();
        assert_eq!(wizard.request_providers(), Command::LoadProviders);
        wizard.on_providers(Ok(providers.iter().map(|p| provider(p)).collect()));
        wizard
    }

    #[test]
    fn api_key_normalization() {
        assert_eq!(
            normalize_api_key("  sk-abc \n", true),
            Ok(Some("sk-abc".to_string()))
        );
        assert_eq!(normalize_api_key("   ", false), Ok(None));
        assert_eq!(
            normalize_api_key("", true),
            Err(InputError::Empty("API key"))
        );
        assert_eq!(
            normalize_api_key("sk abc", true),
            Err(InputError::WhitespaceInKey)
        );
    }

    #[test]
    fn provider_tables() {
        assert!(requires_api_key("groq"));
        assert!(requires_api_key("custom-openai"));
        assert!(!requires_api_key("local"));
        assert!(accepts_custom_models("local"));
        assert!(!accepts_custom_models("openai"));
    }

    #[test]
    fn providers_are_requested_once() {
        let mut wizard = SetupWizard::new();
        assert_eq!(wizard.request_providers(), Command::LoadProviders);
        assert_eq!(wizard.request_providers(), Command::None);
    }

    #[test]
    fn full_walkthrough_produces_setup_request() {
        let mut wizard = wizard_with(&["groq", "openai"]);

        assert_eq!(
            wizard.handle_key(key(KeyCode::Enter)),
            Command::LoadModels("groq".into())
        );
        assert_eq!(wizard.step, Step::Model);
        wizard.on_models("groq", Ok(vec![model("llama3"), model("mixtral")]));
        wizard.handle_key(key(KeyCode::Down));
        wizard.handle_key(key(KeyCode::Enter));
        assert_eq!(wizard.step, Step::ApiKey);

        type_text(&mut wizard, " sk-x ");
        let command = wizard.handle_key(key(KeyCode::Enter));
        assert_eq!(
            command,
            Command::Setup(SetupRequest {
                provider: "groq".into(),
                model_id: "mixtral".into(),
                api_key: Some("sk-x".into()),
            })
        );
        assert!(wizard.busy);
        assert_eq!(wizard.handle_key(key(KeyCode::Esc)), Command::None);
        assert_eq!(wizard.step, Step::ApiKey);
    }

    #[test]
    fn required_key_blocks_submit() {
        let mut wizard = wizard_with(&["openai"]);
        wizard.handle_key(key(KeyCode::Enter));
        wizard.on_models("openai", Ok(vec![model("gpt-4o")]));
        wizard.handle_key(key(KeyCode::Enter));

        assert_eq!(wizard.handle_key(key(KeyCode::Enter)), Command::None);
        assert_eq!(wizard.notice.as_deref(), Some("API key cannot be empty"));
        assert!(!wizard.busy);
    }

    #[test]
    fn local_provider_submits_without_key() {
        let mut wizard = wizard_with(&["local"]);
        wizard.handle_key(key(KeyCode::Enter));
        wizard.on_models("local", Ok(vec![model("mistral")]));
        wizard.handle_key(key(KeyCode::Enter));

        match wizard.handle_key(key(KeyCode::Enter)) {
            Command::Setup(request) => assert_eq!(request.api_key, None),
            other => panic!("expected setup, got {other:?}"),
        }
    }

    #[test]
    fn add_model_form_round_trip() {
        let mut wizard = wizard_with(&["custom-openai"]);
        wizard.handle_key(key(KeyCode::Enter));
        wizard.on_models("custom-openai", Ok(Vec::new()));
        assert!(wizard.notice.is_some());

        wizard.handle_key(key(KeyCode::Enter));
        assert_eq!(wizard.step, Step::AddModel);
        type_text(&mut wizard, "deepseek-chat");
        wizard.handle_key(key(KeyCode::Tab));
        type_text(&mut wizard, "DeepSeek");
        wizard.handle_key(key(KeyCode::Tab));
        type_text(&mut wizard, "api.deepseek.com");
        assert_eq!(wizard.handle_key(key(KeyCode::Enter)), Command::None);
        assert_eq!(
            wizard.notice.as_deref(),
            Some("Base URL must start with http:// or https://")
        );

        for _ in 0.."api.deepseek.com".len() {
            wizard.handle_key(key(KeyCode::Backspace));
        }
        type_text(&mut wizard, "https://api.deepseek.com/v1");
        let command = wizard.handle_key(key(KeyCode::Enter));
        assert_eq!(
            command,
            Command::AddModel(NewModel {
                provider: "custom-openai".into(),
                id: "deepseek-chat".into(),
                name: "DeepSeek".into(),
                base_url: Some("https://api.deepseek.com/v1".into()),
            })
        );

        let reload = wizard.on_model_added("custom-openai", Ok(()));
        assert_eq!(reload, Command::LoadModels("custom-openai".into()));
        assert_eq!(wizard.step, Step::Model);
        assert!(wizard.models_loading);
    }

    #[test]
    fn stale_model_list_is_ignored() {
        let mut wizard = wizard_with(&["groq", "openai"]);
        wizard.handle_key(key(KeyCode::Enter));
        wizard.on_models("openai", Ok(vec![model("gpt-4o")]));
        assert!(wizard.models.is_empty());
        assert!(wizard.models_loading);
    }

    #[test]
    fn provider_load_failure_offers_retry() {
        let mut wizard = SetupWizard::new();
        wizard.request_providers();
        wizard.on_providers(Err(ApiError::Transport("refused".into())));
        assert!(wizard.notice.is_some());
        assert_eq!(
            wizard.handle_key(key(KeyCode::Char('r'))),
            Command::LoadProviders
        );
    }
}
