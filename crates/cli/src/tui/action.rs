//! Elm Architecture (TEA) message and command types for the TUI.
//!
//! Key presses and finished background tasks are folded into [`TuiApp`]
//! state; any network work they require comes back out as a [`Command`],
//! which the event loop runs on a spawned task. The task's result returns as
//! an [`Action`].
//!
//! [`TuiApp`]: super::app::TuiApp

use client::Phase;
use proto::{
    ApiError, ChatRequest, ChatResponse, ModelInfo, NewModel, ProviderInfo, SetupRequest,
    UpdateRequest,
};

/// Results of background tasks, applied by `TuiApp::apply()`.
#[derive(Debug)]
pub enum Action {
    /// A status refresh finished (boot or retry).
    Refreshed(Result<Phase, ApiError>),
    /// Provider list for the setup wizard.
    ProvidersLoaded(Result<Vec<ProviderInfo>, ApiError>),
    /// Model list for `provider`.
    ModelsLoaded {
        provider: String,
        result: Result<Vec<ModelInfo>, ApiError>,
    },
    /// A custom model registration finished.
    ModelAdded {
        provider: String,
        result: Result<(), ApiError>,
    },
    /// Initial configuration submitted and refreshed.
    SetupFinished(Result<Phase, ApiError>),
    /// Settings update, verification and refresh finished.
    SettingsSaved(Result<Phase, ApiError>),
    /// Backend configuration cleared.
    ResetFinished(Result<(), ApiError>),
    /// Reply (or failure) for the outstanding chat message.
    ChatReplied(Result<ChatResponse, ApiError>),
}

/// Side effects returned by `TuiApp`. The event loop runs these
/// asynchronously and feeds the outcome back as an [`Action`].
#[derive(Debug, PartialEq)]
pub enum Command {
    /// No side effect.
    None,
    /// Re-fetch `/status` through the controller.
    Refresh,
    LoadProviders,
    LoadModels(String),
    AddModel(NewModel),
    Setup(SetupRequest),
    SaveSettings(UpdateRequest),
    Reset,
    /// Send one chat message; failures resync the controller.
    SendChat(ChatRequest),
}
