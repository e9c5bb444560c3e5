//! Ephemeral chat transcript and the gated send path.

use proto::{ApiError, ChatRequest, ChatResponse, Message};
use tracing::debug;

use crate::api::ApiClient;
use crate::controller::ConfigController;
use crate::state::SystemState;

/// Assistant-side placeholder appended when a chat call fails.
pub const DISABLED_NOTICE: &str = "⚠️ Chat disabled due to authentication error.";

/// Ordered conversation for the current run. Entries are only ever appended.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> &Message {
        self.push(Message::user(content))
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) -> &Message {
        self.push(Message::assistant(content))
    }

    pub fn push_disabled_notice(&mut self) -> &Message {
        self.push(Message::assistant(DISABLED_NOTICE))
    }

    /// Appends exactly one assistant entry for the outcome of a chat call.
    pub fn apply_reply(&mut self, reply: &Result<ChatResponse, ApiError>) -> &Message {
        match reply {
            Ok(response) => self.push_assistant(response.content.clone()),
            Err(_) => self.push_disabled_notice(),
        }
    }

    fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        // just pushed
        &self.messages[self.messages.len() - 1]
    }
}

/// Why a send was refused before anything was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Nothing but whitespace was typed.
    EmptyMessage,
    /// Not configured or auth not verified.
    Locked,
    /// Configured state carries no active model id.
    NoModel,
}

/// Builds the chat request for `content` if gating allows a send.
pub fn prepare_send(state: Option<&SystemState>, content: &str) -> Result<ChatRequest, BlockReason> {
    if content.trim().is_empty() {
        return Err(BlockReason::EmptyMessage);
    }
    let state = match state {
        Some(state) if state.chat_enabled() => state,
        _ => return Err(BlockReason::Locked),
    };
    let model = state.model.as_deref().ok_or(BlockReason::NoModel)?;
    Ok(ChatRequest::single_turn(model, content))
}

/// Result of [`ChatSession::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing was appended.
    Blocked(BlockReason),
    /// User message and assistant reply appended.
    Replied,
    /// User message and the disabled notice appended.
    Failed(ApiError),
}

/// Transcript plus the clients needed to extend it.
pub struct ChatSession {
    api: ApiClient,
    controller: ConfigController,
    transcript: Transcript,
}

impl ChatSession {
    /// `api` should carry the controller as its resync handler so a failed
    /// send locks the view without polling.
    pub fn new(api: ApiClient, controller: ConfigController) -> Self {
        Self {
            api,
            controller,
            transcript: Transcript::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn controller(&self) -> &ConfigController {
        &self.controller
    }

    /// Sends `content` as a single-turn chat message.
    pub async fn send(&mut self, content: &str) -> SendOutcome {
        let request = match prepare_send(self.controller.state().as_ref(), content) {
            Ok(request) => request,
            Err(reason) => {
                debug!(?reason, "Send blocked");
                return SendOutcome::Blocked(reason);
            }
        };

        self.transcript.push_user(content);
        let reply = self.api.chat(&request).await;
        self.transcript.apply_reply(&reply);

        match reply {
            Ok(_) => SendOutcome::Replied,
            Err(err) => SendOutcome::Failed(err),
        }
    }
}
