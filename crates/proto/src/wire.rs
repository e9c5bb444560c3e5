//! Request/response bodies exchanged with the local chat backend.

use serde::{Deserialize, Deserializer, Serialize};

use crate::message::Role;

/// Result of the backend's most recent credential check.
///
/// On the wire this is the nullable boolean `auth_ok`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum AuthStatus {
    /// Not verified since the key was last set.
    #[default]
    Unknown,
    /// Last check succeeded.
    Verified,
    /// Last check was rejected.
    Failed,
}

impl From<Option<bool>> for AuthStatus {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Unknown,
            Some(true) => Self::Verified,
            Some(false) => Self::Failed,
        }
    }
}

impl From<AuthStatus> for Option<bool> {
    fn from(value: AuthStatus) -> Self {
        match value {
            AuthStatus::Unknown => None,
            AuthStatus::Verified => Some(true),
            AuthStatus::Failed => Some(false),
        }
    }
}

impl AuthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Verified => "verified",
            Self::Failed => "failed",
        }
    }
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// `GET /status` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub configured: bool,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub auth_ok: AuthStatus,
    #[serde(default, deserialize_with = "null_as_false")]
    pub api_key_present: bool,
}

/// One entry of `GET /providers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
}

/// One entry of `GET /models?provider=<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

/// `POST /models` body: registers a user-defined model for a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewModel {
    pub provider: String,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// `POST /config/setup` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupRequest {
    pub provider: String,
    pub model_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// `POST /config/update` body. Omitted fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl UpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.model_id.is_none() && self.api_key.is_none()
    }
}

/// One `{role, content}` pair inside a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// `POST /chat` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model_id: String,
    pub messages: Vec<ChatTurn>,
}

impl ChatRequest {
    /// Single-turn request carrying only the latest user message.
    pub fn single_turn(model_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            messages: vec![ChatTurn {
                role: Role::User,
                content: content.into(),
            }],
        }
    }
}

/// `POST /chat` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
}

/// `{ok: true}` acknowledgement returned by the mutating endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}
