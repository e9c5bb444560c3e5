//! Client-side view of the backend's configuration/auth status.

use proto::{AuthStatus, SystemStatus};

/// Snapshot of the backend's configuration as last fetched.
///
/// Always replaced as a whole; fields are never patched individually.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemState {
    pub configured: bool,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub display_name: Option<String>,
    pub auth: AuthStatus,
    pub api_key_present: bool,
}

impl From<SystemStatus> for SystemState {
    fn from(status: SystemStatus) -> Self {
        Self {
            configured: status.configured,
            provider: status.provider,
            model: status.model,
            display_name: status.display_name,
            auth: status.auth_ok,
            api_key_present: status.api_key_present,
        }
    }
}

impl SystemState {
    /// The "nothing known" snapshot: unconfigured, auth unknown.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Chat is permitted only when configured and the last auth check passed.
    pub fn chat_enabled(&self) -> bool {
        self.configured && self.auth == AuthStatus::Verified
    }

    /// Stable phase this snapshot resolves to.
    pub fn phase(&self) -> Phase {
        if !self.configured {
            Phase::SetupRequired
        } else if self.chat_enabled() {
            Phase::ReadyUnlocked
        } else {
            Phase::ReadyLocked
        }
    }

    /// Human-facing model label: display name, falling back to the model id.
    pub fn model_label(&self) -> Option<&str> {
        self.display_name.as_deref().or(self.model.as_deref())
    }
}

/// Client-observable configuration phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No status has been fetched yet.
    Uninitialized,
    /// The latest status fetch is outstanding.
    Loading,
    /// Backend is not configured; only the setup flow may be shown.
    SetupRequired,
    /// Configured, but the last auth check did not pass.
    ReadyLocked,
    /// Configured and verified; chat is enabled.
    ReadyUnlocked,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::SetupRequired => "setup_required",
            Self::ReadyLocked => "ready_locked",
            Self::ReadyUnlocked => "ready_unlocked",
        }
    }

    /// Whether the chat view (locked or not) may be shown.
    pub fn is_ready(self) -> bool {
        matches!(self, Self::ReadyLocked | Self::ReadyUnlocked)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
