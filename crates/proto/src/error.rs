use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Backend request error.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration loading/validation error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Rejected user input.
    #[error("Input error: {0}")]
    Input(#[from] InputError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Backend request errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Backend answered with a non-success status. `body` is the response
    /// text, or a generic message when the body was empty.
    #[error("{body}")]
    Request { status: u16, body: String },

    /// Network/connection-level failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Success status, but the body did not match the expected shape.
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Builds a request error, substituting a generic message for an empty body.
    pub fn request(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let body = if body.trim().is_empty() {
            format!("Request failed: {status}")
        } else {
            body
        };
        Self::Request { status, body }
    }

    /// HTTP status for `Request` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected credentials (401/403).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field has an invalid value and reason.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Filesystem read error.
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(String),
}

/// Setup wizard / settings form validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// A required field was left blank.
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// API keys are single tokens.
    #[error("API key must not contain whitespace")]
    WhitespaceInKey,

    /// Base URLs must be absolute http(s) URLs.
    #[error("Base URL must start with http:// or https://")]
    InvalidBaseUrl,
}
