//! JSON-over-HTTP client for the local chat backend.

use std::sync::Arc;

use async_trait::async_trait;
use proto::{
    Ack, ApiError, ChatRequest, ChatResponse, ModelInfo, NewModel, ProviderInfo, SetupRequest,
    SystemStatus, UpdateRequest,
};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Backend address used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Hook invoked after a failed chat call so the owner of the system state
/// can pull fresh auth status from the backend.
#[async_trait]
pub trait AuthSync: Send + Sync {
    async fn resync(&self) -> Result<(), ApiError>;
}

/// Thin request wrapper over the backend's HTTP contract.
///
/// Every call is at-most-once: no retries, no backoff, transport-default
/// timeouts.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth_sync: Option<Arc<dyn AuthSync>>,
}

impl ApiClient {
    /// Creates a client for `base_url` with no resync handler.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            auth_sync: None,
        }
    }

    /// Returns a copy of this client that runs `handler` after every failed
    /// chat call, before the error is handed back.
    pub fn with_auth_sync(mut self, handler: Arc<dyn AuthSync>) -> Self {
        self.auth_sync = Some(handler);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a prepared request and decodes a JSON success body.
    ///
    /// Non-2xx statuses become [`ApiError::Request`] carrying the body text.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = builder
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            debug!(status = %status, body_len = text.len(), "Backend returned an error status");
            return Err(ApiError::request(status.as_u16(), text));
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(path, "GET");
        self.send(self.http.get(self.url(path))).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(path, "POST");
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(path, "POST");
        self.send(self.http.post(self.url(path))).await
    }

    // ── System ───────────────────────────────────────────────

    pub async fn status(&self) -> Result<SystemStatus, ApiError> {
        self.get("/status").await
    }

    // ── Providers / models ───────────────────────────────────

    pub async fn providers(&self) -> Result<Vec<ProviderInfo>, ApiError> {
        self.get("/providers").await
    }

    pub async fn models(&self, provider: &str) -> Result<Vec<ModelInfo>, ApiError> {
        debug!(provider, "GET /models");
        self.send(
            self.http
                .get(self.url("/models"))
                .query(&[("provider", provider)]),
        )
        .await
    }

    /// Registers a user-defined model (local runtimes, OpenAI-compatible endpoints).
    pub async fn add_model(&self, model: &NewModel) -> Result<Ack, ApiError> {
        self.post_json("/models", model).await
    }

    // ── Config ───────────────────────────────────────────────

    pub async fn setup(&self, request: &SetupRequest) -> Result<Ack, ApiError> {
        self.post_json("/config/setup", request).await
    }

    pub async fn update_config(&self, request: &UpdateRequest) -> Result<Ack, ApiError> {
        self.post_json("/config/update", request).await
    }

    pub async fn verify(&self) -> Result<Ack, ApiError> {
        self.post_empty("/config/verify").await
    }

    pub async fn reset(&self) -> Result<Ack, ApiError> {
        self.post_empty("/config/reset").await
    }

    // ── Chat ─────────────────────────────────────────────────

    /// Sends one chat turn.
    ///
    /// On failure the resync handler (if any) is awaited exactly once before
    /// the original error is returned. A failing handler is logged and does
    /// not replace the chat error.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        match self.post_json("/chat", request).await {
            Ok(reply) => Ok(reply),
            Err(err) => {
                warn!(
                    error = %err,
                    auth_failure = err.is_auth_failure(),
                    "Chat request failed"
                );
                if let Some(handler) = &self.auth_sync
                    && let Err(sync_err) = handler.resync().await
                {
                    warn!(error = %sync_err, "Auth resync after failed chat call also failed");
                }
                Err(err)
            }
        }
    }
}
