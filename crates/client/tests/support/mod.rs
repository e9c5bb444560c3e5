//! In-process fake of the chat backend, served over real HTTP.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use parking_lot::Mutex;
use proto::{
    Ack, AuthStatus, ChatRequest, ChatResponse, ModelInfo, NewModel, ProviderInfo, SetupRequest,
    SystemStatus, UpdateRequest,
};
use serde::Deserialize;
use serde_json::{Value, json};

pub const VALID_KEY: &str = "sk-valid";

type Reply<T> = Result<Json<T>, (StatusCode, Json<Value>)>;

#[derive(Debug, Clone)]
pub struct StoredConfig {
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    pub auth_ok: AuthStatus,
}

#[derive(Debug, Default)]
pub struct BackendState {
    pub config: Option<StoredConfig>,
    pub user_models: Vec<NewModel>,
    /// Every request as `"METHOD /path"`, in arrival order.
    pub calls: Vec<String>,
    /// Holds `/status` responses (snapshot taken before the delay).
    pub status_delay: Option<Duration>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    pub state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    pub fn configured(provider: &str, model: &str, api_key: &str, auth_ok: AuthStatus) -> Self {
        let backend = Self::default();
        backend.state.lock().config = Some(StoredConfig {
            provider: provider.to_string(),
            model: model.to_string(),
            api_key: Some(api_key.to_string()),
            auth_ok,
        });
        backend
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn set_status_delay(&self, delay: Duration) {
        self.state.lock().status_delay = Some(delay);
    }

    fn record(&self, call: &str) {
        self.state.lock().calls.push(call.to_string());
    }
}

fn detail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": message })))
}

fn builtin_models(provider: &str) -> Option<Vec<ModelInfo>> {
    let model = |id: &str, name: &str| ModelInfo {
        id: id.to_string(),
        name: name.to_string(),
    };
    match provider {
        "groq" => Some(vec![
            model("llama3", "LLaMA 3"),
            model("llama-3.1-70b-versatile", "LLaMA 3.1 (70B Versatile)"),
        ]),
        "openai" => Some(vec![
            model("gpt-4o-mini", "GPT-4o Mini"),
            model("gpt-4o", "GPT-4o"),
        ]),
        "local" | "custom-openai" => Some(Vec::new()),
        _ => None,
    }
}

fn all_models(state: &BackendState, provider: &str) -> Option<Vec<ModelInfo>> {
    let mut models = builtin_models(provider)?;
    models.extend(
        state
            .user_models
            .iter()
            .filter(|m| m.provider == provider)
            .map(|m| ModelInfo {
                id: m.id.clone(),
                name: m.name.clone(),
            }),
    );
    Some(models)
}

fn snapshot(state: &BackendState) -> SystemStatus {
    match &state.config {
        None => SystemStatus::default(),
        Some(cfg) => {
            let display_name = all_models(state, &cfg.provider)
                .unwrap_or_default()
                .into_iter()
                .find(|m| m.id == cfg.model)
                .map(|m| m.name)
                .unwrap_or_else(|| cfg.model.clone());
            SystemStatus {
                configured: true,
                provider: Some(cfg.provider.clone()),
                model: Some(cfg.model.clone()),
                display_name: Some(display_name),
                auth_ok: cfg.auth_ok,
                api_key_present: cfg.api_key.is_some(),
            }
        }
    }
}

async fn status(State(backend): State<FakeBackend>) -> Json<SystemStatus> {
    backend.record("GET /status");
    let (body, delay) = {
        let state = backend.state.lock();
        (snapshot(&state), state.status_delay)
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    Json(body)
}

async fn providers(State(backend): State<FakeBackend>) -> Json<Vec<ProviderInfo>> {
    backend.record("GET /providers");
    let provider = |id: &str, name: &str| ProviderInfo {
        id: id.to_string(),
        name: name.to_string(),
    };
    Json(vec![
        provider("groq", "Groq"),
        provider("openai", "OpenAI"),
        provider("local", "Local / Ollama"),
        provider("custom-openai", "Custom (OpenAI-compatible)"),
    ])
}

#[derive(Deserialize)]
struct ModelsQuery {
    provider: String,
}

async fn list_models(
    State(backend): State<FakeBackend>,
    Query(query): Query<ModelsQuery>,
) -> Reply<Vec<ModelInfo>> {
    backend.record("GET /models");
    let state = backend.state.lock();
    all_models(&state, &query.provider)
        .map(Json)
        .ok_or_else(|| detail(StatusCode::BAD_REQUEST, "Unknown provider"))
}

async fn add_model(State(backend): State<FakeBackend>, Json(model): Json<NewModel>) -> Reply<Ack> {
    backend.record("POST /models");
    let mut state = backend.state.lock();
    if builtin_models(&model.provider).is_none() {
        return Err(detail(StatusCode::BAD_REQUEST, "Unknown provider"));
    }
    state.user_models.push(model);
    Ok(Json(Ack { ok: true }))
}

async fn setup(State(backend): State<FakeBackend>, Json(req): Json<SetupRequest>) -> Json<Ack> {
    backend.record("POST /config/setup");
    backend.state.lock().config = Some(StoredConfig {
        provider: req.provider,
        model: req.model_id,
        api_key: req.api_key.map(|k| k.trim().to_string()),
        auth_ok: AuthStatus::Unknown,
    });
    Json(Ack { ok: true })
}

async fn update(State(backend): State<FakeBackend>, Json(req): Json<UpdateRequest>) -> Reply<Ack> {
    backend.record("POST /config/update");
    let mut state = backend.state.lock();
    let Some(cfg) = state.config.as_mut() else {
        return Err(detail(StatusCode::BAD_REQUEST, "System not configured"));
    };
    if let Some(model) = req.model_id {
        cfg.model = model;
    }
    if let Some(key) = req.api_key.filter(|k| !k.trim().is_empty()) {
        cfg.api_key = Some(key.trim().to_string());
        cfg.auth_ok = AuthStatus::Unknown;
    }
    Ok(Json(Ack { ok: true }))
}

async fn verify(State(backend): State<FakeBackend>) -> Reply<Ack> {
    backend.record("POST /config/verify");
    let mut state = backend.state.lock();
    let Some(cfg) = state.config.as_mut() else {
        return Err(detail(StatusCode::BAD_REQUEST, "System not configured"));
    };
    if cfg.api_key.as_deref() == Some(VALID_KEY) {
        cfg.auth_ok = AuthStatus::Verified;
        Ok(Json(Ack { ok: true }))
    } else {
        cfg.auth_ok = AuthStatus::Failed;
        Err(detail(
            StatusCode::UNAUTHORIZED,
            "Authentication failed or API key invalid",
        ))
    }
}

async fn reset(State(backend): State<FakeBackend>) -> Json<Ack> {
    backend.record("POST /config/reset");
    backend.state.lock().config = None;
    Json(Ack { ok: true })
}

async fn chat(State(backend): State<FakeBackend>, Json(req): Json<ChatRequest>) -> Reply<ChatResponse> {
    backend.record("POST /chat");
    let mut state = backend.state.lock();
    let Some(cfg) = state.config.as_mut() else {
        return Err(detail(
            StatusCode::BAD_REQUEST,
            "System not configured. Run setup first.",
        ));
    };
    let Some(last) = req.messages.last().filter(|m| !m.content.trim().is_empty()) else {
        return Err(detail(StatusCode::BAD_REQUEST, "Empty message"));
    };
    if req.model_id != cfg.model {
        return Err(detail(
            StatusCode::BAD_REQUEST,
            "Requested model does not match active model",
        ));
    }
    if cfg.api_key.as_deref() == Some(VALID_KEY) {
        cfg.auth_ok = AuthStatus::Verified;
        Ok(Json(ChatResponse {
            content: format!("echo: {}", last.content),
        }))
    } else {
        cfg.auth_ok = AuthStatus::Failed;
        Err(detail(
            StatusCode::UNAUTHORIZED,
            "Authentication failed or API key invalid",
        ))
    }
}

/// Serves `backend` on an ephemeral port and returns its base URL.
pub async fn spawn(backend: FakeBackend) -> String {
    let app = Router::new()
        .route("/status", get(status))
        .route("/providers", get(providers))
        .route("/models", get(list_models).post(add_model))
        .route("/config/setup", post(setup))
        .route("/config/update", post(update))
        .route("/config/verify", post(verify))
        .route("/config/reset", post(reset))
        .route("/chat", post(chat))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake backend serve");
    });
    format!("http://{addr}")
}
