mod support;

use std::time::Duration;

use client::{ApiClient, ConfigController, Phase};
use proto::{ApiError, AuthStatus, NewModel, SetupRequest, UpdateRequest};
use support::{FakeBackend, VALID_KEY};

async fn controller_for(backend: &FakeBackend) -> ConfigController {
    let url = support::spawn(backend.clone()).await;
    ConfigController::new(ApiClient::new(url))
}

#[tokio::test]
async fn boot_refresh_on_fresh_backend_requires_setup() {
    let backend = FakeBackend::default();
    let ctl = controller_for(&backend).await;

    let phase = ctl.refresh().await.expect("status fetch");

    assert_eq!(phase, Phase::SetupRequired);
    assert!(!ctl.chat_enabled());
    assert!(!ctl.state().expect("state applied").configured);
}

#[tokio::test]
async fn setup_then_refresh_round_trips_configuration() {
    let backend = FakeBackend::default();
    let ctl = controller_for(&backend).await;
    ctl.refresh().await.expect("boot refresh");

    ctl.setup(SetupRequest {
        provider: "groq".to_string(),
        model_id: "llama3".to_string(),
        api_key: Some("sk-x".to_string()),
    })
    .await
    .expect("setup");
    ctl.refresh().await.expect("refresh");

    let state = ctl.state().expect("state applied");
    assert!(state.configured);
    assert_eq!(state.model.as_deref(), Some("llama3"));
    assert_eq!(state.display_name.as_deref(), Some("LLaMA 3"));
    assert!(state.api_key_present);
    // Setup alone never implies verified credentials.
    assert_eq!(state.auth, AuthStatus::Unknown);
    assert_eq!(ctl.phase(), Phase::ReadyLocked);
    assert_eq!(
        backend.calls(),
        vec![
            "GET /status",
            "POST /config/setup",
            "GET /status",
            "GET /status"
        ]
    );
}

#[tokio::test]
async fn update_with_rejected_key_still_refreshes_and_locks() {
    let backend = FakeBackend::configured("groq", "llama3", VALID_KEY, AuthStatus::Verified);
    let ctl = controller_for(&backend).await;
    assert_eq!(ctl.refresh().await.expect("boot"), Phase::ReadyUnlocked);

    let phase = ctl
        .update_config(UpdateRequest {
            model_id: None,
            api_key: Some("sk-revoked".to_string()),
        })
        .await
        .expect("update succeeds even though verification fails");

    assert_eq!(phase, Phase::ReadyLocked);
    let state = ctl.state().expect("state");
    assert_eq!(state.auth, AuthStatus::Failed);
    assert!(!ctl.chat_enabled());
    assert_eq!(
        backend.calls(),
        vec![
            "GET /status",
            "POST /config/update",
            "POST /config/verify",
            "GET /status"
        ]
    );
}

#[tokio::test]
async fn update_with_valid_key_unlocks_locked_chat() {
    let backend = FakeBackend::configured("groq", "llama3", "sk-old", AuthStatus::Failed);
    let ctl = controller_for(&backend).await;
    assert_eq!(ctl.refresh().await.expect("boot"), Phase::ReadyLocked);

    let phase = ctl
        .update_config(UpdateRequest {
            model_id: Some("llama-3.1-70b-versatile".to_string()),
            api_key: Some(VALID_KEY.to_string()),
        })
        .await
        .expect("update");

    assert_eq!(phase, Phase::ReadyUnlocked);
    let state = ctl.state().expect("state");
    assert_eq!(state.model.as_deref(), Some("llama-3.1-70b-versatile"));
    assert!(ctl.chat_enabled());
}

#[tokio::test]
async fn failed_update_call_skips_verify_and_refresh() {
    let backend = FakeBackend::default();
    let ctl = controller_for(&backend).await;

    let err = ctl
        .update_config(UpdateRequest {
            model_id: Some("llama3".to_string()),
            api_key: None,
        })
        .await
        .expect_err("backend is not configured");

    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("System not configured"));
    assert_eq!(backend.calls(), vec!["POST /config/update"]);
}

#[tokio::test]
async fn reset_is_observable_without_a_status_fetch() {
    let backend = FakeBackend::configured("groq", "llama3", VALID_KEY, AuthStatus::Verified);
    let ctl = controller_for(&backend).await;
    ctl.refresh().await.expect("boot");

    ctl.reset().await.expect("reset");

    assert_eq!(ctl.phase(), Phase::SetupRequired);
    assert!(!ctl.state().expect("state").configured);
    assert_eq!(backend.count("GET /status"), 1);
}

#[tokio::test]
async fn refresh_in_flight_during_reset_is_discarded() {
    let backend = FakeBackend::configured("groq", "llama3", VALID_KEY, AuthStatus::Verified);
    let ctl = controller_for(&backend).await;
    backend.set_status_delay(Duration::from_millis(300));

    let slow = {
        let ctl = ctl.clone();
        tokio::spawn(async move { ctl.refresh().await })
    };
    // Let the slow fetch reach the backend and snapshot the configured state.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(ctl.phase(), Phase::Loading);

    ctl.reset().await.expect("reset");
    slow.await.expect("join").expect("stale fetch still succeeds");

    assert_eq!(ctl.phase(), Phase::SetupRequired);
    assert!(!ctl.state().expect("state").configured);
}

#[tokio::test]
async fn refresh_against_unreachable_backend_propagates_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let ctl = ConfigController::new(ApiClient::new(format!("http://127.0.0.1:{port}")));

    let err = ctl.refresh().await.expect_err("nothing listening");

    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(ctl.phase(), Phase::Uninitialized);
}

#[tokio::test]
async fn catalog_endpoints_and_custom_model_registration() {
    let backend = FakeBackend::default();
    let ctl = controller_for(&backend).await;
    let api = ctl.api();

    let providers = api.providers().await.expect("providers");
    assert!(providers.iter().any(|p| p.id == "local"));

    assert!(api.models("local").await.expect("models").is_empty());
    api.add_model(&NewModel {
        provider: "local".to_string(),
        id: "mistral".to_string(),
        name: "Mistral 7B".to_string(),
        base_url: None,
    })
    .await
    .expect("add model");
    let models = api.models("local").await.expect("models");
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].name, "Mistral 7B");

    let err = api.models("nope").await.expect_err("unknown provider");
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("Unknown provider"));
}
