//! Backend client and configuration/auth state machine for pxchat.
//!
//! [`ApiClient`] speaks the backend's JSON contract, [`ConfigController`]
//! decides whether chat is allowed, and [`ChatSession`] keeps the transcript.
//! Wire the three together with [`connect`].

pub mod api;
pub mod controller;
pub mod session;
pub mod state;

use std::sync::Arc;

pub use api::{ApiClient, AuthSync, DEFAULT_BASE_URL};
pub use controller::ConfigController;
pub use session::{BlockReason, ChatSession, DISABLED_NOTICE, SendOutcome, Transcript, prepare_send};
pub use state::{Phase, SystemState};

/// Builds the controller and a chat-capable client whose failed chat calls
/// resync that controller.
pub fn connect(base_url: impl Into<String>) -> (ConfigController, ApiClient) {
    let api = ApiClient::new(base_url);
    let controller = ConfigController::new(api.clone());
    let chat_api = api.with_auth_sync(Arc::new(controller.clone()));
    (controller, chat_api)
}
