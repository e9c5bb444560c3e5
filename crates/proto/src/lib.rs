//! Shared types for the pxchat workspace.
//!
//! This crate defines the JSON bodies of the local backend's HTTP contract,
//! the chat transcript types, and strongly-typed error enums.

pub mod error;
pub mod message;
pub mod wire;

/// Re-export of all error types.
pub use error::*;
/// Re-export of transcript types.
pub use message::{Message, MessageId, Role};
/// Re-export of backend request/response bodies.
pub use wire::{
    Ack, AuthStatus, ChatRequest, ChatResponse, ChatTurn, ModelInfo, NewModel, ProviderInfo,
    SetupRequest, SystemStatus, UpdateRequest,
};
