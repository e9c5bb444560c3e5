//! Full-screen ratatui terminal interface for pxchat.

mod action;
mod app;
mod boot;
mod chat;
mod event;
mod input;
mod settings;
mod setup;
mod status;
mod theme;

pub use event::run_tui;
pub use setup::{normalize_api_key, requires_api_key};
