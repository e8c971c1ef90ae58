//! Agent Hub Backend Library
//!
//! This library exposes modules for testing and external use.
//! The main binary is in `src/main.rs`.

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod hub;
/// Application state management
///
/// Handles the agent registry, derived metrics and the shared component bundle.
pub mod state;
pub mod websocket;
