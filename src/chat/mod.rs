//! Chat module
//!
//! Append-only, per-agent conversation history held in memory.

pub mod log;
pub mod models;

pub use log::{ConversationLog, History};
pub use models::{ChatMessage, MessageRole};
