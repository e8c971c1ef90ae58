//! API module
//!
//! Contains HTTP request handlers for agents, chat history and hub presence

pub mod agents;
pub mod chat;
pub mod hub;
pub mod utils;
