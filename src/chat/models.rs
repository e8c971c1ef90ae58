//! Chat data models
//!
//! Defines the messages stored in an agent's conversation log.

use crate::error::AppError;
use crate::state::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user
    User,
    /// Message from the agent
    Agent,
    /// Message generated by the system
    System,
}

impl FromStr for MessageRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user" => Ok(MessageRole::User),
            "agent" => Ok(MessageRole::Agent),
            "system" => Ok(MessageRole::System),
            other => Err(AppError::InvalidRequest(format!(
                "role must be one of user, agent, system (got '{}')",
                other
            ))),
        }
    }
}

/// A single message in an agent's conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Unique identifier, `<agent_id>-<sequence>`
    pub id: String,
    /// Agent the conversation belongs to
    pub agent_id: AgentId,
    /// Role of the sender
    pub role: MessageRole,
    /// Message text, never empty
    pub content: String,
    /// Display name supplied by the sender, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    /// When the message was appended
    pub timestamp: DateTime<Utc>,
}
