//! Conversation log
//!
//! Per-agent, append-only message sequences. The log is keyed by agent id but
//! does not require the agent to exist in the registry.

use super::models::{ChatMessage, MessageRole};
use crate::config::ChatConfig;
use crate::error::AppError;
use crate::state::{truncate_chars, AgentId};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A window of one agent's history
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    /// Most recent messages, oldest first
    pub messages: Vec<ChatMessage>,
    /// Total messages stored for the agent, regardless of the window
    pub total: usize,
}

/// Shared conversation store
///
/// Cloning yields another handle to the same store.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    conversations: Arc<RwLock<HashMap<AgentId, Vec<ChatMessage>>>>,
    next_seq: Arc<AtomicU64>,
    config: ChatConfig,
}

impl ConversationLog {
    /// Create an empty log
    pub fn new(config: ChatConfig) -> Self {
        Self {
            conversations: Arc::new(RwLock::new(HashMap::new())),
            next_seq: Arc::new(AtomicU64::new(1)),
            config,
        }
    }

    /// Append a message and return it with the agent's new message count.
    ///
    /// A `user` message schedules exactly one simulated `agent` reply after
    /// the configured delay; the caller is not blocked on it.
    pub async fn append(
        &self,
        agent_id: &str,
        role: MessageRole,
        content: &str,
        agent_name: Option<&str>,
    ) -> Result<(ChatMessage, usize), AppError> {
        if content.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "content cannot be empty".to_string(),
            ));
        }

        let (message, total) = self
            .push(
                agent_id,
                role,
                content.to_string(),
                agent_name.map(str::to_string),
            )
            .await;

        if role == MessageRole::User {
            self.schedule_reply(&message);
        }

        Ok((message, total))
    }

    /// The most recent `limit` messages (default from config) plus the true total
    pub async fn list(&self, agent_id: &str, limit: Option<usize>) -> History {
        let limit = limit.unwrap_or(self.config.history_limit);
        let conversations = self.conversations.read().await;
        match conversations.get(agent_id) {
            Some(messages) => {
                let start = messages.len().saturating_sub(limit);
                History {
                    messages: messages[start..].to_vec(),
                    total: messages.len(),
                }
            }
            None => History {
                messages: Vec::new(),
                total: 0,
            },
        }
    }

    async fn push(
        &self,
        agent_id: &str,
        role: MessageRole,
        content: String,
        agent_name: Option<String>,
    ) -> (ChatMessage, usize) {
        let mut conversations = self.conversations.write().await;
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let message = ChatMessage {
            id: format!("{}-{}", agent_id, seq),
            agent_id: agent_id.to_string(),
            role,
            content,
            agent_name,
            timestamp: Utc::now(),
        };
        let messages = conversations.entry(agent_id.to_string()).or_default();
        messages.push(message.clone());
        (message, messages.len())
    }

    fn schedule_reply(&self, original: &ChatMessage) {
        let log = self.clone();
        let delay = self.config.reply_delay;
        let agent_id = original.agent_id.clone();
        let quoted = truncate_chars(original.content.trim(), self.config.reply_quote_chars);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let content = format!("Received: \"{}\". Working on it.", quoted);
            let (reply, total) = log.push(&agent_id, MessageRole::Agent, content, None).await;
            debug!(agent_id = %agent_id, message_id = %reply.id, total, "Simulated reply appended");
        });
    }
}
