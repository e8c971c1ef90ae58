//! Chat API endpoints
//!
//! Reads and appends to an agent's conversation log.

use crate::api::utils::require_field;
use crate::chat::{ChatMessage, MessageRole};
use crate::error::AppError;
use crate::state::{AgentId, SharedState};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

/// Query parameters for chat history
#[derive(Debug, Deserialize, Default)]
pub struct HistoryQuery {
    /// Maximum number of recent messages to return
    pub limit: Option<usize>,
}

/// Chat history response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryResponse {
    /// Agent the history belongs to
    pub agent_id: AgentId,
    /// Most recent messages, oldest first
    pub messages: Vec<ChatMessage>,
    /// Total messages stored for the agent
    pub total: usize,
}

/// Request to append a message
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppendMessageRequest {
    /// Message content
    #[serde(default)]
    pub content: Option<String>,
    /// `user` (default), `agent` or `system`
    #[serde(default)]
    pub role: Option<String>,
    /// Display name of the sender
    #[serde(default)]
    pub agent_name: Option<String>,
}

/// Append response
#[derive(Debug, Serialize)]
pub struct AppendMessageResponse {
    /// The stored message
    pub message: ChatMessage,
    /// Messages stored for the agent after the append
    pub total: usize,
}

/// GET /api/agents/:id/chat - Conversation history
pub async fn chat_history(
    State(state): State<SharedState>,
    Path(agent_id): Path<AgentId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ChatHistoryResponse>, AppError> {
    let history = state.chat.list(&agent_id, query.limit).await;
    Ok(Json(ChatHistoryResponse {
        agent_id,
        messages: history.messages,
        total: history.total,
    }))
}

/// POST /api/agents/:id/chat - Append a message
pub async fn append_message(
    State(state): State<SharedState>,
    Path(agent_id): Path<AgentId>,
    Json(request): Json<AppendMessageRequest>,
) -> Result<Json<AppendMessageResponse>, AppError> {
    let content = require_field(request.content.as_deref(), "content")?;
    let role = match request.role.as_deref() {
        Some(role) => role.parse::<MessageRole>()?,
        None => MessageRole::User,
    };

    let (message, total) = state
        .chat
        .append(&agent_id, role, content, request.agent_name.as_deref())
        .await?;

    Ok(Json(AppendMessageResponse { message, total }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::AppState;
    use std::time::Duration;

    fn create_test_state() -> SharedState {
        let mut config = Config::default();
        config.chat.reply_delay = Duration::from_millis(100);
        AppState::new(config).shared()
    }

    #[tokio::test]
    async fn test_history_empty() {
        let state = create_test_state();
        let response = chat_history(
            State(state),
            Path("agent_1".to_string()),
            Query(HistoryQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(response.agent_id, "agent_1");
        assert!(response.messages.is_empty());
        assert_eq!(response.total, 0);
    }

    #[tokio::test]
    async fn test_append_defaults_to_user_role() {
        let state = create_test_state();
        let request = AppendMessageRequest {
            content: Some("hello".to_string()),
            ..Default::default()
        };
        let response = append_message(State(state), Path("agent_1".to_string()), Json(request))
            .await
            .unwrap();
        assert_eq!(response.message.role, MessageRole::User);
        assert_eq!(response.total, 1);
    }

    #[tokio::test]
    async fn test_append_empty_content() {
        let state = create_test_state();
        let request = AppendMessageRequest {
            content: Some("  ".to_string()),
            ..Default::default()
        };
        let result = append_message(State(state), Path("agent_1".to_string()), Json(request)).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_append_invalid_role() {
        let state = create_test_state();
        let request = AppendMessageRequest {
            content: Some("hi".to_string()),
            role: Some("assistant".to_string()),
            agent_name: None,
        };
        let result = append_message(State(state), Path("agent_1".to_string()), Json(request)).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_limit_reports_total() {
        let state = create_test_state();
        for content in ["one", "two", "three"] {
            let request = AppendMessageRequest {
                content: Some(content.to_string()),
                role: Some("system".to_string()),
                agent_name: None,
            };
            append_message(State(state.clone()), Path("agent_1".to_string()), Json(request))
                .await
                .unwrap();
        }
        let response = chat_history(
            State(state),
            Path("agent_1".to_string()),
            Query(HistoryQuery { limit: Some(1) }),
        )
        .await
        .unwrap();
        assert_eq!(response.messages.len(), 1);
        assert_eq!(response.messages[0].content, "three");
        assert_eq!(response.total, 3);
    }
}
