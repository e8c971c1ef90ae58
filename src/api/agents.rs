//! Agent management API handlers
//!
//! Spawning, listing, inspecting and acting on agents in the registry.

use crate::api::utils::require_field;
use crate::error::AppError;
use crate::state::{AgentId, AgentMetrics, AgentRecord, AgentStatus, SharedState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Spawn agent request
#[derive(Debug, Deserialize, Default)]
pub struct SpawnRequest {
    /// Agent category (required)
    #[serde(rename = "type", default)]
    pub agent_type: Option<String>,
    /// Backend model; the configured default when absent
    #[serde(default)]
    pub model: Option<String>,
    /// Instruction text (required)
    #[serde(default)]
    pub task: Option<String>,
}

/// Spawn agent response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnResponse {
    /// New agent id
    pub agent_id: AgentId,
    /// New session token
    pub session_id: String,
    /// Always `spawning`
    pub status: AgentStatus,
    /// Human-readable message
    pub message: String,
}

/// Agents list response
#[derive(Debug, Serialize)]
pub struct AgentsListResponse {
    /// All agents, newest first
    pub agents: Vec<AgentRecord>,
    /// Total number of agents
    pub total: usize,
    /// Number of agents currently running
    pub active: usize,
}

/// Agent action request
#[derive(Debug, Deserialize)]
pub struct AgentActionRequest {
    /// `kill` or `message`
    pub action: String,
    /// Text for the `message` action
    #[serde(default)]
    pub message: Option<String>,
}

/// Agent action response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentActionResponse {
    /// Target agent
    pub agent_id: AgentId,
    /// Action that was applied
    pub action: String,
    /// `terminated` or `queued`
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Record after a kill
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentRecord>,
}

/// POST /api/agents/spawn - Spawn a new agent
pub async fn spawn_agent(
    State(state): State<SharedState>,
    Json(request): Json<SpawnRequest>,
) -> Result<(StatusCode, Json<SpawnResponse>), AppError> {
    let agent_type = require_field(request.agent_type.as_deref(), "type")?;
    let task = require_field(request.task.as_deref(), "task")?;

    let record = state
        .registry
        .spawn(agent_type, request.model.as_deref(), task)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SpawnResponse {
            message: format!("Agent {} spawned", record.agent_id),
            agent_id: record.agent_id,
            session_id: record.session_id,
            status: record.status,
        }),
    ))
}

/// GET /api/agents - List all agents
pub async fn list_agents(
    State(state): State<SharedState>,
) -> Result<Json<AgentsListResponse>, AppError> {
    let agents = state.registry.list().await;
    let active = agents
        .iter()
        .filter(|a| a.status == AgentStatus::Running)
        .count();

    Ok(Json(AgentsListResponse {
        total: agents.len(),
        active,
        agents,
    }))
}

/// GET /api/agents/:id - Get a specific agent
pub async fn get_agent(
    State(state): State<SharedState>,
    Path(id): Path<AgentId>,
) -> Result<Json<AgentRecord>, AppError> {
    Ok(Json(state.registry.get(&id).await?))
}

/// POST /api/agents/:id/action - Kill an agent or queue a message for it
pub async fn agent_action(
    State(state): State<SharedState>,
    Path(id): Path<AgentId>,
    Json(request): Json<AgentActionRequest>,
) -> Result<Json<AgentActionResponse>, AppError> {
    match request.action.trim() {
        "kill" => {
            let record = state.registry.kill(&id).await?;
            Ok(Json(AgentActionResponse {
                agent_id: id.clone(),
                action: "kill".to_string(),
                status: "terminated".to_string(),
                message: format!("Agent {} terminated", id),
                agent: Some(record),
            }))
        }
        "message" => {
            // Existence check only; chat history is written through the chat endpoint
            state.registry.get(&id).await?;
            let text = require_field(request.message.as_deref(), "message")?;
            info!(agent_id = %id, chars = text.chars().count(), "Message queued for agent");
            Ok(Json(AgentActionResponse {
                agent_id: id,
                action: "message".to_string(),
                status: "queued".to_string(),
                message: "Message queued for agent".to_string(),
                agent: None,
            }))
        }
        other => Err(AppError::InvalidRequest(format!(
            "Unknown action '{}', expected kill or message",
            other
        ))),
    }
}

/// GET /api/agents/:id/metrics - Derived runtime metrics
pub async fn agent_metrics(
    State(state): State<SharedState>,
    Path(id): Path<AgentId>,
) -> Result<Json<AgentMetrics>, AppError> {
    Ok(Json(state.registry.metrics(&id).await?))
}
