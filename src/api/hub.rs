//! Hub presence API
//!
//! Read-only view of who is currently connected to the real-time hub.

use crate::error::AppError;
use crate::hub::ConnectionEntry;
use crate::state::SharedState;
use axum::{extract::State, response::Json};
use serde::Serialize;

/// Presence listing response
#[derive(Debug, Serialize)]
pub struct OnlineResponse {
    /// One entry per identified agent
    pub agents: Vec<ConnectionEntry>,
    /// Number of identified agents
    pub total: usize,
    /// Live connections including anonymous ones
    pub connections: usize,
}

/// GET /api/hub/online - Identified agents currently connected
pub async fn list_online(State(state): State<SharedState>) -> Result<Json<OnlineResponse>, AppError> {
    let agents = state.hub.online().await;
    let connections = state.hub.connection_count().await;
    Ok(Json(OnlineResponse {
        total: agents.len(),
        agents,
        connections,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_anonymous_connections_not_listed() {
        let state = AppState::default().shared();
        let (tx, _rx) = mpsc::unbounded_channel();
        let anon = state.hub.connect(tx.clone()).await;
        let named = state.hub.connect(tx).await;
        state.hub.identify(&named, "A", Some("Alpha")).await.unwrap();

        let response = list_online(State(state)).await.unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(response.connections, 2);
        assert_eq!(response.agents[0].agent_id, "A");
        assert_ne!(response.agents[0].connection_id, anon);
    }
}
