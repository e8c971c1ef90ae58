// Agent registry
// Owns every agent record and drives the spawning -> running -> terminal lifecycle

use crate::config::RegistryConfig;
use crate::error::AppError;
use crate::state::metrics::AgentMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Unique identifier for an agent
pub type AgentId = String;

/// Result text written by [`AgentRegistry::kill`]
pub const KILLED_RESULT: &str = "Agent terminated by user";

/// Agent status enumeration
/// Represents the current lifecycle state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Record created, background work not started yet
    Spawning,
    /// Agent is currently running
    Running,
    /// Agent finished (normally or by being killed)
    Completed,
    /// Agent encountered an error
    Error,
}

impl AgentStatus {
    /// Terminal statuses are never left
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentStatus::Completed | AgentStatus::Error)
    }
}

/// Tracked lifecycle state of one spawned agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    /// Unique identifier, never reused
    pub agent_id: AgentId,
    /// Opaque session token
    pub session_id: String,
    /// Free-form category, e.g. a role name
    #[serde(rename = "type")]
    pub agent_type: String,
    /// Backend model assigned to the agent
    pub model: String,
    /// Instruction text
    pub task: String,
    /// Current lifecycle status
    pub status: AgentStatus,
    /// When the record was created
    pub start_time: DateTime<Utc>,
    /// Set once when a terminal status is reached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Set only on `completed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Set only on `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// How a record leaves the non-terminal states
enum Outcome {
    Completed(String),
    Failed(String),
}

impl AgentRecord {
    fn new(agent_type: String, model: String, task: String) -> Self {
        Self {
            agent_id: generate_agent_id(),
            session_id: Uuid::new_v4().to_string(),
            agent_type,
            model,
            task,
            status: AgentStatus::Spawning,
            start_time: Utc::now(),
            end_time: None,
            result: None,
            error: None,
        }
    }

    /// Move to a terminal status, setting `end_time` and exactly one of
    /// `result`/`error`. Returns false (and changes nothing) if already terminal.
    fn terminate(&mut self, outcome: Outcome) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        match outcome {
            Outcome::Completed(result) => {
                self.status = AgentStatus::Completed;
                self.result = Some(result);
            }
            Outcome::Failed(error) => {
                self.status = AgentStatus::Error;
                self.error = Some(error);
            }
        }
        self.end_time = Some(Utc::now());
        true
    }

    /// Copy of the record with `result` bounded to `max_chars` for list views
    pub fn preview(&self, max_chars: usize) -> Self {
        let mut preview = self.clone();
        if let Some(result) = &self.result {
            preview.result = Some(truncate_chars(result, max_chars));
        }
        preview
    }

    fn synthesize_result(&self) -> String {
        format!(
            "{} agent ({}) finished task: {}",
            self.agent_type, self.model, self.task
        )
    }
}

/// Generate a new unique ID for an agent
pub fn generate_agent_id() -> AgentId {
    format!("agent_{}", Uuid::new_v4().simple())
}

/// Truncate to at most `max_chars` characters, marking the cut with `...`
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

#[derive(Debug, Default)]
struct RegistryInner {
    records: HashMap<AgentId, AgentRecord>,
    /// Creation order, oldest first
    order: Vec<AgentId>,
}

/// In-memory registry of agent records
///
/// Cloning yields another handle to the same table. Every operation takes the
/// lock once and releases it before any suspension, so each read observes a
/// whole record as written by a single transition.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    inner: Arc<RwLock<RegistryInner>>,
    config: RegistryConfig,
}

impl AgentRegistry {
    /// Create an empty registry
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner::default())),
            config,
        }
    }

    /// Create a record in `spawning` and schedule its background transitions
    pub async fn spawn(
        &self,
        agent_type: &str,
        model: Option<&str>,
        task: &str,
    ) -> Result<AgentRecord, AppError> {
        let agent_type = agent_type.trim();
        let task = task.trim();
        if agent_type.is_empty() {
            return Err(AppError::InvalidRequest("type is required".to_string()));
        }
        if task.is_empty() {
            return Err(AppError::InvalidRequest("task is required".to_string()));
        }
        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.config.default_model.as_str());

        let record = AgentRecord::new(agent_type.to_string(), model.to_string(), task.to_string());
        {
            let mut inner = self.inner.write().await;
            inner.order.push(record.agent_id.clone());
            inner
                .records
                .insert(record.agent_id.clone(), record.clone());
        }

        info!(
            agent_id = %record.agent_id,
            agent_type = %record.agent_type,
            model = %record.model,
            "Agent spawned"
        );

        self.schedule_lifecycle(record.agent_id.clone());
        Ok(record)
    }

    /// Get a snapshot of one record
    pub async fn get(&self, agent_id: &str) -> Result<AgentRecord, AppError> {
        self.inner
            .read()
            .await
            .records
            .get(agent_id)
            .cloned()
            .ok_or_else(|| AppError::AgentNotFound(agent_id.to_string()))
    }

    /// All records newest-first, with `result` truncated for display
    pub async fn list(&self) -> Vec<AgentRecord> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.records.get(id))
            .map(|record| record.preview(self.config.result_preview_chars))
            .collect()
    }

    /// Force a non-terminal agent to `completed`. Killing a terminal agent is a no-op.
    pub async fn kill(&self, agent_id: &str) -> Result<AgentRecord, AppError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .get_mut(agent_id)
            .ok_or_else(|| AppError::AgentNotFound(agent_id.to_string()))?;

        if record.terminate(Outcome::Completed(KILLED_RESULT.to_string())) {
            info!(agent_id = %agent_id, "Agent killed");
        } else {
            debug!(agent_id = %agent_id, status = ?record.status, "Kill on terminal agent ignored");
        }
        Ok(record.clone())
    }

    /// External failure signal: move a non-terminal agent to `error`
    pub async fn fail(&self, agent_id: &str, error: &str) -> Result<AgentRecord, AppError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .get_mut(agent_id)
            .ok_or_else(|| AppError::AgentNotFound(agent_id.to_string()))?;

        if record.terminate(Outcome::Failed(error.to_string())) {
            info!(agent_id = %agent_id, error = %error, "Agent failed");
        }
        Ok(record.clone())
    }

    /// Derived uptime and simulated usage figures for one agent
    pub async fn metrics(&self, agent_id: &str) -> Result<AgentMetrics, AppError> {
        let record = self.get(agent_id).await?;
        Ok(AgentMetrics::derive(&record, Utc::now()))
    }

    /// Advance `spawning` -> `running`. Returns false if the record moved on already.
    async fn mark_running(&self, agent_id: &str) -> bool {
        let mut inner = self.inner.write().await;
        match inner.records.get_mut(agent_id) {
            Some(record) if record.status == AgentStatus::Spawning => {
                record.status = AgentStatus::Running;
                true
            }
            _ => false,
        }
    }

    /// Scheduled completion; never overwrites a terminal record
    async fn complete_scheduled(&self, agent_id: &str) -> bool {
        let mut inner = self.inner.write().await;
        match inner.records.get_mut(agent_id) {
            Some(record) => {
                let result = record.synthesize_result();
                record.terminate(Outcome::Completed(result))
            }
            None => false,
        }
    }

    fn schedule_lifecycle(&self, agent_id: AgentId) {
        let registry = self.clone();
        let running_delay = self.config.running_delay;
        let remaining = self
            .config
            .completion_delay
            .saturating_sub(self.config.running_delay);

        tokio::spawn(async move {
            tokio::time::sleep(running_delay).await;
            if registry.mark_running(&agent_id).await {
                info!(agent_id = %agent_id, "Agent running");
            } else {
                debug!(agent_id = %agent_id, "Skipped running transition");
            }

            tokio::time::sleep(remaining).await;
            if registry.complete_scheduled(&agent_id).await {
                info!(agent_id = %agent_id, "Agent completed");
            } else {
                debug!(agent_id = %agent_id, "Skipped completion, agent already terminal");
            }
        });
    }
}
