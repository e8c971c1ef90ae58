// State management module
// Agent registry, derived metrics, and the shared handle bundle used by handlers

pub mod app_state;
pub mod metrics;
pub mod registry;

pub use app_state::{AppState, SharedState};
pub use metrics::AgentMetrics;
pub use registry::{truncate_chars, AgentId, AgentRecord, AgentRegistry, AgentStatus};
