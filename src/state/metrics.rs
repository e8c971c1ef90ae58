// Derived agent metrics
// Uptime is computed from the record; resource and usage figures are simulated
// for display and never feed back into stored state.

use crate::state::registry::{AgentId, AgentRecord, AgentStatus};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

/// Point-in-time resource figures reported while an agent runs
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsage {
    /// CPU utilisation percentage
    pub cpu_percent: f64,
    /// Resident memory in megabytes
    pub memory_mb: u64,
    /// Thread count
    pub threads: u32,
}

/// Aggregate counters reported once an agent has finished
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageTotals {
    /// Total model tokens consumed
    pub tokens_used: u64,
    /// Backend API calls made
    pub api_calls: u32,
    /// Files read or written
    pub files_touched: u32,
}

/// Metrics view of one agent
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetrics {
    /// Agent the figures describe
    pub agent_id: AgentId,
    /// Status at the time of derivation
    pub status: AgentStatus,
    /// `(end_time or now) - start_time` in milliseconds
    pub uptime_ms: i64,
    /// Present while running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceUsage>,
    /// Present once terminal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageTotals>,
}

impl AgentMetrics {
    /// Derive metrics for `record` as of `now`
    pub fn derive(record: &AgentRecord, now: DateTime<Utc>) -> Self {
        let until = record.end_time.unwrap_or(now);
        let uptime_ms = (until - record.start_time).num_milliseconds().max(0);
        let mut rng = rand::thread_rng();

        let resources = (record.status == AgentStatus::Running).then(|| ResourceUsage {
            cpu_percent: (rng.gen_range(5.0..65.0_f64) * 10.0).round() / 10.0,
            memory_mb: rng.gen_range(120..900),
            threads: rng.gen_range(4..24),
        });

        let usage = record.status.is_terminal().then(|| {
            // Scale with runtime so longer agents report larger totals
            let seconds = (uptime_ms / 1000).max(1) as u64;
            UsageTotals {
                tokens_used: seconds * rng.gen_range(200..1_500),
                api_calls: rng.gen_range(1..40),
                files_touched: rng.gen_range(0..25),
            }
        });

        Self {
            agent_id: record.agent_id.clone(),
            status: record.status,
            uptime_ms,
            resources,
            usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(status: AgentStatus) -> AgentRecord {
        let start = Utc::now() - Duration::seconds(30);
        AgentRecord {
            agent_id: "agent_test".to_string(),
            session_id: "session".to_string(),
            agent_type: "builder".to_string(),
            model: "sonnet".to_string(),
            task: "draft proposal".to_string(),
            status,
            start_time: start,
            end_time: status.is_terminal().then(|| start + Duration::seconds(12)),
            result: (status == AgentStatus::Completed).then(|| "done".to_string()),
            error: (status == AgentStatus::Error).then(|| "failed".to_string()),
        }
    }

    #[test]
    fn test_running_reports_resources() {
        let metrics = AgentMetrics::derive(&record(AgentStatus::Running), Utc::now());
        assert!(metrics.uptime_ms >= 30_000);
        let resources = metrics.resources.expect("running agents report resources");
        assert!(resources.cpu_percent >= 5.0 && resources.cpu_percent <= 65.0);
        assert!(metrics.usage.is_none());
    }

    #[test]
    fn test_terminal_uses_end_time() {
        let metrics = AgentMetrics::derive(&record(AgentStatus::Completed), Utc::now());
        assert_eq!(metrics.uptime_ms, 12_000);
        assert!(metrics.resources.is_none());
        let usage = metrics.usage.expect("terminal agents report usage");
        assert!(usage.tokens_used >= 12 * 200);
    }

    #[test]
    fn test_spawning_reports_uptime_only() {
        let metrics = AgentMetrics::derive(&record(AgentStatus::Spawning), Utc::now());
        assert!(metrics.resources.is_none());
        assert!(metrics.usage.is_none());
    }
}
