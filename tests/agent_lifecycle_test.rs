//! Integration tests for the agent registry lifecycle
//!
//! Scheduled transitions run on a paused clock so delays are deterministic.

use agent_hub_backend::config::RegistryConfig;
use agent_hub_backend::state::{registry::KILLED_RESULT, AgentRegistry, AgentStatus};
use std::time::Duration;

const RUNNING_DELAY: Duration = Duration::from_millis(2_000);
const COMPLETION_DELAY: Duration = Duration::from_millis(10_000);

fn create_registry() -> AgentRegistry {
    AgentRegistry::new(RegistryConfig {
        running_delay: RUNNING_DELAY,
        completion_delay: COMPLETION_DELAY,
        default_model: "sonnet".to_string(),
        result_preview_chars: 200,
    })
}

/// spawn -> running -> completed, each observed at the expected time
#[tokio::test(start_paused = true)]
async fn test_spawn_advances_to_completed() {
    let registry = create_registry();
    let record = registry
        .spawn("builder", None, "draft proposal")
        .await
        .unwrap();
    assert_eq!(record.status, AgentStatus::Spawning);
    assert!(record.end_time.is_none());
    assert!(record.result.is_none());

    tokio::time::sleep(RUNNING_DELAY + Duration::from_millis(100)).await;
    let running = registry.get(&record.agent_id).await.unwrap();
    assert_eq!(running.status, AgentStatus::Running);
    assert!(running.end_time.is_none());
    assert!(running.result.is_none());

    tokio::time::sleep(COMPLETION_DELAY).await;
    let done = registry.get(&record.agent_id).await.unwrap();
    assert_eq!(done.status, AgentStatus::Completed);
    assert!(!done.result.clone().unwrap().is_empty());
    assert!(done.end_time.is_some());
    assert!(done.error.is_none());
    assert_eq!(done.start_time, record.start_time);
    assert_eq!(done.task, "draft proposal");
}

/// Killing a running agent completes it; the stale scheduled completion must not overwrite it
#[tokio::test(start_paused = true)]
async fn test_kill_is_not_overwritten_by_scheduled_completion() {
    let registry = create_registry();
    let record = registry.spawn("builder", None, "long job").await.unwrap();

    tokio::time::sleep(RUNNING_DELAY + Duration::from_millis(100)).await;
    let killed = registry.kill(&record.agent_id).await.unwrap();
    assert_eq!(killed.status, AgentStatus::Completed);
    assert_eq!(killed.result.as_deref(), Some(KILLED_RESULT));
    assert!(killed.end_time.is_some());

    tokio::time::sleep(COMPLETION_DELAY * 2).await;
    let after = registry.get(&record.agent_id).await.unwrap();
    assert_eq!(after, killed);
}

/// Killing during `spawning` prevents the running transition too
#[tokio::test(start_paused = true)]
async fn test_kill_while_spawning_never_runs() {
    let registry = create_registry();
    let record = registry.spawn("reviewer", Some("opus"), "check").await.unwrap();
    registry.kill(&record.agent_id).await.unwrap();

    tokio::time::sleep(RUNNING_DELAY + Duration::from_millis(100)).await;
    let after = registry.get(&record.agent_id).await.unwrap();
    assert_eq!(after.status, AgentStatus::Completed);
    assert_eq!(after.model, "opus");
}

/// Killing a terminal agent succeeds and changes nothing
#[tokio::test(start_paused = true)]
async fn test_kill_terminal_is_noop() {
    let registry = create_registry();
    let record = registry.spawn("builder", None, "quick").await.unwrap();

    tokio::time::sleep(COMPLETION_DELAY + Duration::from_millis(100)).await;
    let done = registry.get(&record.agent_id).await.unwrap();
    assert_eq!(done.status, AgentStatus::Completed);

    tokio::time::sleep(Duration::from_secs(5)).await;
    let killed = registry.kill(&record.agent_id).await.unwrap();
    assert_eq!(killed.end_time, done.end_time);
    assert_eq!(killed.result, done.result);
    assert_eq!(killed.error, done.error);
}

/// A failed agent stays in `error` and killing it leaves the error in place
#[tokio::test(start_paused = true)]
async fn test_failed_agent_is_terminal() {
    let registry = create_registry();
    let record = registry.spawn("builder", None, "flaky").await.unwrap();

    tokio::time::sleep(RUNNING_DELAY + Duration::from_millis(100)).await;
    registry.fail(&record.agent_id, "backend unavailable").await.unwrap();
    let killed = registry.kill(&record.agent_id).await.unwrap();
    assert_eq!(killed.status, AgentStatus::Error);
    assert_eq!(killed.error.as_deref(), Some("backend unavailable"));
    assert!(killed.result.is_none());

    tokio::time::sleep(COMPLETION_DELAY).await;
    assert_eq!(
        registry.get(&record.agent_id).await.unwrap().status,
        AgentStatus::Error
    );
}

/// Many agents spawned concurrently all terminate exactly once with distinct ids
#[tokio::test(start_paused = true)]
async fn test_concurrent_spawns() {
    let registry = create_registry();
    let mut handles = Vec::new();
    for i in 0..20 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry
                .spawn("worker", None, &format!("task {}", i))
                .await
                .unwrap()
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().agent_id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);

    tokio::time::sleep(COMPLETION_DELAY + Duration::from_millis(100)).await;
    let list = registry.list().await;
    assert_eq!(list.len(), 20);
    assert!(list.iter().all(|r| r.status == AgentStatus::Completed));
}

/// Metrics follow the record: resources while running, totals once terminal
#[tokio::test(start_paused = true)]
async fn test_metrics_follow_status() {
    let registry = create_registry();
    let record = registry.spawn("builder", None, "measure").await.unwrap();

    tokio::time::sleep(RUNNING_DELAY + Duration::from_millis(100)).await;
    let running = registry.metrics(&record.agent_id).await.unwrap();
    assert_eq!(running.status, AgentStatus::Running);
    assert!(running.resources.is_some());
    assert!(running.usage.is_none());

    tokio::time::sleep(COMPLETION_DELAY).await;
    let done = registry.metrics(&record.agent_id).await.unwrap();
    assert!(done.resources.is_none());
    assert!(done.usage.is_some());
    // Stored record is untouched by metric derivation
    assert_eq!(
        registry.get(&record.agent_id).await.unwrap().status,
        AgentStatus::Completed
    );
}
