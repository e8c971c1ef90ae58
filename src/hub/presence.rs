//! Connection registry and fan-out router
//!
//! Every live connection owns an unbounded outbound channel. Routing takes a
//! snapshot of the target senders under the lock and delivers after releasing
//! it, so concurrent joins and leaves never observe a half-iterated table.
//! Deliveries to a vanished receiver are dropped silently.

use super::events::{
    ConnectionEntry, ConnectionId, Envelope, Offline, Presence, ServerEvent, TypingIndicator,
    DEFAULT_MESSAGE_TYPE,
};
use crate::state::{AgentId, AgentRegistry};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Outcome of routing one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Delivered to the target's current connection
    Direct,
    /// Delivered to this many connections
    Broadcast(usize),
    /// Target not identified, or sender unknown
    Dropped,
}

#[derive(Debug)]
struct Connection {
    tx: mpsc::UnboundedSender<ServerEvent>,
    connected_at: DateTime<Utc>,
    entry: Option<ConnectionEntry>,
}

impl Connection {
    /// `(from, from_name)` as seen by peers
    fn sender_identity(&self, connection_id: &str) -> (String, String) {
        match &self.entry {
            Some(entry) => (entry.agent_id.clone(), entry.agent_name.clone()),
            None => (connection_id.to_string(), connection_id.to_string()),
        }
    }
}

#[derive(Debug, Default)]
struct HubInner {
    connections: HashMap<ConnectionId, Connection>,
    /// Authoritative connection per identity, last identify wins
    by_agent: HashMap<AgentId, ConnectionId>,
}

impl HubInner {
    fn senders_except(&self, skip: Option<&str>) -> Vec<mpsc::UnboundedSender<ServerEvent>> {
        self.connections
            .iter()
            .filter(|(id, _)| Some(id.as_str()) != skip)
            .map(|(_, conn)| conn.tx.clone())
            .collect()
    }

    fn sender_for_agent(&self, agent_id: &str) -> Option<mpsc::UnboundedSender<ServerEvent>> {
        self.by_agent
            .get(agent_id)
            .and_then(|conn_id| self.connections.get(conn_id))
            .map(|conn| conn.tx.clone())
    }
}

fn deliver(targets: &[mpsc::UnboundedSender<ServerEvent>], event: &ServerEvent) -> usize {
    targets
        .iter()
        .filter(|tx| tx.send(event.clone()).is_ok())
        .count()
}

/// Presence and messaging hub
///
/// Cloning yields another handle to the same connection table.
#[derive(Debug, Clone, Default)]
pub struct Hub {
    inner: Arc<RwLock<HubInner>>,
    registry: Option<AgentRegistry>,
}

impl Hub {
    /// Create a hub with no registry cross-reference
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hub that checks identities against `registry`
    pub fn with_registry(registry: AgentRegistry) -> Self {
        Self {
            inner: Arc::default(),
            registry: Some(registry),
        }
    }

    /// Register a new anonymous connection delivering to `tx`
    pub async fn connect(&self, tx: mpsc::UnboundedSender<ServerEvent>) -> ConnectionId {
        let connection_id = Uuid::new_v4().to_string();
        self.inner.write().await.connections.insert(
            connection_id.clone(),
            Connection {
                tx,
                connected_at: Utc::now(),
                entry: None,
            },
        );
        debug!(connection_id = %connection_id, "Connection opened");
        connection_id
    }

    /// Claim (or re-claim) an identity and announce it to every connection.
    ///
    /// Returns `None` when the connection is unknown or `agent_id` is blank.
    pub async fn identify(
        &self,
        connection_id: &str,
        agent_id: &str,
        agent_name: Option<&str>,
    ) -> Option<ConnectionEntry> {
        let agent_id = agent_id.trim();
        if agent_id.is_empty() {
            return None;
        }
        let agent_name = agent_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(agent_id)
            .to_string();

        let (entry, targets) = {
            let mut inner = self.inner.write().await;
            let conn = inner.connections.get_mut(connection_id)?;
            let entry = ConnectionEntry {
                connection_id: connection_id.to_string(),
                agent_id: agent_id.to_string(),
                agent_name: agent_name.clone(),
                connected_at: conn.connected_at,
            };
            let previous = conn.entry.replace(entry.clone());

            if let Some(previous) = previous {
                if previous.agent_id != agent_id
                    && inner.by_agent.get(&previous.agent_id).map(String::as_str)
                        == Some(connection_id)
                {
                    inner.by_agent.remove(&previous.agent_id);
                }
            }
            inner
                .by_agent
                .insert(agent_id.to_string(), connection_id.to_string());
            (entry, inner.senders_except(None))
        };

        if let Some(registry) = &self.registry {
            if registry.get(agent_id).await.is_err() {
                debug!(agent_id = %agent_id, "Identified as an agent the registry does not track");
            }
        }

        info!(connection_id = %connection_id, agent_id = %agent_id, "Agent online");
        deliver(
            &targets,
            &ServerEvent::AgentOnline(Presence {
                agent_id: agent_id.to_string(),
                agent_name,
            }),
        );
        Some(entry)
    }

    /// Route a message. Direct sends also acknowledge to the sender; unknown
    /// targets are dropped without notice.
    pub async fn send_message(
        &self,
        from_connection: &str,
        content: &str,
        to: Option<&str>,
        kind: Option<&str>,
    ) -> Delivery {
        let inner = self.inner.read().await;
        let Some(sender) = inner.connections.get(from_connection) else {
            return Delivery::Dropped;
        };
        let (from, from_name) = sender.sender_identity(from_connection);
        let envelope = Envelope {
            id: Uuid::new_v4().to_string(),
            from,
            from_name,
            to: to.map(str::to_string),
            content: content.to_string(),
            kind: kind.unwrap_or(DEFAULT_MESSAGE_TYPE).to_string(),
            timestamp: Utc::now(),
        };

        match to {
            Some(target) => {
                let Some(target_tx) = inner.sender_for_agent(target) else {
                    debug!(from = %envelope.from, to = %target, "Direct message target not online, dropped");
                    return Delivery::Dropped;
                };
                let sender_tx = sender.tx.clone();
                drop(inner);

                deliver(&[target_tx], &ServerEvent::Message(envelope.clone()));
                deliver(&[sender_tx], &ServerEvent::MessageSent(envelope));
                Delivery::Direct
            }
            None => {
                let targets = inner.senders_except(None);
                drop(inner);
                Delivery::Broadcast(deliver(&targets, &ServerEvent::Message(envelope)))
            }
        }
    }

    /// Route a typing indicator; broadcasts exclude the sender
    pub async fn typing(&self, from_connection: &str, to: Option<&str>, is_typing: bool) -> Delivery {
        let inner = self.inner.read().await;
        let Some(sender) = inner.connections.get(from_connection) else {
            return Delivery::Dropped;
        };
        let (agent_id, agent_name) = sender.sender_identity(from_connection);
        let event = ServerEvent::Typing(TypingIndicator {
            agent_id,
            agent_name,
            is_typing,
        });

        match to {
            Some(target) => match inner.sender_for_agent(target) {
                Some(tx) => {
                    drop(inner);
                    deliver(&[tx], &event);
                    Delivery::Direct
                }
                None => Delivery::Dropped,
            },
            None => {
                let targets = inner.senders_except(Some(from_connection));
                drop(inner);
                Delivery::Broadcast(deliver(&targets, &event))
            }
        }
    }

    /// Tear down a connection. Returns its entry if it had identified.
    ///
    /// `agent:offline` is broadcast only when this connection still held the
    /// identity; a connection superseded by a later identify leaves silently.
    pub async fn disconnect(&self, connection_id: &str) -> Option<ConnectionEntry> {
        let (entry, targets) = {
            let mut inner = self.inner.write().await;
            let conn = inner.connections.remove(connection_id)?;
            let entry = conn.entry?;
            if inner.by_agent.get(&entry.agent_id).map(String::as_str) != Some(connection_id) {
                debug!(
                    connection_id = %connection_id,
                    agent_id = %entry.agent_id,
                    "Superseded connection closed, identity still online"
                );
                return Some(entry);
            }
            inner.by_agent.remove(&entry.agent_id);
            (entry, inner.senders_except(None))
        };

        info!(connection_id = %connection_id, agent_id = %entry.agent_id, "Agent offline");
        deliver(
            &targets,
            &ServerEvent::AgentOffline(Offline {
                agent_id: entry.agent_id.clone(),
            }),
        );
        Some(entry)
    }

    /// Authoritative entry for every identity currently online
    pub async fn online(&self) -> Vec<ConnectionEntry> {
        let inner = self.inner.read().await;
        let mut entries: Vec<ConnectionEntry> = inner
            .by_agent
            .values()
            .filter_map(|conn_id| inner.connections.get(conn_id))
            .filter_map(|conn| conn.entry.clone())
            .collect();
        entries.sort_by(|a, b| a.connected_at.cmp(&b.connected_at));
        entries
    }

    /// Number of live connections, identified or not
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }
}
