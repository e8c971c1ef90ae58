//! Real-time wire types
//!
//! Frames are adjacently tagged JSON: `{"event": "<name>", "data": {...}}`.

use crate::state::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transport-assigned identifier of one live connection
pub type ConnectionId = String;

/// Default `type` of a message envelope
pub const DEFAULT_MESSAGE_TYPE: &str = "text";

/// Frames sent by clients
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Claim an identity for this connection
    #[serde(rename = "identify")]
    Identify(IdentifyRequest),
    /// Send a direct or broadcast message
    #[serde(rename = "message")]
    Message(MessageRequest),
    /// Report typing state
    #[serde(rename = "typing")]
    Typing(TypingRequest),
    /// Application-level keepalive
    #[serde(rename = "ping")]
    Ping,
}

/// Payload of [`ClientEvent::Identify`]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
    /// Identity to claim
    pub agent_id: AgentId,
    /// Display label, defaults to the agent id
    #[serde(default)]
    pub agent_name: Option<String>,
}

/// Payload of [`ClientEvent::Message`]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    /// Target agent id; broadcast when absent
    #[serde(default)]
    pub to: Option<AgentId>,
    /// Message body
    pub content: String,
    /// Application-defined message kind
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Payload of [`ClientEvent::Typing`]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypingRequest {
    /// Target agent id; all peers when absent
    #[serde(default)]
    pub to: Option<AgentId>,
    /// Whether the sender is typing
    pub is_typing: bool,
}

/// Frames sent by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// An identity came online
    #[serde(rename = "agent:online")]
    AgentOnline(Presence),
    /// An identified connection went away
    #[serde(rename = "agent:offline")]
    AgentOffline(Offline),
    /// Delivered message
    #[serde(rename = "message")]
    Message(Envelope),
    /// Acknowledgement to the sender of a direct message
    #[serde(rename = "message:sent")]
    MessageSent(Envelope),
    /// Typing indicator
    #[serde(rename = "typing")]
    Typing(TypingIndicator),
    /// Reply to [`ClientEvent::Ping`]
    #[serde(rename = "pong")]
    Pong,
}

/// Payload of `agent:online`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    /// Identity that came online
    pub agent_id: AgentId,
    /// Its display label
    pub agent_name: String,
}

/// Payload of `agent:offline`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Offline {
    /// Identity that went offline
    pub agent_id: AgentId,
}

/// Routed message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Unique message id
    pub id: String,
    /// Sender's agent id, or its connection id when anonymous
    pub from: String,
    /// Sender's display label
    pub from_name: String,
    /// Target agent id for direct messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<AgentId>,
    /// Message body
    pub content: String,
    /// Message kind
    #[serde(rename = "type")]
    pub kind: String,
    /// When the envelope was built
    pub timestamp: DateTime<Utc>,
}

/// Transient typing state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypingIndicator {
    /// Who is typing
    pub agent_id: String,
    /// Their display label
    pub agent_name: String,
    /// Current state
    pub is_typing: bool,
}

/// One identified connection
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEntry {
    /// Transport connection id
    pub connection_id: ConnectionId,
    /// Claimed identity
    pub agent_id: AgentId,
    /// Display label
    pub agent_name: String,
    /// When the connection was opened
    pub connected_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identify() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"identify","data":{"agentId":"A"}}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::Identify(IdentifyRequest {
                agent_id: "A".to_string(),
                agent_name: None,
            })
        );
    }

    #[test]
    fn test_parse_message_with_type() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"event":"message","data":{"to":"B","content":"hi","type":"command"}}"#,
        )
        .unwrap();
        match event {
            ClientEvent::Message(req) => {
                assert_eq!(req.to.as_deref(), Some("B"));
                assert_eq!(req.kind.as_deref(), Some("command"));
            }
            other => panic!("Expected message, got: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ping_without_data() {
        let event: ClientEvent = serde_json::from_str(r#"{"event":"ping"}"#).unwrap();
        assert_eq!(event, ClientEvent::Ping);
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"event":"shout","data":{}}"#).is_err());
    }

    #[test]
    fn test_server_event_names() {
        let online = ServerEvent::AgentOnline(Presence {
            agent_id: "A".to_string(),
            agent_name: "Alpha".to_string(),
        });
        let json = serde_json::to_value(&online).unwrap();
        assert_eq!(json["event"], "agent:online");
        assert_eq!(json["data"]["agentName"], "Alpha");

        let offline = serde_json::to_value(ServerEvent::AgentOffline(Offline {
            agent_id: "A".to_string(),
        }))
        .unwrap();
        assert_eq!(offline["event"], "agent:offline");
    }

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = Envelope {
            id: "m1".to_string(),
            from: "A".to_string(),
            from_name: "Alpha".to_string(),
            to: None,
            content: "hi".to_string(),
            kind: DEFAULT_MESSAGE_TYPE.to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(ServerEvent::MessageSent(envelope)).unwrap();
        assert_eq!(json["event"], "message:sent");
        assert_eq!(json["data"]["fromName"], "Alpha");
        assert_eq!(json["data"]["type"], "text");
        assert!(json["data"].get("to").is_none());
    }
}
