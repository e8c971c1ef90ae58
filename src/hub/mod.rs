//! Presence & messaging hub
//!
//! Tracks live real-time connections, the identities they claim, and routes
//! messages, typing indicators and presence events between them.

pub mod events;
pub mod presence;

pub use events::{ClientEvent, ConnectionEntry, ConnectionId, Envelope, ServerEvent};
pub use presence::{Delivery, Hub};
