// Application state
// Bundles the independently locked components shared by every handler

use crate::chat::ConversationLog;
use crate::config::Config;
use crate::hub::Hub;
use crate::state::registry::AgentRegistry;
use std::sync::Arc;

/// State shared by HTTP and WebSocket handlers
pub type SharedState = Arc<AppState>;

/// Main application state
///
/// Each component owns and locks its own storage; there is no lock around
/// the bundle itself.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Config,
    /// Agent records and lifecycle
    pub registry: AgentRegistry,
    /// Per-agent conversation history
    pub chat: ConversationLog,
    /// Real-time presence and messaging
    pub hub: Hub,
}

impl AppState {
    /// Build all components from `config`
    pub fn new(config: Config) -> Self {
        let registry = AgentRegistry::new(config.registry.clone());
        let chat = ConversationLog::new(config.chat.clone());
        let hub = Hub::with_registry(registry.clone());
        Self {
            config,
            registry,
            chat,
            hub,
        }
    }

    /// Wrap into the shared handle used as router state
    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
