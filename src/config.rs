//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Agent registry timing and presentation settings
    pub registry: RegistryConfig,
    /// Conversation log settings
    pub chat: ChatConfig,
    /// Real-time hub settings
    pub hub: HubConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Agent registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Delay between spawn and the `running` transition
    pub running_delay: Duration,
    /// Delay between spawn and the terminal transition
    pub completion_delay: Duration,
    /// Model assigned when a spawn request does not name one
    pub default_model: String,
    /// Maximum characters of `result` shown in list views
    pub result_preview_chars: usize,
}

/// Conversation log configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Delay before the simulated agent reply is appended
    pub reply_delay: Duration,
    /// Maximum characters of the user message quoted in the reply
    pub reply_quote_chars: usize,
    /// Default number of messages returned by history queries
    pub history_limit: usize,
}

/// Hub configuration
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Interval between keepalive pings on each WebSocket
    pub ping_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            running_delay: Duration::from_millis(2_000),
            completion_delay: Duration::from_millis(10_000),
            default_model: "sonnet".to_string(),
            result_preview_chars: 200,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reply_delay: Duration::from_millis(1_000),
            reply_quote_chars: 50,
            history_limit: 100,
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset or invalid
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_millis(key: &str, default: Duration) -> Duration {
    Duration::from_millis(env_or(key, default.as_millis() as u64))
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Self {
            server: ServerConfig {
                port: env_or("PORT", defaults.server.port),
                host: env::var("HOST").unwrap_or(defaults.server.host),
            },
            registry: RegistryConfig {
                running_delay: env_millis(
                    "AGENT_RUNNING_DELAY_MS",
                    defaults.registry.running_delay,
                ),
                completion_delay: env_millis(
                    "AGENT_COMPLETION_DELAY_MS",
                    defaults.registry.completion_delay,
                ),
                default_model: env::var("AGENT_DEFAULT_MODEL")
                    .ok()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(defaults.registry.default_model),
                result_preview_chars: env_or(
                    "AGENT_RESULT_PREVIEW_CHARS",
                    defaults.registry.result_preview_chars,
                ),
            },
            chat: ChatConfig {
                reply_delay: env_millis("CHAT_REPLY_DELAY_MS", defaults.chat.reply_delay),
                reply_quote_chars: env_or(
                    "CHAT_REPLY_QUOTE_CHARS",
                    defaults.chat.reply_quote_chars,
                ),
                history_limit: env_or("CHAT_HISTORY_LIMIT", defaults.chat.history_limit),
            },
            hub: HubConfig {
                // Zero would spin the ping task
                ping_interval: Duration::from_secs(
                    env_or("WS_PING_INTERVAL_SECS", defaults.hub.ping_interval.as_secs()).max(1),
                ),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
