//! HTTP/WebSocket surface configuration: CORS and frame limits.

use super::defaults::{default_cors_origins, default_max_message_size};
use serde::{Deserialize, Serialize};

/// Security-adjacent configuration for the HTTP/WebSocket surface.
///
/// The game itself has no authentication (see spec Non-goals); this only
/// bounds what an anonymous client can do to the transport.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    /// Comma-separated list of allowed CORS origins, or `"*"` for permissive CORS.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
    /// Maximum accepted inbound WebSocket text frame size, in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: default_cors_origins(),
            max_message_size: default_max_message_size(),
        }
    }
}
