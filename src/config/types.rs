//! Root configuration types.

use super::defaults::{default_assets_dir, default_catalogue_path, default_port};
use super::logging::LoggingConfig;
use super::protocol::ProtocolConfig;
use super::security::SecurityConfig;
use super::server::ServerConfig;
use serde::{Deserialize, Serialize};

/// Root configuration struct for the referee server.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// TCP port serving both the WebSocket channel and the HTTP endpoints.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path to the song catalogue JSON file, loaded once at startup.
    #[serde(default = "default_catalogue_path")]
    pub catalogue_path: String,
    /// Directory holding audio assets, named `<song id>.<ext>`.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            catalogue_path: default_catalogue_path(),
            assets_dir: default_assets_dir(),
            server: ServerConfig::default(),
            protocol: ProtocolConfig::default(),
            logging: LoggingConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}
