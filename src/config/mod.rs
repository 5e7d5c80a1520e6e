//! Configuration for the karuta referee server.
//!
//! Layered precedence (highest first): `CARD_WS_CONFIG_JSON` env var >
//! `CARD_WS_CONFIG_PATH` file > `config.json` in the working directory >
//! compiled-in defaults, then per-field `CARD_WS__...` env overrides. See
//! [`loader::load`] for the full precedence rule and env var grammar.
//!
//! # Module structure
//!
//! - [`types`]: the root [`Config`] struct
//! - [`server`]: room limits, round timings, and scoring
//! - [`protocol`]: bounds on client-asserted names and room ids
//! - [`security`]: CORS and frame-size limits for the HTTP/WebSocket surface
//! - [`logging`]: `tracing` initialisation settings
//! - [`loader`]: configuration loading and merging
//! - [`validation`]: post-load sanity checks
//! - [`defaults`]: default value functions referenced by `#[serde(default = ...)]`

pub mod defaults;
pub mod loader;
pub mod logging;
pub mod protocol;
pub mod security;
pub mod server;
pub mod types;
pub mod validation;

pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use protocol::ProtocolConfig;
pub use security::SecurityConfig;
pub use server::{ScoringConfig, ServerConfig};
pub use types::Config;
pub use validation::{is_production_mode, validate_config};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config.port, deserialized.port);
        assert_eq!(config.server.max_players, deserialized.server.max_players);
        assert_eq!(config.catalogue_path, deserialized.catalogue_path);
    }

    #[test]
    fn default_config_values_match_spec() {
        let config = Config::default();
        assert_eq!(config.server.max_players, 4);
        assert_eq!(config.server.max_song_pool, 25);
        assert_eq!(config.server.board_size, 16);
        assert_eq!(config.server.prepare_timeout_secs, 5);
        assert_eq!(config.server.countdown_secs, 4);
        assert_eq!(config.server.round_timeout_secs, 90);
        assert_eq!(config.server.inter_round_delay_secs, 3);
        assert_eq!(config.server.scoring.correct_buzz, 10);
        assert_eq!(config.server.scoring.wrong_buzz, -5);
        assert_eq!(config.server.scoring.correct_no_song, 5);
        assert_eq!(config.server.scoring.wrong_no_song, -5);
    }
}
