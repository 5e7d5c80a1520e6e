//! Configuration validation.

use super::Config;

/// Validate a loaded configuration, rejecting combinations that would make
/// the server unable to ever run a round.
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    if config.server.max_players == 0 {
        anyhow::bail!("server.max_players must be at least 1");
    }
    if config.server.board_size == 0 {
        anyhow::bail!("server.board_size must be at least 1");
    }
    if config.server.max_song_pool < config.server.board_size {
        anyhow::bail!(
            "server.max_song_pool ({}) must be >= server.board_size ({})",
            config.server.max_song_pool,
            config.server.board_size
        );
    }
    if config.catalogue_path.trim().is_empty() {
        anyhow::bail!("catalogue_path must not be empty");
    }
    if config.assets_dir.trim().is_empty() {
        anyhow::bail!("assets_dir must not be empty");
    }
    if config.port == 0 {
        anyhow::bail!("port must be nonzero");
    }
    Ok(())
}

/// Detect if we're running in production mode, via well-known environment variables.
#[must_use]
pub fn is_production_mode() -> bool {
    use std::env;

    if let Ok(mode) = env::var("CARD_WS__ENVIRONMENT") {
        return mode.eq_ignore_ascii_case("production") || mode.eq_ignore_ascii_case("prod");
    }

    env::var("CARD_WS_PRODUCTION").is_ok() || env::var("PRODUCTION").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn rejects_pool_smaller_than_board() {
        let mut config = Config::default();
        config.server.max_song_pool = 4;
        config.server.board_size = 16;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_empty_catalogue_path() {
        let mut config = Config::default();
        config.catalogue_path = String::new();
        assert!(validate_config(&config).is_err());
    }
}
