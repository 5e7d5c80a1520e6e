#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use karuta_referee_server::catalogue::Catalogue;
use karuta_referee_server::config::{self, validate_config};
use karuta_referee_server::logging;
use karuta_referee_server::websocket::{create_router, AppState};

/// The authoritative referee server for a real-time music-identification party game.
#[derive(Parser, Debug)]
#[command(name = "karuta-referee-server")]
#[command(about = "Authoritative referee server for a real-time music-identification party game")]
#[command(version)]
struct Cli {
    /// Validate configuration and the song catalogue, then exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration as JSON and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load();

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    if let Err(err) = validate_config(&cfg) {
        if cli.validate_config {
            eprintln!("Configuration validation failed:\n{err}");
            std::process::exit(1);
        }
        return Err(err);
    }

    // A catalogue that cannot be parsed or is empty is a startup error: a
    // server with no songs can never run a single round (SPEC_FULL §9).
    let catalogue = match Catalogue::load(&cfg.catalogue_path) {
        Ok(catalogue) => catalogue,
        Err(err) => {
            if cli.validate_config {
                eprintln!("Catalogue validation failed:\n{err}");
                std::process::exit(1);
            }
            return Err(anyhow::anyhow!(err));
        }
    };

    if cli.validate_config {
        println!("Configuration validation passed");
        println!();
        println!("Configuration summary:");
        println!("  Port: {}", cfg.port);
        println!("  Catalogue: {} songs ({})", catalogue.len(), cfg.catalogue_path);
        println!("  Assets directory: {}", cfg.assets_dir);
        println!("  Max players per room: {}", cfg.server.max_players);
        println!("  Max song pool: {}", cfg.server.max_song_pool);
        println!("  Board size: {}", cfg.server.board_size);
        return Ok(());
    }

    logging::init_with_config(&cfg.logging);

    let port = cfg.port;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let state = AppState::new(Arc::new(cfg.clone()), Arc::new(catalogue));
    let app = create_router(&cfg.security.cors_origins).with_state(state.clone());

    spawn_cleanup_task(state.clone());

    tracing::info!(%addr, catalogue_path = %cfg.catalogue_path, "starting karuta referee server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Periodic backstop sweeping any room left empty by a connection task that
/// never ran its own cleanup (see [`karuta_referee_server::room::RoomRegistry::sweep_empty_rooms`]).
fn spawn_cleanup_task(state: Arc<AppState>) {
    let interval_secs = state.config.server.room_cleanup_interval_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        interval.tick().await; // first tick fires immediately; skip it
        loop {
            interval.tick().await;
            let removed = state.registry.sweep_empty_rooms().await;
            if removed > 0 {
                tracing::info!(removed, "cleanup task removed stale empty rooms");
            }
        }
    });
}

#[cfg(test)]
mod cli_tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn default_parses_with_no_flags() {
        let cli = Cli::try_parse_from(["karuta-referee-server"]).unwrap();
        assert!(!cli.validate_config);
        assert!(!cli.print_config);
    }

    #[test]
    fn validate_config_and_print_config_conflict() {
        let result = Cli::try_parse_from([
            "karuta-referee-server",
            "--validate-config",
            "--print-config",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn validate_config_short_flag() {
        let cli = Cli::try_parse_from(["karuta-referee-server", "-c"]).unwrap();
        assert!(cli.validate_config);
    }
}
