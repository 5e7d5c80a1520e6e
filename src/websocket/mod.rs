//! WebSocket upgrade handling, the per-connection dispatch loop, the audio
//! gate, and the operational HTTP surface.
//!
//! - [`state`]: `AppState` shared by every handler
//! - [`handler`]: the `/ws` upgrade entry point
//! - [`connection`]: the per-client receive/send task pair and dispatch
//! - [`audio`]: the `/audio` answer-leak gate
//! - [`metrics_routes`]: `/health`, `/metrics`, `/metrics/prom`
//! - [`routes`]: assembles the Axum router

pub mod audio;
pub mod connection;
pub mod handler;
pub mod metrics_routes;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
