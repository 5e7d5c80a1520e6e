#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # Karuta Referee Server
//!
//! The authoritative referee for a real-time music-identification party game.
//! Clients connect over a WebSocket, race to identify a song clip against a
//! shared board of title cards, and the server is the single source of truth
//! for room membership, round state, scoring, and the answer key.

/// The immutable song catalogue, loaded once at startup.
pub mod catalogue;

/// Server configuration and environment variable overrides.
pub mod config;

/// Structured logging initialisation.
pub mod logging;

/// Process-wide metrics counters.
pub mod metrics;

/// Wire protocol: message envelopes, value types, and validation.
pub mod protocol;

/// Room registry, round scheduler, and per-room state.
pub mod room;

/// WebSocket upgrade handling, connection dispatch, and the audio gate.
pub mod websocket;
