//! The audio gate: the only HTTP surface that can leak the answer to a
//! round. Serves the current song's bytes for a room only while a round is
//! actually active (spec §4.5) — never between rounds, never for an idle or
//! unknown room.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::metrics::ServerMetrics;
use crate::room::RoundPhase;

use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AudioQuery {
    #[serde(rename = "roomId")]
    room_id: String,
    /// Cache-busting nonce. Intentionally unvalidated (spec §4.5: "not
    /// validated", its only job is defeating an intermediate HTTP cache).
    #[allow(dead_code)]
    t: Option<String>,
}

pub async fn audio_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AudioQuery>,
) -> Response {
    let Some(room) = state.registry.get(&query.room_id) else {
        ServerMetrics::inc(&state.metrics.audio_requests_rejected);
        return StatusCode::NOT_FOUND.into_response();
    };

    let song_id = {
        let inner = room.inner.lock().await;
        let active = matches!(
            inner.round_phase,
            RoundPhase::Preparing | RoundPhase::Countdown | RoundPhase::Playing
        );
        if !active {
            None
        } else {
            inner.current_song().map(|song| song.id.clone())
        }
    };

    let Some(song_id) = song_id else {
        ServerMetrics::inc(&state.metrics.audio_requests_rejected);
        return StatusCode::NOT_FOUND.into_response();
    };

    match resolve_asset(&state.config.assets_dir, &song_id).await {
        Some((bytes, content_type)) => {
            ServerMetrics::inc(&state.metrics.audio_requests_served);
            (
                [
                    (header::CONTENT_TYPE, content_type),
                    (
                        header::CACHE_CONTROL,
                        "no-store, no-cache, must-revalidate".to_string(),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        None => {
            ServerMetrics::inc(&state.metrics.audio_requests_rejected);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Asset filenames are `<id>.<ext>` under the configured assets directory;
/// the extension is resolved by probing for the first matching file (spec
/// §6: "extension resolved by probing the directory").
async fn resolve_asset(assets_dir: &str, song_id: &str) -> Option<(Vec<u8>, String)> {
    let mut entries = tokio::fs::read_dir(assets_dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.file_stem().and_then(|s| s.to_str()) != Some(song_id) {
            continue;
        }
        let content_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(content_type_for_extension)
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = tokio::fs::read(&path).await.ok()?;
        return Some((bytes, content_type));
    }
    None
}

fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "opus" => "audio/opus",
        _ => "application/octet-stream",
    }
}
