//! Process-wide operational counters, independent of any single room.
//!
//! Mirrors the teacher's `ServerMetrics` (atomics behind an `Arc`, a
//! serializable snapshot, and a Prometheus text renderer) trimmed to the
//! counters this game actually has: connections, room lifecycle, round
//! outcomes, and audio-gate traffic.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters, cheap to clone behind an `Arc` and safe to update from
/// any task without locking.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    pub total_connections: AtomicU64,
    pub active_connections: AtomicU64,
    pub rooms_created: AtomicU64,
    pub rooms_destroyed: AtomicU64,
    pub room_creation_failures: AtomicU64,
    pub room_join_failures: AtomicU64,
    pub rounds_started: AtomicU64,
    pub correct_buzzes: AtomicU64,
    pub wrong_buzzes: AtomicU64,
    pub no_song_claims_correct: AtomicU64,
    pub no_song_claims_wrong: AtomicU64,
    pub games_completed: AtomicU64,
    pub audio_requests_served: AtomicU64,
    pub audio_requests_rejected: AtomicU64,
    pub malformed_frames_dropped: AtomicU64,
}

impl ServerMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(counter: &AtomicU64) {
        counter.fetch_sub(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            rooms_created: self.rooms_created.load(Ordering::Relaxed),
            rooms_destroyed: self.rooms_destroyed.load(Ordering::Relaxed),
            room_creation_failures: self.room_creation_failures.load(Ordering::Relaxed),
            room_join_failures: self.room_join_failures.load(Ordering::Relaxed),
            rounds_started: self.rounds_started.load(Ordering::Relaxed),
            correct_buzzes: self.correct_buzzes.load(Ordering::Relaxed),
            wrong_buzzes: self.wrong_buzzes.load(Ordering::Relaxed),
            no_song_claims_correct: self.no_song_claims_correct.load(Ordering::Relaxed),
            no_song_claims_wrong: self.no_song_claims_wrong.load(Ordering::Relaxed),
            games_completed: self.games_completed.load(Ordering::Relaxed),
            audio_requests_served: self.audio_requests_served.load(Ordering::Relaxed),
            audio_requests_rejected: self.audio_requests_rejected.load(Ordering::Relaxed),
            malformed_frames_dropped: self.malformed_frames_dropped.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time, `Serialize`-able copy of [`ServerMetrics`] for the
/// `/metrics` JSON endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MetricsSnapshot {
    pub total_connections: u64,
    pub active_connections: u64,
    pub rooms_created: u64,
    pub rooms_destroyed: u64,
    pub room_creation_failures: u64,
    pub room_join_failures: u64,
    pub rounds_started: u64,
    pub correct_buzzes: u64,
    pub wrong_buzzes: u64,
    pub no_song_claims_correct: u64,
    pub no_song_claims_wrong: u64,
    pub games_completed: u64,
    pub audio_requests_served: u64,
    pub audio_requests_rejected: u64,
    pub malformed_frames_dropped: u64,
}

impl MetricsSnapshot {
    /// Renders the snapshot into Prometheus text exposition format.
    #[must_use]
    pub fn render_prometheus(&self) -> String {
        use std::fmt::Write;

        fn counter(buf: &mut String, name: &str, help: &str, value: u64) {
            let _ = writeln!(buf, "# HELP {name} {help}");
            let _ = writeln!(buf, "# TYPE {name} counter");
            let _ = writeln!(buf, "{name} {value}");
        }

        fn gauge(buf: &mut String, name: &str, help: &str, value: u64) {
            let _ = writeln!(buf, "# HELP {name} {help}");
            let _ = writeln!(buf, "# TYPE {name} gauge");
            let _ = writeln!(buf, "{name} {value}");
        }

        let mut buf = String::new();
        counter(
            &mut buf,
            "karuta_connections_total",
            "Total WebSocket connections accepted",
            self.total_connections,
        );
        gauge(
            &mut buf,
            "karuta_connections_active",
            "Currently open WebSocket connections",
            self.active_connections,
        );
        counter(
            &mut buf,
            "karuta_rooms_created_total",
            "Rooms created",
            self.rooms_created,
        );
        counter(
            &mut buf,
            "karuta_rooms_destroyed_total",
            "Rooms destroyed after their last player left",
            self.rooms_destroyed,
        );
        counter(
            &mut buf,
            "karuta_room_creation_failures_total",
            "create_room requests rejected (registry full)",
            self.room_creation_failures,
        );
        counter(
            &mut buf,
            "karuta_room_join_failures_total",
            "join_room requests rejected (not found, full, or name taken)",
            self.room_join_failures,
        );
        counter(
            &mut buf,
            "karuta_rounds_started_total",
            "Rounds entering the prepare phase",
            self.rounds_started,
        );
        counter(
            &mut buf,
            "karuta_correct_buzzes_total",
            "Buzzes that matched the current song",
            self.correct_buzzes,
        );
        counter(
            &mut buf,
            "karuta_wrong_buzzes_total",
            "Buzzes that did not match the current song",
            self.wrong_buzzes,
        );
        counter(
            &mut buf,
            "karuta_no_song_correct_total",
            "Correct ghost-song claims",
            self.no_song_claims_correct,
        );
        counter(
            &mut buf,
            "karuta_no_song_wrong_total",
            "Incorrect ghost-song claims",
            self.no_song_claims_wrong,
        );
        counter(
            &mut buf,
            "karuta_games_completed_total",
            "Games reaching game_over",
            self.games_completed,
        );
        counter(
            &mut buf,
            "karuta_audio_requests_served_total",
            "Audio gate requests served",
            self.audio_requests_served,
        );
        counter(
            &mut buf,
            "karuta_audio_requests_rejected_total",
            "Audio gate requests rejected (idle room or missing asset)",
            self.audio_requests_rejected,
        );
        counter(
            &mut buf,
            "karuta_malformed_frames_dropped_total",
            "Inbound frames dropped for failing to parse or naming an unknown type",
            self.malformed_frames_dropped,
        );
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments() {
        let metrics = ServerMetrics::new();
        ServerMetrics::inc(&metrics.rooms_created);
        ServerMetrics::inc(&metrics.rooms_created);
        ServerMetrics::inc(&metrics.active_connections);
        ServerMetrics::dec(&metrics.active_connections);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rooms_created, 2);
        assert_eq!(snapshot.active_connections, 0);
    }

    #[test]
    fn prometheus_rendering_contains_expected_metric_names() {
        let metrics = ServerMetrics::new();
        let rendered = metrics.snapshot().render_prometheus();
        assert!(rendered.contains("karuta_rooms_created_total"));
        assert!(rendered.contains("karuta_audio_requests_served_total"));
    }
}
