//! Server behavior configuration: room limits, round timings, and scoring.

use super::defaults::{
    default_board_size, default_correct_buzz_points, default_correct_no_song_points,
    default_countdown_secs, default_inter_round_delay_secs, default_max_players,
    default_max_rooms, default_max_song_pool, default_prepare_timeout_secs,
    default_room_cleanup_interval_secs, default_round_timeout_secs, default_send_timeout_secs,
    default_wrong_buzz_points, default_wrong_no_song_points,
};
use serde::{Deserialize, Serialize};

/// Server configuration for room lifecycle, round timing, and scoring.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Maximum players per room.
    #[serde(default = "default_max_players")]
    pub max_players: u8,
    /// Maximum songs sampled into a room's song pool.
    #[serde(default = "default_max_song_pool")]
    pub max_song_pool: usize,
    /// Number of cards dealt onto the board.
    #[serde(default = "default_board_size")]
    pub board_size: usize,
    /// Prepare-phase timeout before countdown starts unconditionally (seconds).
    #[serde(default = "default_prepare_timeout_secs")]
    pub prepare_timeout_secs: u64,
    /// Fixed countdown duration before playback begins (seconds).
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u64,
    /// Round timeout if no one answers (seconds).
    #[serde(default = "default_round_timeout_secs")]
    pub round_timeout_secs: u64,
    /// Fixed pause between round end and the next prepare phase (seconds).
    #[serde(default = "default_inter_round_delay_secs")]
    pub inter_round_delay_secs: u64,
    /// Interval for the idle-room sweep task (seconds).
    #[serde(default = "default_room_cleanup_interval_secs")]
    pub room_cleanup_interval_secs: u64,
    /// Maximum concurrently live rooms.
    #[serde(default = "default_max_rooms")]
    pub max_rooms: usize,
    /// Per-write send deadline before a client is treated as disconnected (seconds).
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
    /// Scoring configuration.
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_players: default_max_players(),
            max_song_pool: default_max_song_pool(),
            board_size: default_board_size(),
            prepare_timeout_secs: default_prepare_timeout_secs(),
            countdown_secs: default_countdown_secs(),
            round_timeout_secs: default_round_timeout_secs(),
            inter_round_delay_secs: default_inter_round_delay_secs(),
            room_cleanup_interval_secs: default_room_cleanup_interval_secs(),
            max_rooms: default_max_rooms(),
            send_timeout_secs: default_send_timeout_secs(),
            scoring: ScoringConfig::default(),
        }
    }
}

/// Point deltas applied for each scoring action (see spec §4.4).
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub struct ScoringConfig {
    #[serde(default = "default_correct_buzz_points")]
    pub correct_buzz: i64,
    #[serde(default = "default_wrong_buzz_points")]
    pub wrong_buzz: i64,
    #[serde(default = "default_correct_no_song_points")]
    pub correct_no_song: i64,
    #[serde(default = "default_wrong_no_song_points")]
    pub wrong_no_song: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            correct_buzz: default_correct_buzz_points(),
            wrong_buzz: default_wrong_buzz_points(),
            correct_no_song: default_correct_no_song_points(),
            wrong_no_song: default_wrong_no_song_points(),
        }
    }
}
