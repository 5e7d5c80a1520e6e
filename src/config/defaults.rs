//! Default value functions for configuration fields.
//!
//! Organized by category, used by serde's `#[serde(default = ...)]` attributes
//! throughout the configuration system.

use super::logging::LogFormat;

// =============================================================================
// Port & root config
// =============================================================================

pub const fn default_port() -> u16 {
    3536
}

pub fn default_catalogue_path() -> String {
    "songs.json".to_string()
}

pub fn default_assets_dir() -> String {
    "assets".to_string()
}

// =============================================================================
// Server / room defaults
// =============================================================================

pub const fn default_max_players() -> u8 {
    4
}

pub const fn default_max_song_pool() -> usize {
    25
}

pub const fn default_board_size() -> usize {
    16
}

pub const fn default_prepare_timeout_secs() -> u64 {
    5
}

pub const fn default_countdown_secs() -> u64 {
    4
}

pub const fn default_round_timeout_secs() -> u64 {
    90
}

pub const fn default_inter_round_delay_secs() -> u64 {
    3
}

pub const fn default_room_cleanup_interval_secs() -> u64 {
    60
}

pub const fn default_max_rooms() -> usize {
    1000
}

pub const fn default_send_timeout_secs() -> u64 {
    5
}

// =============================================================================
// Scoring defaults
// =============================================================================

pub const fn default_correct_buzz_points() -> i64 {
    10
}

pub const fn default_wrong_buzz_points() -> i64 {
    -5
}

pub const fn default_correct_no_song_points() -> i64 {
    5
}

pub const fn default_wrong_no_song_points() -> i64 {
    -5
}

// =============================================================================
// Protocol / validation defaults
// =============================================================================

pub const fn default_max_player_name_length() -> usize {
    32
}

pub const fn default_room_id_length() -> usize {
    4
}

// =============================================================================
// Security / HTTP defaults
// =============================================================================

pub fn default_cors_origins() -> String {
    "*".to_string()
}

pub const fn default_max_message_size() -> usize {
    65536 // 64KB
}

// =============================================================================
// Logging defaults
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "server.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    false
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
