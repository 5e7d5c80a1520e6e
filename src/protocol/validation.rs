//! Input validation for client-asserted values.
//!
//! The game has no authentication (clients assert their own names and ids,
//! see spec Non-goals); validation here only bounds what a well-behaved
//! client is allowed to submit, matching the error taxonomy's "reject"
//! entries for room join.

use super::types::PlayerId;
use crate::config::ProtocolConfig;
use crate::room::state::Player;
use std::collections::HashMap;

/// Validates a player name against configured length/character rules.
pub fn validate_player_name(name: &str, config: &ProtocolConfig) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("player name cannot be empty".to_string());
    }
    if name.chars().count() > config.max_player_name_length {
        return Err(format!(
            "player name too long (max {} characters)",
            config.max_player_name_length
        ));
    }
    Ok(())
}

/// A room id must be exactly the configured number of ASCII digits.
pub fn validate_room_id(room_id: &str, config: &ProtocolConfig) -> Result<(), String> {
    if room_id.len() != config.room_id_length || !room_id.chars().all(|c| c.is_ascii_digit()) {
        return Err("room id must be a 4-digit code".to_string());
    }
    Ok(())
}

/// Player names must be unique within a room (case-sensitive, exact match on
/// the trimmed name), per the Player data model's uniqueness invariant.
pub fn validate_name_unique(
    name: &str,
    players: &HashMap<PlayerId, Player>,
) -> Result<(), String> {
    let trimmed = name.trim();
    if players.values().any(|p| p.name == trimmed) {
        return Err("name taken".to_string());
    }
    Ok(())
}
