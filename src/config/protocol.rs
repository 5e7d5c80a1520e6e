//! Protocol-surface configuration: the bounds clients' asserted identity
//! values must satisfy. There is no authentication to configure (see spec
//! Non-goals) — only shape validation for names and room ids.

use super::defaults::{default_max_player_name_length, default_room_id_length};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProtocolConfig {
    /// Maximum length, in characters, for an asserted player name.
    #[serde(default = "default_max_player_name_length")]
    pub max_player_name_length: usize,
    /// Number of ASCII digits a room id must contain (see spec §9: 4-digit ids).
    #[serde(default = "default_room_id_length")]
    pub room_id_length: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_player_name_length: default_max_player_name_length(),
            room_id_length: default_room_id_length(),
        }
    }
}
