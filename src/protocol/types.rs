//! Wire-level value types shared between client and server messages.

use serde::{Deserialize, Serialize};

/// A player id is asserted by the client at connect time (see spec Non-goals:
/// no authentication). The server trusts it only as a map key.
pub type PlayerId = String;

/// A room id is a zero-padded 4-digit decimal string, e.g. `"1234"`.
pub type RoomId = String;

/// A title card on the 16-card board. `is_matched` is the only mutable field;
/// it flips false -> true at most once per game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub title_original: String,
    pub title_translation: String,
    pub is_matched: bool,
}

/// The subset of a song's identity revealed to clients once a round ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongTitle {
    pub id: String,
    pub title_original: String,
    pub title_translation: String,
}

impl From<&crate::catalogue::Song> for SongTitle {
    fn from(song: &crate::catalogue::Song) -> Self {
        Self {
            id: song.id.clone(),
            title_original: song.title_original.clone(),
            title_translation: song.title_translation.clone(),
        }
    }
}

/// A player's state as broadcast inside `room_state_update` / `game_over`.
/// Deliberately excludes `is_ready` (a transport-facing buffering ack never
/// asked for on the board) and the outbound sender (not client-visible).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub score: i64,
    pub has_answered: bool,
    pub game_ready: bool,
}
