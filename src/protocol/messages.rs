//! The JSON envelope protocol: `{"type": <string>, "payload": <object>}`.

use serde::{Deserialize, Serialize};

use super::types::{Card, PlayerId, PlayerView, RoomId, SongTitle};

/// Messages a client may send. Unknown `type` values fail to deserialize into
/// this enum; the connection handler treats that as a silently-dropped frame
/// per the error taxonomy, never as a connection-ending error.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        #[serde(rename = "playerName")]
        player_name: String,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(rename = "playerName")]
        player_name: String,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    ToggleReady {},
    StartGame {},
    RestartGame {},
    ClientReady {},
    Buzz {
        #[serde(rename = "cardId")]
        card_id: String,
    },
    NoSong {},
    Chat {
        text: String,
    },
    Ping {},
}

/// Messages the server may send. `round_end.correct_song` is populated even
/// when `show_answer` is false — the round is already over by the time this
/// frame goes out, so revealing the title here does not leak the answer
/// during an active round (see Audio Gate, the only in-round leak point).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    RoomCreated {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },
    RoomStateUpdate {
        players: Vec<PlayerView>,
        #[serde(rename = "ownerId")]
        owner_id: PlayerId,
    },
    ChatReceive {
        sender: String,
        text: String,
    },
    GameStarted {
        cards: Vec<Card>,
        round: u32,
    },
    PrepareRound {
        round: u32,
        #[serde(rename = "startTime")]
        start_time: u32,
        #[serde(rename = "playDuration")]
        play_duration: u32,
    },
    CountdownStart {},
    PlayRound {},
    WrongAnswer {},
    RoundEnd {
        reason: String,
        #[serde(rename = "correctSong")]
        correct_song: SongTitle,
        cards: Vec<Card>,
        #[serde(rename = "showAnswer")]
        show_answer: bool,
    },
    GameOver {
        players: Vec<PlayerView>,
    },
    GameReset {},
    Error {
        message: String,
    },
}
