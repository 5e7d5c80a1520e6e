//! Per-room state: players, board, song pool, and the round phase.
//!
//! [`Room`] pairs a room id with a [`tokio::sync::Mutex`]-guarded [`RoomInner`]
//! plus the config and catalogue it needs to run a game, so a background timer
//! task only needs an `Arc<Room>` to do its work. See [`crate::room::scheduler`]
//! for the state machine that mutates this state.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};

use crate::catalogue::{Catalogue, Song};
use crate::config::ServerConfig;
use crate::metrics::ServerMetrics;
use crate::protocol::{Card, PlayerId, PlayerView, RoomId, ServerMessage};

/// Outbound channel into a connected client's send task.
pub type PlayerSender = mpsc::Sender<Arc<ServerMessage>>;

#[derive(Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: i64,
    pub has_answered: bool,
    pub game_ready: bool,
    pub is_ready: bool,
    pub sender: PlayerSender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Waiting,
    Playing,
}

/// The active round's phase. `Ended` doubles as both the brief inter-round
/// marker and the game-over terminal state — `restart_game`'s precondition is
/// simply "currently `Ended`" (see spec §4.2 dispatch table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Preparing,
    Countdown,
    Playing,
    Ended,
}

pub struct RoomInner {
    pub owner_id: PlayerId,
    pub players: HashMap<PlayerId, Player>,
    /// Join order, oldest first; used to pick a successor when the owner leaves.
    pub join_order: Vec<PlayerId>,
    pub phase: GamePhase,
    pub round_phase: RoundPhase,
    pub current_round: u32,
    /// Sampled subset of the catalogue for this game; superset of the board.
    /// Never revealed to clients directly.
    pub song_pool: Vec<Song>,
    pub board_cards: Vec<Card>,
    pub current_song_index: Option<usize>,
    /// Bumped on every transition that supersedes an armed timer; see the
    /// generation check in [`crate::room::scheduler`].
    pub timer_generation: u64,
}

impl RoomInner {
    pub fn player_views(&self) -> Vec<PlayerView> {
        self.players
            .values()
            .map(|p| PlayerView {
                id: p.id.clone(),
                name: p.name.clone(),
                score: p.score,
                has_answered: p.has_answered,
                game_ready: p.game_ready,
            })
            .collect()
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.current_song_index.map(|idx| &self.song_pool[idx])
    }
}

pub struct Room {
    pub id: RoomId,
    pub config: Arc<ServerConfig>,
    pub catalogue: Arc<Catalogue>,
    pub metrics: Arc<ServerMetrics>,
    pub inner: Mutex<RoomInner>,
}

impl Room {
    pub fn new(
        id: RoomId,
        config: Arc<ServerConfig>,
        catalogue: Arc<Catalogue>,
        metrics: Arc<ServerMetrics>,
        owner_id: PlayerId,
        owner_name: String,
        owner_sender: PlayerSender,
    ) -> Arc<Self> {
        let owner = Player {
            id: owner_id.clone(),
            name: owner_name,
            score: 0,
            has_answered: false,
            game_ready: false,
            is_ready: false,
            sender: owner_sender,
        };
        let mut players = HashMap::with_capacity(config.max_players as usize);
        players.insert(owner_id.clone(), owner);

        Arc::new(Self {
            id,
            config,
            catalogue,
            metrics,
            inner: Mutex::new(RoomInner {
                owner_id: owner_id.clone(),
                players,
                join_order: vec![owner_id],
                phase: GamePhase::Waiting,
                round_phase: RoundPhase::Ended,
                current_round: 0,
                song_pool: Vec::new(),
                board_cards: Vec::new(),
                current_song_index: None,
                timer_generation: 0,
            }),
        })
    }

    /// Fans a message out to every current member. Sends are non-blocking
    /// `try_send`s into each client's buffered channel; a full channel (a
    /// stalled client) drops the message rather than stalling this broadcast,
    /// matching the per-write send timeout owned by that client's send task.
    pub fn send_all(&self, inner: &RoomInner, message: ServerMessage) {
        let message = Arc::new(message);
        for player in inner.players.values() {
            let _ = player.sender.try_send(Arc::clone(&message));
        }
    }
}
