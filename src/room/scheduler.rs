//! The round state machine: `waiting -> preparing -> countdown -> playing ->
//! ended -> (preparing | game over)`. Every public method here documents its
//! own locking contract — see module-level notes below — because mixing
//! "acquires the lock" and "expects the lock held" helpers is the single
//! easiest way to deadlock or double-lock a `tokio::sync::Mutex`.
//!
//! Locking contracts:
//! - Methods taking `&str` / owned args and no `inner` parameter acquire the
//!   room lock themselves (`join`, `toggle_ready`, `start_game`, `chat`,
//!   `handle_client_ready`, `handle_buzz`, `handle_no_song`, `restart_game`,
//!   `remove_player`).
//! - [`Room::end_round`] takes `&mut RoomInner` and must be called with the
//!   lock already held; it never locks.
//! - The countdown -> playing transition ([`Room::try_advance_to_countdown`])
//!   releases the lock across the fixed 4s sleep and reacquires it before
//!   mutating state.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use tokio::time::sleep;

use super::state::{GamePhase, Player, PlayerSender, Room, RoomInner, RoundPhase};
use crate::metrics::ServerMetrics;
use crate::protocol::{validate_name_unique, Card, PlayerId, ServerMessage, SongTitle};

impl Room {
    /// Acquires the lock. Rejects on a full room or a name clash; inserts the
    /// player otherwise. A player joining mid-game is marked `has_answered`
    /// for the round already in flight (resolved Open Question, spec §9) and
    /// privately receives a `game_started` snapshot.
    pub async fn join(
        self: &Arc<Self>,
        player_id: PlayerId,
        player_name: String,
        sender: PlayerSender,
    ) -> Result<(), super::errors::RoomError> {
        use super::errors::RoomError;

        let mut inner = self.inner.lock().await;
        if inner.players.len() >= self.config.max_players as usize {
            return Err(RoomError::RoomFull);
        }
        let trimmed = player_name.trim();
        if validate_name_unique(trimmed, &inner.players).is_err() {
            return Err(RoomError::NameTaken);
        }

        let mid_game = inner.phase == GamePhase::Playing;
        let player = Player {
            id: player_id.clone(),
            name: trimmed.to_string(),
            score: 0,
            has_answered: mid_game,
            game_ready: false,
            is_ready: false,
            sender: sender.clone(),
        };
        inner.join_order.push(player_id.clone());
        inner.players.insert(player_id, player);

        if mid_game {
            let snapshot = ServerMessage::GameStarted {
                cards: inner.board_cards.clone(),
                round: inner.current_round,
            };
            let _ = sender.try_send(Arc::new(snapshot));
        }

        let players = inner.player_views();
        let owner_id = inner.owner_id.clone();
        self.send_all(&inner, ServerMessage::RoomStateUpdate { players, owner_id });
        Ok(())
    }

    /// Acquires the lock. No-op outside the lobby or for the owner (the owner
    /// has no ready toggle; only non-owners gate `start_game`).
    pub async fn toggle_ready(self: &Arc<Self>, player_id: &str) {
        let mut inner = self.inner.lock().await;
        if inner.phase != GamePhase::Waiting || inner.owner_id == player_id {
            return;
        }
        match inner.players.get_mut(player_id) {
            Some(player) => player.game_ready = !player.game_ready,
            None => return,
        }
        let players = inner.player_views();
        let owner_id = inner.owner_id.clone();
        self.send_all(&inner, ServerMessage::RoomStateUpdate { players, owner_id });
    }

    /// Acquires the lock to sample the song pool and deal the board (spec
    /// §4.3), then releases it and calls [`Room::begin_prepare_phase`], which
    /// re-acquires it itself. Returns `false` (silent no-op) if the sender is
    /// not the owner, the room isn't waiting, or any non-owner isn't ready.
    pub async fn start_game(self: &Arc<Self>, player_id: &str) -> bool {
        {
            let mut inner = self.inner.lock().await;
            if inner.phase != GamePhase::Waiting || inner.owner_id != player_id {
                return false;
            }
            let owner_id = inner.owner_id.clone();
            if inner
                .players
                .values()
                .any(|p| p.id != owner_id && !p.game_ready)
            {
                return false;
            }

            let mut pool: Vec<_> = self.catalogue.songs().to_vec();
            pool.shuffle(&mut rand::rng());
            let pool_size = self.config.max_song_pool.min(pool.len());
            pool.truncate(pool_size);

            let board_size = self.config.board_size.min(pool.len());
            let mut board_cards: Vec<Card> = pool[..board_size]
                .iter()
                .map(|song| Card {
                    id: song.id.clone(),
                    title_original: song.title_original.clone(),
                    title_translation: song.title_translation.clone(),
                    is_matched: false,
                })
                .collect();
            board_cards.shuffle(&mut rand::rng());

            inner.song_pool = pool;
            inner.board_cards = board_cards.clone();
            inner.phase = GamePhase::Playing;
            inner.current_round = 1;

            let round = inner.current_round;
            self.send_all(
                &inner,
                ServerMessage::GameStarted {
                    cards: board_cards,
                    round,
                },
            );
        }
        self.begin_prepare_phase().await;
        true
    }

    /// Acquires the lock. Broadcasts regardless of membership to a non-member
    /// (returns early for an unknown sender without broadcasting).
    pub async fn chat(self: &Arc<Self>, player_id: &str, text: String) {
        let inner = self.inner.lock().await;
        let Some(sender_name) = inner.players.get(player_id).map(|p| p.name.clone()) else {
            return;
        };
        self.send_all(
            &inner,
            ServerMessage::ChatReceive {
                sender: sender_name,
                text,
            },
        );
    }

    /// Acquires the lock. Entry point for a fresh round (round 1, or the
    /// round following [`Room::schedule_next_round`]'s 3s pause). Resets
    /// per-round player flags, ends the game if the board is full or the
    /// pool is exhausted, otherwise samples a target song and arms the
    /// prepare-timeout.
    pub async fn begin_prepare_phase(self: &Arc<Self>) {
        let (round, generation) = {
            let mut inner = self.inner.lock().await;
            for player in inner.players.values_mut() {
                player.has_answered = false;
                player.is_ready = false;
            }

            if inner.board_cards.iter().all(|c| c.is_matched) || inner.song_pool.is_empty() {
                inner.round_phase = RoundPhase::Ended;
                let players = inner.player_views();
                self.send_all(&inner, ServerMessage::GameOver { players });
                ServerMetrics::inc(&self.metrics.games_completed);
                return;
            }

            ServerMetrics::inc(&self.metrics.rounds_started);
            let idx = rand::rng().random_range(0..inner.song_pool.len());
            inner.current_song_index = Some(idx);
            let duration = inner.song_pool[idx].duration;

            let max_offset = (duration * 3 / 4).max(1);
            let start_time = rand::rng().random_range(0..max_offset);
            let play_duration = duration.saturating_sub(start_time).min(90).max(1);

            inner.round_phase = RoundPhase::Preparing;
            inner.timer_generation += 1;
            let round = inner.current_round;
            let generation = inner.timer_generation;

            self.send_all(
                &inner,
                ServerMessage::PrepareRound {
                    round,
                    start_time,
                    play_duration,
                },
            );
            (round, generation)
        };
        self.arm_prepare_timeout(round, generation);
    }

    fn arm_prepare_timeout(self: &Arc<Self>, round: u32, generation: u64) {
        let room = Arc::clone(self);
        let timeout = self.config.prepare_timeout_secs;
        tokio::spawn(async move {
            sleep(Duration::from_secs(timeout)).await;
            room.try_advance_to_countdown(round, generation).await;
        });
    }

    /// Acquires the lock. Marks the sender ready; if every player is now
    /// ready, spawns the countdown transition immediately instead of waiting
    /// out the prepare timeout.
    pub async fn handle_client_ready(self: &Arc<Self>, player_id: &str) {
        let trigger = {
            let mut inner = self.inner.lock().await;
            if inner.round_phase != RoundPhase::Preparing {
                return;
            }
            match inner.players.get_mut(player_id) {
                Some(player) => player.is_ready = true,
                None => return,
            }
            if inner.players.values().all(|p| p.is_ready) {
                Some((inner.current_round, inner.timer_generation))
            } else {
                None
            }
        };
        if let Some((round, generation)) = trigger {
            let room = Arc::clone(self);
            tokio::spawn(async move { room.try_advance_to_countdown(round, generation).await });
        }
    }

    /// Generation-checked transition out of `preparing`. Whichever of
    /// "prepare timeout fires" or "all players ready" wins the lock first
    /// bumps the generation, making the other a no-op on arrival. Releases
    /// the lock across the fixed countdown sleep, per the documented
    /// suspension points.
    async fn try_advance_to_countdown(self: &Arc<Self>, expected_round: u32, expected_generation: u64) {
        let generation = {
            let mut inner = self.inner.lock().await;
            if inner.round_phase != RoundPhase::Preparing
                || inner.current_round != expected_round
                || inner.timer_generation != expected_generation
            {
                return;
            }
            inner.round_phase = RoundPhase::Countdown;
            inner.timer_generation += 1;
            let generation = inner.timer_generation;
            self.send_all(&inner, ServerMessage::CountdownStart {});
            generation
        };
        sleep(Duration::from_secs(self.config.countdown_secs)).await;
        self.begin_playing(expected_round, generation).await;
    }

    async fn begin_playing(self: &Arc<Self>, expected_round: u32, expected_generation: u64) {
        let generation = {
            let mut inner = self.inner.lock().await;
            if inner.round_phase != RoundPhase::Countdown
                || inner.current_round != expected_round
                || inner.timer_generation != expected_generation
            {
                return;
            }
            inner.round_phase = RoundPhase::Playing;
            inner.timer_generation += 1;
            let generation = inner.timer_generation;
            self.send_all(&inner, ServerMessage::PlayRound {});
            generation
        };
        self.arm_round_timeout(expected_round, generation);
    }

    fn arm_round_timeout(self: &Arc<Self>, round: u32, generation: u64) {
        let room = Arc::clone(self);
        let timeout = self.config.round_timeout_secs;
        tokio::spawn(async move {
            sleep(Duration::from_secs(timeout)).await;
            room.handle_round_timeout(round, generation).await;
        });
    }

    async fn handle_round_timeout(self: &Arc<Self>, expected_round: u32, expected_generation: u64) {
        let mut inner = self.inner.lock().await;
        if inner.round_phase != RoundPhase::Playing
            || inner.current_round != expected_round
            || inner.timer_generation != expected_generation
        {
            return;
        }
        let is_song_on_board = inner
            .current_song()
            .map(|song| {
                inner
                    .board_cards
                    .iter()
                    .any(|c| !c.is_matched && c.id == song.id)
            })
            .unwrap_or(false);
        let (round, generation) =
            self.end_round(&mut inner, "time up".to_string(), !is_song_on_board, false);
        drop(inner);
        self.schedule_next_round(round, generation);
    }

    /// Acquires the lock. Arbitrates a `buzz{cardId}` claim: a correct buzz
    /// ends the round immediately; a wrong buzz scores the sender and ends
    /// the round only once every present player has answered. The room
    /// mutex's acquisition order is the fairness mechanism (spec §4.4): the
    /// first `buzz`/`no_song` to observe `has_answered == false` wins.
    pub async fn handle_buzz(self: &Arc<Self>, player_id: &str, card_id: &str) {
        let mut inner = self.inner.lock().await;
        if inner.round_phase != RoundPhase::Playing {
            return;
        }
        if inner.players.get(player_id).is_none_or(|p| p.has_answered) {
            return;
        }
        let Some(current_song_id) = inner.current_song().map(|s| s.id.clone()) else {
            return;
        };

        let scoring = self.config.scoring;
        if card_id == current_song_id {
            let name = inner
                .players
                .get(player_id)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            if let Some(player) = inner.players.get_mut(player_id) {
                player.score += scoring.correct_buzz;
                player.has_answered = true;
            }
            if let Some(card) = inner
                .board_cards
                .iter_mut()
                .find(|c| c.id == current_song_id)
            {
                card.is_matched = true;
            }
            ServerMetrics::inc(&self.metrics.correct_buzzes);
            let reason = format!("{name} answered correctly");
            let (round, generation) = self.end_round(&mut inner, reason, true, true);
            drop(inner);
            self.schedule_next_round(round, generation);
            return;
        }

        ServerMetrics::inc(&self.metrics.wrong_buzzes);
        if let Some(player) = inner.players.get_mut(player_id) {
            player.score += scoring.wrong_buzz;
            player.has_answered = true;
            let _ = player.sender.try_send(Arc::new(ServerMessage::WrongAnswer {}));
        }
        if inner.players.values().all(|p| p.has_answered) {
            let is_song_on_board = inner
                .board_cards
                .iter()
                .any(|c| !c.is_matched && c.id == current_song_id);
            let (round, generation) = self.end_round(
                &mut inner,
                "every player answered".to_string(),
                !is_song_on_board,
                false,
            );
            drop(inner);
            self.schedule_next_round(round, generation);
        }
    }

    /// Acquires the lock. Arbitrates a `no_song{}` "ghost song" claim using
    /// the same `has_answered` bookkeeping as [`Room::handle_buzz`], so a room
    /// where players answer via a mix of `buzz` and `no_song` still converges
    /// on a single end-of-round decision.
    pub async fn handle_no_song(self: &Arc<Self>, player_id: &str) {
        let mut inner = self.inner.lock().await;
        if inner.round_phase != RoundPhase::Playing {
            return;
        }
        if inner.players.get(player_id).is_none_or(|p| p.has_answered) {
            return;
        }
        let Some(current_song_id) = inner.current_song().map(|s| s.id.clone()) else {
            return;
        };
        let is_song_on_board = inner
            .board_cards
            .iter()
            .any(|c| !c.is_matched && c.id == current_song_id);

        let scoring = self.config.scoring;
        if let Some(player) = inner.players.get_mut(player_id) {
            if is_song_on_board {
                ServerMetrics::inc(&self.metrics.no_song_claims_wrong);
                player.score += scoring.wrong_no_song;
                player.has_answered = true;
                let _ = player.sender.try_send(Arc::new(ServerMessage::WrongAnswer {}));
            } else {
                ServerMetrics::inc(&self.metrics.no_song_claims_correct);
                player.score += scoring.correct_no_song;
                player.has_answered = true;
            }
        }

        if inner.players.values().all(|p| p.has_answered) {
            let (round, generation) = self.end_round(
                &mut inner,
                "ghost song, no one matched it".to_string(),
                !is_song_on_board,
                false,
            );
            drop(inner);
            self.schedule_next_round(round, generation);
        }
    }

    /// Must be called with the lock already held. Broadcasts `round_end` and
    /// the resulting `room_state_update`, optionally removes the spent song
    /// from the pool, and bumps the generation so the round timeout (if still
    /// in flight) becomes a no-op. Returns the `(current_round,
    /// timer_generation)` pair captured after the bump, for the caller to
    /// hand to [`Room::schedule_next_round`] so its detached task can
    /// generation-check itself before touching a possibly-emptied room.
    fn end_round(
        &self,
        inner: &mut RoomInner,
        reason: String,
        remove_song: bool,
        show_answer: bool,
    ) -> (u32, u64) {
        let idx = inner
            .current_song_index
            .expect("end_round called while a round is active");
        let correct_song = SongTitle::from(&inner.song_pool[idx]);

        inner.round_phase = RoundPhase::Ended;
        inner.timer_generation += 1;
        if remove_song {
            inner.song_pool.remove(idx);
        }
        inner.current_song_index = None;

        let cards = inner.board_cards.clone();
        self.send_all(
            inner,
            ServerMessage::RoundEnd {
                reason,
                correct_song,
                cards,
                show_answer,
            },
        );
        let players = inner.player_views();
        let owner_id = inner.owner_id.clone();
        self.send_all(inner, ServerMessage::RoomStateUpdate { players, owner_id });

        (inner.current_round, inner.timer_generation)
    }

    /// Spawns the fixed 3s inter-round pause as a detached task (per the
    /// documented suspension points). Must be called with the lock released.
    ///
    /// `round`/`generation` are the `(current_round, timer_generation)`
    /// captured by the `end_round` call that preceded this; the spawned task
    /// re-verifies both (plus that the room still has players) before
    /// mutating anything, the same generation-check discipline every other
    /// timer path uses. Without it, a room emptied mid-pause (`remove_player`
    /// bumps the generation but this task already holds its own `Arc<Room>`)
    /// would otherwise cycle rounds and re-arm timers forever after the
    /// registry has already dropped the room.
    fn schedule_next_round(self: &Arc<Self>, round: u32, generation: u64) {
        let room = Arc::clone(self);
        let delay = self.config.inter_round_delay_secs;
        tokio::spawn(async move {
            sleep(Duration::from_secs(delay)).await;
            let mut inner = room.inner.lock().await;
            if inner.players.is_empty()
                || inner.round_phase != RoundPhase::Ended
                || inner.current_round != round
                || inner.timer_generation != generation
            {
                return;
            }
            if inner.board_cards.iter().all(|c| c.is_matched) {
                let players = inner.player_views();
                room.send_all(&inner, ServerMessage::GameOver { players });
                ServerMetrics::inc(&room.metrics.games_completed);
                return;
            }
            inner.current_round += 1;
            drop(inner);
            room.begin_prepare_phase().await;
        });
    }

    /// Acquires the lock. Only the owner may restart, and only once a game
    /// has actually been played to completion — `round_phase == Ended` alone
    /// doesn't distinguish "game over" from a fresh room's initial lobby
    /// state (both start there, see `Room::new`), so this also requires
    /// `phase == Playing` (set by `start_game`, only cleared by a prior
    /// `restart_game`). Resets scores and readiness to zero (resolved Open
    /// Question, spec §9) and returns the room to the lobby.
    pub async fn restart_game(self: &Arc<Self>, player_id: &str) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.owner_id != player_id
            || inner.round_phase != RoundPhase::Ended
            || inner.phase != GamePhase::Playing
        {
            return false;
        }
        inner.phase = GamePhase::Waiting;
        inner.current_round = 0;
        inner.song_pool.clear();
        inner.board_cards.clear();
        inner.current_song_index = None;
        inner.timer_generation += 1;
        for player in inner.players.values_mut() {
            player.score = 0;
            player.game_ready = false;
            player.is_ready = false;
            player.has_answered = false;
        }
        self.send_all(&inner, ServerMessage::GameReset {});
        let players = inner.player_views();
        let owner_id = inner.owner_id.clone();
        self.send_all(&inner, ServerMessage::RoomStateUpdate { players, owner_id });
        true
    }

    /// Acquires the lock. Removes a player on disconnect; transfers ownership
    /// to the next-oldest remaining member if the owner left, or neutralises
    /// all in-flight timers (via the generation bump) if the room is now
    /// empty. Returns `true` when the room is now empty and should be dropped
    /// from the registry.
    pub async fn remove_player(self: &Arc<Self>, player_id: &str) -> bool {
        let mut inner = self.inner.lock().await;
        inner.players.remove(player_id);
        inner.join_order.retain(|id| id != player_id);

        if inner.players.is_empty() {
            inner.timer_generation += 1;
            inner.round_phase = RoundPhase::Ended;
            return true;
        }

        if inner.owner_id == player_id {
            if let Some(next_owner) = inner.join_order.first().cloned() {
                inner.owner_id = next_owner;
            }
        }

        let players = inner.player_views();
        let owner_id = inner.owner_id.clone();
        self.send_all(&inner, ServerMessage::RoomStateUpdate { players, owner_id });
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{Catalogue, Song};
    use crate::config::ServerConfig;
    use tokio::sync::mpsc;

    fn catalogue_with(songs: Vec<Song>) -> Arc<Catalogue> {
        Arc::new(Catalogue::from_songs(songs))
    }

    fn song(id: &str, duration: u32) -> Song {
        Song {
            id: id.to_string(),
            title_original: format!("{id}-orig"),
            title_translation: format!("{id}-en"),
            duration,
        }
    }

    async fn new_room(catalogue: Arc<Catalogue>) -> (Arc<Room>, mpsc::Receiver<Arc<ServerMessage>>) {
        let (tx, rx) = mpsc::channel(32);
        let config = Arc::new(ServerConfig::default());
        let metrics = Arc::new(crate::metrics::ServerMetrics::new());
        let room = Room::new(
            "1234".to_string(),
            config,
            catalogue,
            metrics,
            "p1".to_string(),
            "Alice".to_string(),
            tx,
        );
        (room, rx)
    }

    #[tokio::test]
    async fn join_rejects_duplicate_name() {
        let catalogue = catalogue_with(vec![song("s1", 120)]);
        let (room, _rx) = new_room(catalogue).await;
        let (tx2, _rx2) = mpsc::channel(8);
        let result = room
            .join("p2".to_string(), "Alice".to_string(), tx2)
            .await;
        assert_eq!(result, Err(super::super::errors::RoomError::NameTaken));
    }

    #[tokio::test]
    async fn join_rejects_full_room() {
        let catalogue = catalogue_with(vec![song("s1", 120)]);
        let (room, _rx) = new_room(catalogue).await;
        for i in 1..room.config.max_players {
            let (tx, _rx) = mpsc::channel(8);
            room.join(format!("p{i}"), format!("Player{i}"), tx)
                .await
                .unwrap();
        }
        let (tx, _rx) = mpsc::channel(8);
        let result = room.join("overflow".to_string(), "Overflow".to_string(), tx).await;
        assert_eq!(result, Err(super::super::errors::RoomError::RoomFull));
    }

    #[tokio::test]
    async fn start_game_requires_owner_and_ready_non_owners() {
        let catalogue = catalogue_with(vec![song("s1", 120), song("s2", 150)]);
        let (room, _rx) = new_room(catalogue).await;
        let (tx2, _rx2) = mpsc::channel(8);
        room.join("p2".to_string(), "Bob".to_string(), tx2).await.unwrap();

        assert!(!room.start_game("p1").await, "non-ready non-owner blocks start");
        room.toggle_ready("p2").await;
        assert!(room.start_game("p1").await);

        let inner = room.inner.lock().await;
        assert_eq!(inner.phase, GamePhase::Playing);
        assert_eq!(inner.current_round, 1);
        assert!(inner.current_song_index.is_some());
    }

    #[tokio::test]
    async fn correct_buzz_awards_points_and_matches_card() {
        let catalogue = catalogue_with(vec![song("s1", 120)]);
        let (room, _rx) = new_room(catalogue).await;
        room.start_game("p1").await;
        let card_id = {
            let inner = room.inner.lock().await;
            inner.current_song().unwrap().id.clone()
        };
        // force into playing phase directly to avoid waiting on real timers
        {
            let mut inner = room.inner.lock().await;
            inner.round_phase = RoundPhase::Playing;
        }
        room.handle_buzz("p1", &card_id).await;
        let inner = room.inner.lock().await;
        assert_eq!(inner.players.get("p1").unwrap().score, 10);
        assert!(inner.board_cards.iter().find(|c| c.id == card_id).unwrap().is_matched);
    }

    #[tokio::test]
    async fn wrong_buzz_penalizes_and_keeps_round_alive_with_others_present() {
        let catalogue = catalogue_with(vec![song("s1", 120)]);
        let (room, _rx) = new_room(catalogue).await;
        let (tx2, _rx2) = mpsc::channel(8);
        room.join("p2".to_string(), "Bob".to_string(), tx2).await.unwrap();
        room.toggle_ready("p2").await;
        room.start_game("p1").await;
        {
            let mut inner = room.inner.lock().await;
            inner.round_phase = RoundPhase::Playing;
        }
        room.handle_buzz("p1", "not-the-song").await;
        let inner = room.inner.lock().await;
        assert_eq!(inner.players.get("p1").unwrap().score, -5);
        assert_eq!(inner.round_phase, RoundPhase::Playing);
    }

    #[tokio::test]
    async fn owner_leaving_transfers_ownership() {
        let catalogue = catalogue_with(vec![song("s1", 120)]);
        let (room, _rx) = new_room(catalogue).await;
        let (tx2, _rx2) = mpsc::channel(8);
        room.join("p2".to_string(), "Bob".to_string(), tx2).await.unwrap();
        let emptied = room.remove_player("p1").await;
        assert!(!emptied);
        let inner = room.inner.lock().await;
        assert_eq!(inner.owner_id, "p2");
    }

    #[tokio::test]
    async fn last_player_leaving_empties_room() {
        let catalogue = catalogue_with(vec![song("s1", 120)]);
        let (room, _rx) = new_room(catalogue).await;
        let emptied = room.remove_player("p1").await;
        assert!(emptied);
    }

    async fn new_room_with_config(
        catalogue: Arc<Catalogue>,
        config: ServerConfig,
    ) -> (Arc<Room>, mpsc::Receiver<Arc<ServerMessage>>) {
        let (tx, rx) = mpsc::channel(32);
        let metrics = Arc::new(crate::metrics::ServerMetrics::new());
        let room = Room::new(
            "1234".to_string(),
            Arc::new(config),
            catalogue,
            metrics,
            "p1".to_string(),
            "Alice".to_string(),
            tx,
        );
        (room, rx)
    }

    /// Regression test: a room emptied during the 3s inter-round pause must
    /// not have its detached `schedule_next_round` task resurrect it (no
    /// round increment, no further `begin_prepare_phase`), even though the
    /// task still holds its own `Arc<Room>` after the registry has dropped
    /// the room entry.
    #[tokio::test]
    async fn schedule_next_round_task_bails_once_room_is_emptied() {
        use std::sync::atomic::Ordering;

        let catalogue = catalogue_with(vec![song("s1", 120), song("s2", 150)]);
        let config = ServerConfig {
            inter_round_delay_secs: 0,
            ..ServerConfig::default()
        };
        let (room, _rx) = new_room_with_config(catalogue, config).await;

        assert!(room.start_game("p1").await);
        let card_id = {
            let mut inner = room.inner.lock().await;
            inner.round_phase = RoundPhase::Playing;
            inner.current_song().unwrap().id.clone()
        };
        let rounds_started_before = room.metrics.rounds_started.load(Ordering::Relaxed);

        // Correct buzz ends the round (one of two cards matched) and spawns
        // the inter-round task before the room is emptied.
        room.handle_buzz("p1", &card_id).await;
        let emptied = room.remove_player("p1").await;
        assert!(emptied);

        // Give the detached task a chance to wake, lock, and (incorrectly,
        // absent the generation/empty guard) advance the round.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let inner = room.inner.lock().await;
        assert_eq!(inner.current_round, 1, "emptied room must not advance rounds");
        assert_eq!(
            room.metrics.rounds_started.load(Ordering::Relaxed),
            rounds_started_before,
            "emptied room must not start another round"
        );
    }

    #[tokio::test]
    async fn restart_game_rejected_in_fresh_lobby() {
        let catalogue = catalogue_with(vec![song("s1", 120)]);
        let (room, _rx) = new_room(catalogue).await;
        // A freshly-created room starts in `RoundPhase::Ended` with
        // `phase = Waiting`; `restart_game` must not treat that as a
        // completed game.
        assert!(!room.restart_game("p1").await);
        let inner = room.inner.lock().await;
        assert_eq!(inner.phase, GamePhase::Waiting);
    }

    #[tokio::test]
    async fn restart_game_accepted_after_game_over() {
        let catalogue = catalogue_with(vec![song("s1", 120)]);
        let (room, _rx) = new_room(catalogue).await;
        assert!(room.start_game("p1").await);
        {
            let mut inner = room.inner.lock().await;
            inner.round_phase = RoundPhase::Ended;
        }
        assert!(room.restart_game("p1").await);
        let inner = room.inner.lock().await;
        assert_eq!(inner.phase, GamePhase::Waiting);
        assert_eq!(inner.players.get("p1").unwrap().score, 0);
    }
}
