//! Process-wide `roomId -> Room` table. A plain `std::sync::Mutex` is
//! sufficient here: the critical section only ever touches the map itself
//! and never awaits, so it can never block a room's own async work. The
//! cardinal rule is the reverse direction — never acquire a room's
//! `tokio::sync::Mutex` while holding this lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::Rng;

use super::errors::RoomError;
use super::state::{PlayerSender, Room};
use crate::catalogue::Catalogue;
use crate::config::ServerConfig;
use crate::metrics::ServerMetrics;
use crate::protocol::{PlayerId, RoomId};

/// Number of random-id attempts before giving up and reporting the registry
/// full. At `max_rooms` live rooms the collision probability is still small,
/// so a handful of retries comfortably covers the expected case (spec §4.1:
/// "expected <= 2 attempts until thousands of rooms exist").
const MAX_ID_ATTEMPTS: usize = 20;

pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomId, Arc<Room>>>,
    config: Arc<ServerConfig>,
    catalogue: Arc<Catalogue>,
    metrics: Arc<ServerMetrics>,
}

impl RoomRegistry {
    pub fn new(
        config: Arc<ServerConfig>,
        catalogue: Arc<Catalogue>,
        metrics: Arc<ServerMetrics>,
    ) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            config,
            catalogue,
            metrics,
        }
    }

    /// Allocates a fresh 4-digit room id and creates the room with `owner` as
    /// its sole member, or `RegistryFull` if `max_rooms` is already live or no
    /// free id was found within [`MAX_ID_ATTEMPTS`] tries.
    pub fn create_room(
        &self,
        owner_id: PlayerId,
        owner_name: String,
        owner_sender: PlayerSender,
    ) -> Result<Arc<Room>, RoomError> {
        let mut rooms = self.rooms.lock().expect("room registry mutex poisoned");
        if rooms.len() >= self.config.max_rooms {
            ServerMetrics::inc(&self.metrics.room_creation_failures);
            return Err(RoomError::RegistryFull);
        }

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = Self::random_room_id();
            if !rooms.contains_key(&id) {
                let room = Room::new(
                    id.clone(),
                    Arc::clone(&self.config),
                    Arc::clone(&self.catalogue),
                    Arc::clone(&self.metrics),
                    owner_id,
                    owner_name,
                    owner_sender,
                );
                rooms.insert(id, Arc::clone(&room));
                ServerMetrics::inc(&self.metrics.rooms_created);
                return Ok(room);
            }
        }
        ServerMetrics::inc(&self.metrics.room_creation_failures);
        Err(RoomError::RegistryFull)
    }

    /// A zero-padded 4-digit decimal string (`"0000"`-`"9999"`), matching the
    /// spec's literal room id example (spec §9: "Room id allocation").
    fn random_room_id() -> RoomId {
        let value = rand::rng().random_range(0..10_000u32);
        format!("{value:04}")
    }

    pub fn get(&self, id: &str) -> Option<Arc<Room>> {
        self.rooms
            .lock()
            .expect("room registry mutex poisoned")
            .get(id)
            .cloned()
    }

    pub fn remove(&self, id: &str) {
        let removed = self
            .rooms
            .lock()
            .expect("room registry mutex poisoned")
            .remove(id);
        if removed.is_some() {
            ServerMetrics::inc(&self.metrics.rooms_destroyed);
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.lock().expect("room registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Defensive sweep removing any room whose player map is empty.
    ///
    /// `remove_player` already drops an emptied room from the registry inline
    /// (spec §4.2: "destroyed at the moment the last player leaves"), so this
    /// sweep should normally find nothing. It exists as a backstop against a
    /// connection task that panicked or was killed before running its cleanup
    /// — grounded in the teacher's periodic `cleanup_task` (`server/
    /// maintenance.rs`), trimmed to this game's single-process, no-database
    /// model: no idempotency keys, no cross-instance claims, just "is anyone
    /// still here".
    pub async fn sweep_empty_rooms(&self) -> usize {
        let snapshot: Vec<Arc<Room>> = self
            .rooms
            .lock()
            .expect("room registry mutex poisoned")
            .values()
            .cloned()
            .collect();

        let mut emptied = Vec::new();
        for room in snapshot {
            if room.inner.lock().await.players.is_empty() {
                emptied.push(room.id.clone());
            }
        }

        let mut rooms = self.rooms.lock().expect("room registry mutex poisoned");
        let mut removed = 0;
        for id in emptied {
            if rooms.remove(&id).is_some() {
                removed += 1;
            }
        }
        drop(rooms);
        if removed > 0 {
            for _ in 0..removed {
                ServerMetrics::inc(&self.metrics.rooms_destroyed);
            }
            tracing::debug!(removed, "swept empty rooms from registry");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::Song;
    use tokio::sync::mpsc;

    fn registry() -> RoomRegistry {
        let catalogue = Catalogue::from_songs(vec![Song {
            id: "s1".to_string(),
            title_original: "orig".to_string(),
            title_translation: "en".to_string(),
            duration: 120,
        }]);
        RoomRegistry::new(
            Arc::new(ServerConfig::default()),
            Arc::new(catalogue),
            Arc::new(ServerMetrics::new()),
        )
    }

    #[test]
    fn create_and_fetch_room() {
        let registry = registry();
        let (tx, _rx) = mpsc::channel(8);
        let room = registry
            .create_room("p1".to_string(), "Alice".to_string(), tx)
            .unwrap();
        assert_eq!(room.id.len(), 4);
        assert!(registry.get(&room.id).is_some());
    }

    #[test]
    fn remove_drops_room_from_table() {
        let registry = registry();
        let (tx, _rx) = mpsc::channel(8);
        let room = registry
            .create_room("p1".to_string(), "Alice".to_string(), tx)
            .unwrap();
        registry.remove(&room.id);
        assert!(registry.get(&room.id).is_none());
    }

    #[tokio::test]
    async fn sweep_removes_rooms_with_no_players_but_leaves_occupied_ones() {
        let registry = registry();
        let (tx1, _rx1) = mpsc::channel(8);
        let occupied = registry
            .create_room("p1".to_string(), "Alice".to_string(), tx1)
            .unwrap();

        let (tx2, _rx2) = mpsc::channel(8);
        let stale = registry
            .create_room("p2".to_string(), "Bob".to_string(), tx2)
            .unwrap();
        stale.inner.lock().await.players.clear();

        let removed = registry.sweep_empty_rooms().await;
        assert_eq!(removed, 1);
        assert!(registry.get(&occupied.id).is_some());
        assert!(registry.get(&stale.id).is_none());
    }
}
