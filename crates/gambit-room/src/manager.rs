//! Room manager: registers, tracks, and recovers room actors.

use std::collections::HashMap;
use std::sync::Arc;

use gambit_media::MediaService;
use gambit_protocol::GameId;
use gambit_store::Store;

use crate::room::{GameRecord, RoomDeps, record_key, spawn_room};
use crate::{RoomError, RoomHandle};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Tracks all live rooms and spawns actors for them.
///
/// Rooms come into existence in exactly two ways: `register` when the
/// matching queue pairs two players, and `lookup` when a request names
/// a game whose record survives in the store but whose actor does not
/// (a restart, typically). Unknown game IDs resolve to `None` and the
/// edge turns that into a 404.
pub struct RoomManager {
    /// Live rooms, keyed by game ID.
    rooms: HashMap<GameId, RoomHandle>,
    deps: RoomDeps,
}

impl RoomManager {
    pub fn new(
        store: Arc<dyn Store>,
        media: Arc<dyn MediaService>,
        video_preset: impl Into<String>,
    ) -> Self {
        Self {
            rooms: HashMap::new(),
            deps: RoomDeps {
                store,
                media,
                video_preset: video_preset.into(),
            },
        }
    }

    /// Registers a game ID as playable, spawning its actor if needed.
    ///
    /// Called when the queue pairs two players. Idempotent: registering
    /// an existing game returns its live handle.
    pub fn register(&mut self, game_id: &GameId) -> RoomHandle {
        if let Some(handle) = self.rooms.get(game_id) {
            return handle.clone();
        }
        let handle = spawn_room(
            game_id.clone(),
            None,
            self.deps.clone(),
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(game_id.clone(), handle.clone());
        tracing::info!(%game_id, "room registered");
        handle
    }

    /// Resolves a game ID to a live room handle.
    ///
    /// Falls back to the durable store when no actor is live: a game
    /// with a persisted record gets its actor respawned from it, so
    /// in-flight games survive a process restart.
    pub async fn lookup(
        &mut self,
        game_id: &GameId,
    ) -> Result<Option<RoomHandle>, RoomError> {
        if let Some(handle) = self.rooms.get(game_id) {
            return Ok(Some(handle.clone()));
        }

        let Some(value) = self.deps.store.get(&record_key(game_id)).await?
        else {
            return Ok(None);
        };
        let record: GameRecord = serde_json::from_str(&value)?;

        let handle = spawn_room(
            game_id.clone(),
            Some(record),
            self.deps.clone(),
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(game_id.clone(), handle.clone());
        tracing::info!(%game_id, "room recovered from store");
        Ok(Some(handle))
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
