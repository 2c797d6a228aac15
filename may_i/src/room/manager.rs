//! Room manager for spawning and managing multiple room actors.

use super::{
    RoomId,
    actor::{RoomActor, RoomHandle},
    config::RoomConfig,
    messages::{RoomMessage, RoomResponse, RoomStateResponse},
};
use crate::game::{
    Game,
    entities::{ConnectionId, PlayerId},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Room metadata for discovery
#[derive(Debug, Clone, Serialize)]
pub struct RoomMetadata {
    pub id: RoomId,
    pub name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub speed: String,
    pub created_at: DateTime<Utc>,
}

/// Room manager for managing multiple room instances
///
/// This is the only place rooms are created and closed.
#[derive(Clone, Default)]
pub struct RoomManager {
    /// Active room handles
    rooms: Arc<RwLock<HashMap<RoomId, RoomHandle>>>,

    /// Next room ID
    next_room_id: Arc<RwLock<RoomId>>,

    /// Discovery info, player counts refreshed on join
    metadata: Arc<RwLock<HashMap<RoomId, RoomMetadata>>>,
}

impl RoomManager {
    /// Create a new room manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and spawn a new room
    pub async fn create_room(&self, config: RoomConfig) -> Result<RoomId, String> {
        config.validate()?;
        let game = Game::from(config.settings.clone());
        self.spawn_room(config, game).await
    }

    /// Create a room whose shuffles are reproducible
    pub async fn create_seeded_room(&self, config: RoomConfig, seed: u64) -> Result<RoomId, String> {
        config.validate()?;
        let game = Game::with_seed(config.settings.clone(), seed);
        self.spawn_room(config, game).await
    }

    async fn spawn_room(&self, config: RoomConfig, game: Game) -> Result<RoomId, String> {
        // Get next room ID
        let mut next_id = self.next_room_id.write().await;
        *next_id += 1;
        let room_id = *next_id;
        drop(next_id);

        let metadata = RoomMetadata {
            id: room_id,
            name: config.name.clone(),
            player_count: 0,
            max_players: config.settings.player_count,
            speed: config.speed.to_string(),
            created_at: Utc::now(),
        };

        let (actor, handle) = RoomActor::with_game(room_id, config, game);

        let mut rooms = self.rooms.write().await;
        rooms.insert(room_id, handle);
        drop(rooms);

        let mut cache = self.metadata.write().await;
        cache.insert(room_id, metadata);
        drop(cache);

        tokio::spawn(async move {
            actor.run().await;
        });

        log::info!("Created and spawned room {room_id}");

        Ok(room_id)
    }

    /// Get a room handle
    pub async fn get_room(&self, room_id: RoomId) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(&room_id).cloned()
    }

    /// List all active rooms, oldest first
    pub async fn list_rooms(&self) -> Vec<RoomMetadata> {
        let cache = self.metadata.read().await;
        let mut rooms: Vec<RoomMetadata> = cache.values().cloned().collect();
        rooms.sort_by_key(|m| (m.created_at, m.id));
        rooms
    }

    /// Close a room
    pub async fn close_room(&self, room_id: RoomId) -> Result<(), String> {
        let handle = self
            .get_room(room_id)
            .await
            .ok_or_else(|| "Room not found".to_string())?;

        // An actor that already stopped has nothing left to close.
        if let Err(e) = handle
            .request(|response| RoomMessage::Close { response })
            .await
        {
            log::warn!("Room {room_id} did not acknowledge close: {e}");
        }

        let mut rooms = self.rooms.write().await;
        rooms.remove(&room_id);
        drop(rooms);

        let mut cache = self.metadata.write().await;
        cache.remove(&room_id);
        drop(cache);

        log::info!("Closed room {room_id}");

        Ok(())
    }

    async fn room(&self, room_id: RoomId) -> Result<RoomHandle, String> {
        self.get_room(room_id)
            .await
            .ok_or_else(|| "Room not found".to_string())
    }

    /// Join a room
    pub async fn join_room(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        name: String,
        connection: ConnectionId,
    ) -> Result<RoomResponse, String> {
        let handle = self.room(room_id).await?;
        let response = handle.join(player_id, name, connection).await?;

        if response.is_success()
            && let Ok(state) = handle.state().await
        {
            self.update_player_count_cache(room_id, state.player_count)
                .await;
        }

        Ok(response)
    }

    /// Rebind a seat to a new player id
    pub async fn reconnect(
        &self,
        room_id: RoomId,
        old_id: PlayerId,
        new_id: PlayerId,
        connection: ConnectionId,
    ) -> Result<RoomResponse, String> {
        self.room(room_id)
            .await?
            .request(|response| RoomMessage::Reconnect {
                old_id,
                new_id,
                connection,
                response,
            })
            .await
    }

    /// Mark a player's connection as gone
    pub async fn disconnect(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<RoomResponse, String> {
        self.room(room_id)
            .await?
            .request(|response| RoomMessage::Disconnect {
                player_id,
                response,
            })
            .await
    }

    /// Get room state
    pub async fn get_room_state(&self, room_id: RoomId) -> Result<RoomStateResponse, String> {
        self.room(room_id).await?.state().await
    }

    /// Get active room count
    pub async fn active_room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.len()
    }

    async fn update_player_count_cache(&self, room_id: RoomId, player_count: usize) {
        let mut cache = self.metadata.write().await;
        if let Some(metadata) = cache.get_mut(&room_id) {
            metadata.player_count = player_count;
        }
    }
}
