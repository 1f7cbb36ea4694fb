use log::{info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::game::{Game, GameError};
use crate::position::CellAddress;
use crate::protocol::{BoardUpdate, MoveMessage, RoomId, RoomSnapshot};
use crate::rules::Rules;

/// Updates a slow subscriber may fall behind by before it starts missing them.
const UPDATE_BUFFER: usize = 16;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room {0} not found")]
    RoomNotFound(RoomId),
    #[error(transparent)]
    Game(#[from] GameError),
}

struct Room {
    game: Game,
    updates: broadcast::Sender<BoardUpdate>,
}

/// All running rooms. Each room's game sits behind its own lock, so moves in a room are
/// applied one at a time while rooms proceed independently.
pub struct RoomRegistry {
    rules: Rules,
    next_id: AtomicU64,
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<Room>>>>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(Rules::default())
    }
}

impl RoomRegistry {
    pub fn new(rules: Rules) -> Self {
        RoomRegistry {
            rules,
            next_id: AtomicU64::new(1),
            rooms: RwLock::new(HashMap::new()),
        }
    }

    pub fn rules(&self) -> Rules {
        self.rules
    }

    pub fn create_room(&self) -> RoomSnapshot {
        let room_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);
        let room = Room {
            game: Game::new(self.rules),
            updates,
        };
        let snapshot = snapshot_of(room_id, &room.game);

        self.rooms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(room_id, Arc::new(Mutex::new(room)));
        info!("room {} created", room_id);

        snapshot
    }

    pub fn remove_room(&self, room_id: RoomId) -> Result<(), RoomError> {
        self.rooms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&room_id)
            .ok_or(RoomError::RoomNotFound(room_id))?;
        info!("room {} removed", room_id);
        Ok(())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn room(&self, room_id: RoomId) -> Result<Arc<Mutex<Room>>, RoomError> {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&room_id)
            .cloned()
            .ok_or(RoomError::RoomNotFound(room_id))
    }

    fn with_room<T>(&self, room_id: RoomId, f: impl FnOnce(&mut Room) -> T) -> Result<T, RoomError> {
        let room = self.room(room_id)?;
        let mut guard = room.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&mut *guard))
    }

    pub fn snapshot(&self, room_id: RoomId) -> Result<RoomSnapshot, RoomError> {
        self.with_room(room_id, |room| snapshot_of(room_id, &room.game))
    }

    /// Apply an inbound move and broadcast the resulting update to the room's subscribers.
    pub fn submit(&self, message: &MoveMessage) -> Result<BoardUpdate, RoomError> {
        let result = self.with_room(message.room_id, |room| {
            let update = room.game.submit(message.from_color, &message.mv)?;
            // no subscribers is fine; the caller still gets the update
            let _ = room.updates.send(update.clone());
            Ok::<_, GameError>(update)
        })?;

        if let Err(err) = &result {
            warn!(
                "room {}: rejected {} from {}: {}",
                message.room_id, message.mv, message.from_color, err
            );
        }
        Ok(result?)
    }

    pub fn available_moves(&self, room_id: RoomId, from: CellAddress) -> Result<Vec<CellAddress>, RoomError> {
        self.with_room(room_id, |room| room.game.available_move_positions(from))
    }

    pub fn subscribe(&self, room_id: RoomId) -> Result<broadcast::Receiver<BoardUpdate>, RoomError> {
        self.with_room(room_id, |room| room.updates.subscribe())
    }
}

fn snapshot_of(room_id: RoomId, game: &Game) -> RoomSnapshot {
    RoomSnapshot {
        room_id,
        board_status: game.board().encode(),
        active_color: game.active_color(),
        winner: game.winner(),
        moves: game.history().iter().map(|mv| mv.to_string()).collect(),
    }
}
