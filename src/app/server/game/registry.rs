use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tokio::sync::Mutex as AsyncMutex;

use super::room::{Room, RoomStatus};

pub type SharedRoom = Arc<AsyncMutex<Room>>;

/// Owns every active room. Matchmaking scans in insertion order so the
/// earliest open room fills first; friend codes and matchmade uuids share
/// the same keyspace.
pub struct RoomRegistry {
    rooms: DashMap<String, SharedRoom>,
    order: Mutex<Vec<String>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            order: Mutex::new(Vec::new()),
        }
    }

    pub fn insert(&self, room: Room) -> SharedRoom {
        let room_id = room.room_id.clone();
        let shared = Arc::new(AsyncMutex::new(room));
        self.rooms.insert(room_id.clone(), shared.clone());
        self.order.lock().unwrap().push(room_id);
        shared
    }

    /// Reserve a room id atomically; friend codes can race on creation.
    pub fn insert_if_absent(&self, room: Room) -> Option<SharedRoom> {
        let room_id = room.room_id.clone();
        match self.rooms.entry(room_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => None,
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                let shared = Arc::new(AsyncMutex::new(room));
                vacant.insert(shared.clone());
                self.order.lock().unwrap().push(room_id);
                Some(shared)
            }
        }
    }

    pub fn get(&self, room_id: &str) -> Option<SharedRoom> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn remove(&self, room_id: &str) {
        self.rooms.remove(room_id);
        self.order.lock().unwrap().retain(|id| id != room_id);
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn insertion_order(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }

    /// First WAITING room with the exact stake and table size that still has
    /// a seat. Earliest-open-first concentrates fill; no load balancing.
    pub async fn find_available(&self, bet_amount: u64, max_players: usize) -> Option<SharedRoom> {
        for room_id in self.insertion_order() {
            let Some(shared) = self.get(&room_id) else {
                continue;
            };
            let room = shared.lock().await;
            if room.status == RoomStatus::Waiting
                && room.bet_amount == bet_amount
                && room.max_players == max_players
                && !room.is_full()
            {
                drop(room);
                return Some(shared);
            }
        }
        None
    }

    /// WAITING room currently seating this user, if any. Used to withdraw a
    /// user from matchmaking.
    pub async fn find_waiting_with_user(&self, user_id: &str) -> Option<SharedRoom> {
        for room_id in self.insertion_order() {
            let Some(shared) = self.get(&room_id) else {
                continue;
            };
            let room = shared.lock().await;
            if room.status == RoomStatus::Waiting && room.player_by_user_id(user_id).is_some() {
                drop(room);
                return Some(shared);
            }
        }
        None
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::server::ws::session::ConnectionHandle;
    use tokio::sync::mpsc;

    fn test_conn() -> ConnectionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        std::mem::forget(rx);
        ConnectionHandle::new(tx)
    }

    #[tokio::test]
    async fn matchmaking_requires_exact_stake_and_size() {
        let registry = RoomRegistry::new();
        registry.insert(Room::new("r1".into(), "h1".into(), 100, 2));
        registry.insert(Room::new("r2".into(), "h2".into(), 100, 4));

        assert!(registry.find_available(100, 2).await.is_some());
        assert!(registry.find_available(50, 2).await.is_none());

        let four_seater = registry.find_available(100, 4).await.unwrap();
        assert_eq!(four_seater.lock().await.room_id, "r2");
    }

    #[tokio::test]
    async fn earliest_open_room_fills_first() {
        let registry = RoomRegistry::new();
        registry.insert(Room::new("first".into(), "h1".into(), 100, 2));
        registry.insert(Room::new("second".into(), "h2".into(), 100, 2));

        let found = registry.find_available(100, 2).await.unwrap();
        assert_eq!(found.lock().await.room_id, "first");
    }

    #[tokio::test]
    async fn full_or_started_rooms_are_skipped() {
        let registry = RoomRegistry::new();
        let shared = registry.insert(Room::new("r1".into(), "h1".into(), 100, 2));
        {
            let mut room = shared.lock().await;
            room.seat("u1".into(), "A".into(), test_conn());
            room.seat("u2".into(), "B".into(), test_conn());
            room.status = RoomStatus::Playing;
        }

        assert!(registry.find_available(100, 2).await.is_none());
    }

    #[tokio::test]
    async fn removal_drops_from_scan_order() {
        let registry = RoomRegistry::new();
        registry.insert(Room::new("r1".into(), "h1".into(), 100, 2));
        registry.remove("r1");

        assert!(registry.is_empty());
        assert!(registry.find_available(100, 2).await.is_none());
    }

    #[tokio::test]
    async fn waiting_room_lookup_by_user() {
        let registry = RoomRegistry::new();
        let shared = registry.insert(Room::new("r1".into(), "h1".into(), 100, 2));
        shared
            .lock()
            .await
            .seat("u1".into(), "A".into(), test_conn());

        assert!(registry.find_waiting_with_user("u1").await.is_some());
        assert!(registry.find_waiting_with_user("u2").await.is_none());
    }
}
