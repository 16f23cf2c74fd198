use tokio::task::JoinHandle;

use crate::app::server::ws::session::ConnectionHandle;
use crate::app::utils;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

/// Wire value for player status is the numeric code, not the name.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerStatus {
    Playing,
    Win,
    Left,
    Timeout,
}

impl PlayerStatus {
    pub fn code(self) -> u8 {
        match self {
            PlayerStatus::Playing => 0,
            PlayerStatus::Win => 1,
            PlayerStatus::Left => 2,
            PlayerStatus::Timeout => 3,
        }
    }
}

pub struct Player {
    pub user_id: String,
    pub user_name: String,
    /// Position in the roster at join time. Stable for the room's life;
    /// seats are never compacted.
    pub peer_id: usize,
    pub conn: ConnectionHandle,
    pub status: PlayerStatus,
    pub numoftimeout: u8,
    pub joined_at: u64,
}

#[derive(serde::Serialize, Clone, Debug, Default)]
pub struct GameData {
    pub last_dice: u8,
    pub moves: Vec<TokenMove>,
}

#[derive(serde::Serialize, Clone, Debug)]
pub struct TokenMove {
    pub peer_id: usize,
    pub token_id: u32,
    pub token_value: i32,
    pub timestamp: u64,
}

pub struct Room {
    pub room_id: String,
    pub host_user_id: String,
    pub bet_amount: u64,
    pub max_players: usize,
    pub status: RoomStatus,
    pub players: Vec<Player>,
    pub current_turn: usize,
    pub game_data: GameData,
    pub created_at: u64,
    /// Bumped on every arm/disarm; a timer fire carrying a stale sequence
    /// must no-op.
    pub(crate) timer_seq: u64,
    pub(crate) turn_timer: Option<JoinHandle<()>>,
    pub(crate) settled: bool,
}

impl Room {
    pub fn new(
        room_id: String,
        host_user_id: String,
        bet_amount: u64,
        max_players: usize,
    ) -> Self {
        Self {
            room_id,
            host_user_id,
            bet_amount,
            max_players,
            status: RoomStatus::Waiting,
            players: Vec::new(),
            current_turn: 0,
            game_data: GameData::default(),
            created_at: utils::unix_timestamp(),
            timer_seq: 0,
            turn_timer: None,
            settled: false,
        }
    }

    /// A seat is available only while the game has not started.
    pub fn has_seat(&self) -> bool {
        self.status == RoomStatus::Waiting && self.players.len() < self.max_players
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    /// Append a player; the peer id is the roster index at join time.
    pub fn seat(&mut self, user_id: String, user_name: String, conn: ConnectionHandle) -> usize {
        let peer_id = self.players.len();
        self.players.push(Player {
            user_id,
            user_name,
            peer_id,
            conn,
            status: PlayerStatus::Playing,
            numoftimeout: 0,
            joined_at: utils::unix_timestamp(),
        });
        peer_id
    }

    pub fn player_by_peer(&self, peer_id: usize) -> Option<&Player> {
        self.players.get(peer_id)
    }

    pub fn player_by_peer_mut(&mut self, peer_id: usize) -> Option<&mut Player> {
        self.players.get_mut(peer_id)
    }

    pub fn player_by_user_id(&self, user_id: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.user_id == user_id)
    }

    pub fn player_by_user_id_mut(&mut self, user_id: &str) -> Option<&mut Player> {
        self.players
            .iter_mut()
            .find(|player| player.user_id == user_id)
    }

    pub fn playing_count(&self) -> usize {
        self.players
            .iter()
            .filter(|player| player.status == PlayerStatus::Playing)
            .count()
    }

    pub fn playing_peers(&self) -> Vec<usize> {
        self.players
            .iter()
            .filter(|player| player.status == PlayerStatus::Playing)
            .map(|player| player.peer_id)
            .collect()
    }

    /// True once every seat has been abandoned; the room can be destroyed.
    pub fn all_seats_left(&self) -> bool {
        !self.players.is_empty()
            && self
                .players
                .iter()
                .all(|player| player.status == PlayerStatus::Left)
    }

    /// First actively playing seat at or after `start`, scanning at most one
    /// full lap. WIN/LEFT/TIMEOUT seats are skipped but keep their peer id.
    pub fn next_playing_from(&self, start: usize) -> Option<usize> {
        if self.players.is_empty() {
            return None;
        }
        let len = self.players.len();
        (0..len)
            .map(|offset| (start + offset) % len)
            .find(|&index| self.players[index].status == PlayerStatus::Playing)
    }

    /// Move the cursor to the next playing seat. Returns the new cursor, or
    /// None when nobody is left to act (caller terminates the game).
    pub fn advance_turn(&mut self) -> Option<usize> {
        let next = self.next_playing_from((self.current_turn + 1) % self.players.len().max(1))?;
        self.current_turn = next;
        Some(next)
    }

    pub fn record_move(&mut self, peer_id: usize, token_id: u32, token_value: i32) {
        self.game_data.moves.push(TokenMove {
            peer_id,
            token_id,
            token_value,
            timestamp: utils::unix_timestamp(),
        });
    }

    pub fn broadcast(&self, event: &str, data: &str) {
        for player in &self.players {
            player.conn.emit(event, data.to_string());
        }
    }

    pub fn broadcast_except(&self, peer_id: usize, event: &str, data: &str) {
        for player in &self.players {
            if player.peer_id != peer_id {
                player.conn.emit(event, data.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn test_conn() -> ConnectionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        std::mem::forget(rx);
        ConnectionHandle::new(tx)
    }

    fn room_with_players(count: usize) -> Room {
        let mut room = Room::new("r1".into(), "u0".into(), 100, 4);
        for index in 0..count {
            room.seat(format!("u{index}"), format!("Player{index}"), test_conn());
        }
        room
    }

    #[test]
    fn peer_ids_are_positional() {
        let room = room_with_players(4);
        for (index, player) in room.players.iter().enumerate() {
            assert_eq!(player.peer_id, index);
        }
        assert!(room.is_full());
        assert!(!room.has_seat());
    }

    #[test]
    fn advance_skips_non_playing_seats() {
        let mut room = room_with_players(4);
        room.current_turn = 0;
        room.players[1].status = PlayerStatus::Win;
        room.players[2].status = PlayerStatus::Timeout;

        assert_eq!(room.advance_turn(), Some(3));
        assert_eq!(room.current_turn, 3);

        // Wraps around past the dead seats back to 0.
        assert_eq!(room.advance_turn(), Some(0));
    }

    #[test]
    fn advance_with_no_active_players() {
        let mut room = room_with_players(2);
        room.players[0].status = PlayerStatus::Left;
        room.players[1].status = PlayerStatus::Timeout;

        assert_eq!(room.advance_turn(), None);
    }

    #[test]
    fn advance_stays_on_sole_survivor() {
        let mut room = room_with_players(2);
        room.players[1].status = PlayerStatus::Left;
        room.current_turn = 0;

        assert_eq!(room.advance_turn(), Some(0));
    }

    #[test]
    fn all_seats_left_requires_occupants() {
        let mut room = room_with_players(2);
        assert!(!room.all_seats_left());
        room.players[0].status = PlayerStatus::Left;
        room.players[1].status = PlayerStatus::Left;
        assert!(room.all_seats_left());
    }

    #[test]
    fn status_codes_are_wire_values() {
        assert_eq!(PlayerStatus::Playing.code(), 0);
        assert_eq!(PlayerStatus::Win.code(), 1);
        assert_eq!(PlayerStatus::Left.code(), 2);
        assert_eq!(PlayerStatus::Timeout.code(), 3);
    }
}
