use crate::app::{types, utils};

#[derive(serde::Deserialize, serde::Serialize, Clone, Debug)]
pub struct User {
    pub user_id: String,
    pub user_name: String,
    pub coins: u64,
    pub win_count: u64,
    pub lost_count: u64,
    pub total_games_played: u64,
    pub level: u64,
    pub created_at: u64,
    pub last_update: u64,
}

impl User {
    pub fn new(user_id: String, user_name: String) -> Self {
        let now = utils::unix_timestamp();
        Self {
            user_id,
            user_name,
            coins: types::STARTING_COINS,
            win_count: 0,
            lost_count: 0,
            total_games_played: 0,
            level: 1,
            created_at: now,
            last_update: now,
        }
    }

    /// One level per ten wins.
    pub fn recompute_level(&mut self) {
        self.level = 1 + self.win_count / 10;
    }

    pub fn record_win(&mut self) {
        self.win_count += 1;
        self.total_games_played += 1;
        self.recompute_level();
    }

    pub fn record_loss(&mut self) {
        self.lost_count += 1;
        self.total_games_played += 1;
    }
}

/// Opaque session blob persisted with a TTL.
#[derive(serde::Deserialize, serde::Serialize, Clone, Debug)]
pub struct SessionData {
    pub session_id: String,
    pub data: String,
}

pub fn user_key(user_id: &str) -> String {
    format!("user:{user_id}")
}

pub fn session_key(session_id: &str) -> String {
    format!("session:{session_id}")
}

pub const USERS_INDEX_KEY: &str = "users:index";
pub const LEADERBOARD_KEY: &str = "leaderboard:wins";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_starts_with_grant() {
        let user = User::new("u1".into(), "Asha".into());
        assert_eq!(user.coins, types::STARTING_COINS);
        assert_eq!(user.level, 1);
        assert_eq!(user.total_games_played, 0);
    }

    #[test]
    fn level_derivation() {
        let mut user = User::new("u1".into(), "Asha".into());
        for _ in 0..9 {
            user.record_win();
        }
        assert_eq!(user.level, 1);
        user.record_win();
        assert_eq!(user.level, 2);
        assert_eq!(user.total_games_played, 10);
    }

    #[test]
    fn serde_round_trip() {
        let mut user = User::new("u1".into(), "Asha".into());
        user.record_win();
        user.record_loss();
        user.coins = 1234;

        let encoded = serde_json::to_string(&user).unwrap();
        let decoded: User = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.user_id, user.user_id);
        assert_eq!(decoded.coins, 1234);
        assert_eq!(decoded.win_count, 1);
        assert_eq!(decoded.lost_count, 1);
        assert_eq!(decoded.created_at, user.created_at);
        assert_eq!(decoded.last_update, user.last_update);
    }
}
