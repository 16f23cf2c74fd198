use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::app::utils;

use super::models::User;

/// Process-local fallback backend. Every write goes here regardless of the
/// durable backend's health, so a Redis outage never strands the server.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<Mutex<HashMap<String, User>>>,
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
    leaderboard: Arc<Mutex<HashMap<String, u64>>>,
}

#[derive(Clone)]
struct SessionEntry {
    data: String,
    expires_at: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_user(&self, user: User) {
        let mut users = self.users.lock().unwrap();
        users.insert(user.user_id.clone(), user);
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        let users = self.users.lock().unwrap();
        users.get(user_id).cloned()
    }

    pub fn delete_user(&self, user_id: &str) -> bool {
        let mut users = self.users.lock().unwrap();
        users.remove(user_id).is_some()
    }

    pub fn list_users(&self) -> Vec<User> {
        let users = self.users.lock().unwrap();
        users.values().cloned().collect()
    }

    pub fn user_count(&self) -> usize {
        let users = self.users.lock().unwrap();
        users.len()
    }

    pub fn put_session(&self, session_id: &str, data: String, ttl_seconds: i64) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(
            session_id.to_string(),
            SessionEntry {
                data,
                expires_at: utils::unix_timestamp() + ttl_seconds.max(0) as u64,
            },
        );
    }

    pub fn get_session(&self, session_id: &str) -> Option<String> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get(session_id) {
            Some(entry) if entry.expires_at > utils::unix_timestamp() => Some(entry.data.clone()),
            Some(_) => {
                // Lazily expired, same observable behavior as a TTL'd key.
                sessions.remove(session_id);
                None
            }
            None => None,
        }
    }

    pub fn delete_session(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(session_id);
    }

    pub fn leaderboard_upsert(&self, user_id: &str, win_count: u64) {
        let mut leaderboard = self.leaderboard.lock().unwrap();
        leaderboard.insert(user_id.to_string(), win_count);
    }

    /// Win-sorted descending; ties resolve by member for a stable listing.
    pub fn leaderboard_top(&self, count: usize) -> Vec<(String, u64)> {
        let leaderboard = self.leaderboard.lock().unwrap();
        let mut entries = leaderboard
            .iter()
            .map(|(user_id, win_count)| (user_id.clone(), *win_count))
            .collect::<Vec<_>>();

        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(count);
        entries
    }

    /// 1-based rank; 0 when the user has no leaderboard entry.
    pub fn leaderboard_rank(&self, user_id: &str) -> u64 {
        let entries = self.leaderboard_top(usize::MAX);
        entries
            .iter()
            .position(|(member, _)| member == user_id)
            .map(|index| index as u64 + 1)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_crud() {
        let store = MemoryStore::new();
        store.put_user(User::new("u1".into(), "Asha".into()));

        assert_eq!(store.user_count(), 1);
        assert_eq!(store.get_user("u1").unwrap().user_name, "Asha");
        assert!(store.delete_user("u1"));
        assert!(store.get_user("u1").is_none());
        assert!(!store.delete_user("u1"));
    }

    #[test]
    fn session_expiry() {
        let store = MemoryStore::new();
        store.put_session("s1", "blob".into(), 3600);
        assert_eq!(store.get_session("s1").unwrap(), "blob");

        store.put_session("s2", "blob".into(), 0);
        assert!(store.get_session("s2").is_none());
    }

    #[test]
    fn leaderboard_rank_consistent_with_top() {
        let store = MemoryStore::new();
        store.leaderboard_upsert("u1", 3);
        store.leaderboard_upsert("u2", 9);
        store.leaderboard_upsert("u3", 1);

        let top = store.leaderboard_top(2);
        assert_eq!(top, vec![("u2".into(), 9), ("u1".into(), 3)]);

        assert_eq!(store.leaderboard_rank("u2"), 1);
        assert_eq!(store.leaderboard_rank("u1"), 2);
        assert_eq!(store.leaderboard_rank("u3"), 3);
        assert_eq!(store.leaderboard_rank("missing"), 0);
    }

    #[test]
    fn leaderboard_upsert_replaces_score() {
        let store = MemoryStore::new();
        store.leaderboard_upsert("u1", 1);
        store.leaderboard_upsert("u2", 2);
        store.leaderboard_upsert("u1", 5);

        assert_eq!(store.leaderboard_rank("u1"), 1);
    }
}
