use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::events::Frame;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// Handle used to push frames to one connected socket. Cloned freely; the
/// underlying channel drains in the connection task.
#[derive(Clone)]
pub struct ConnectionHandle {
    conn_id: u64,
    tx: mpsc::UnboundedSender<Frame>,
    meta: Arc<Mutex<ConnMeta>>,
}

#[derive(Default)]
struct ConnMeta {
    user_id: Option<String>,
    room_id: Option<String>,
}

impl ConnectionHandle {
    pub fn new(tx: mpsc::UnboundedSender<Frame>) -> Self {
        Self {
            conn_id: NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed),
            tx,
            meta: Arc::new(Mutex::new(ConnMeta::default())),
        }
    }

    /// Identity of the physical connection; a reconnect gets a new one.
    pub fn conn_id(&self) -> u64 {
        self.conn_id
    }

    /// Emission is non-blocking; a closed peer just drops the frame.
    pub fn emit(&self, event: &str, data: String) {
        let _ = self.tx.send(Frame {
            event: event.to_string(),
            data,
        });
    }

    pub fn user_id(&self) -> Option<String> {
        self.meta.lock().unwrap().user_id.clone()
    }

    pub fn bind_user(&self, user_id: &str) {
        self.meta.lock().unwrap().user_id = Some(user_id.to_string());
    }

    pub fn room_id(&self) -> Option<String> {
        self.meta.lock().unwrap().room_id.clone()
    }

    pub fn set_room(&self, room_id: &str) {
        self.meta.lock().unwrap().room_id = Some(room_id.to_string());
    }

    pub fn clear_room(&self) {
        self.meta.lock().unwrap().room_id = None;
    }
}

/// user id -> live connection. The sole mechanism for addressing a user
/// outside a room's broadcast group. A new bind replaces the prior one.
pub struct SessionRegistry {
    connections: DashMap<String, ConnectionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn bind(&self, user_id: &str, conn: ConnectionHandle) {
        conn.bind_user(user_id);
        self.connections.insert(user_id.to_string(), conn);
    }

    pub fn get(&self, user_id: &str) -> Option<ConnectionHandle> {
        self.connections
            .get(user_id)
            .map(|entry| entry.value().clone())
    }

    /// Clear the mapping only if the departing connection still owns it, so
    /// a disconnect racing a reconnect never evicts the fresh binding.
    pub fn unbind_conn(&self, user_id: &str, conn_id: u64) {
        self.connections
            .remove_if(user_id, |_, bound| bound.conn_id() == conn_id);
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (ConnectionHandle, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConnectionHandle::new(tx), rx)
    }

    #[test]
    fn bind_replaces_prior_connection() {
        let registry = SessionRegistry::new();
        let (first, _rx1) = handle();
        let (second, mut rx2) = handle();

        registry.bind("u1", first);
        registry.bind("u1", second);
        assert_eq!(registry.len(), 1);

        registry.get("u1").unwrap().emit("ping", "1".into());
        assert_eq!(rx2.try_recv().unwrap().event, "ping");
    }

    #[test]
    fn unbind_only_when_still_owner() {
        let registry = SessionRegistry::new();
        let (old, _rx1) = handle();
        let old_id = old.conn_id();
        registry.bind("u1", old);

        let (fresh, _rx2) = handle();
        let fresh_id = fresh.conn_id();
        registry.bind("u1", fresh);

        // Departed connection loses the race and must not evict the new one.
        registry.unbind_conn("u1", old_id);
        assert!(registry.get("u1").is_some());

        registry.unbind_conn("u1", fresh_id);
        assert!(registry.get("u1").is_none());
    }

    #[test]
    fn emit_to_closed_connection_is_silent() {
        let (conn, rx) = handle();
        drop(rx);
        conn.emit("noop", String::new());
    }
}
