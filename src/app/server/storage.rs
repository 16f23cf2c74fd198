use crate::app::server::errors::DbError;

pub mod interface;
pub mod memory;
pub mod models;
pub mod redis_client;

use self::{interface::StorageInterface, memory::MemoryStore, redis_client::RedisClient};

pub type StorageResult<T> = Result<T, DbError>;

/// Two-backend store. Every write lands in the in-memory map; the durable
/// backend is written through and preferred for reads while its connection
/// is up. A durable failure demotes the call, it never surfaces.
#[derive(Clone)]
pub struct Store {
    pub redis_client: Option<RedisClient>,
    pub memory: MemoryStore,
}

impl Store {
    pub fn new(redis_client: Option<RedisClient>) -> Self {
        Self {
            redis_client,
            memory: MemoryStore::new(),
        }
    }

    /// Liveness probe for the durable backend.
    pub fn connected(&self) -> bool {
        self.redis_client
            .as_ref()
            .map(RedisClient::is_connected)
            .unwrap_or(false)
    }

    pub(crate) fn redis_ready(&self) -> Option<&RedisClient> {
        self.redis_client
            .as_ref()
            .filter(|client| client.is_connected())
    }
}

impl StorageInterface for Store {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_only_store_reports_disconnected() {
        let store = Store::new(None);
        assert!(!store.connected());
        assert!(store.redis_ready().is_none());
    }
}
