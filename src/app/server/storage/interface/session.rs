use crate::app::server::storage::{models, StorageResult, Store};
use crate::app::types::SESSION_TTL_SECONDS;

#[allow(async_fn_in_trait)]
pub trait SessionInterface {
    async fn session_put(
        &self,
        session_id: &str,
        data: String,
        ttl_seconds: Option<i64>,
    ) -> StorageResult<()>;
    async fn session_get(&self, session_id: &str) -> StorageResult<Option<String>>;
    async fn session_delete(&self, session_id: &str) -> StorageResult<()>;
}

impl SessionInterface for Store {
    async fn session_put(
        &self,
        session_id: &str,
        data: String,
        ttl_seconds: Option<i64>,
    ) -> StorageResult<()> {
        let ttl_seconds = ttl_seconds.unwrap_or(SESSION_TTL_SECONDS);

        self.memory.put_session(session_id, data.clone(), ttl_seconds);

        if let Some(redis) = self.redis_ready() {
            if let Err(error) = redis
                .serialize_and_set(models::session_key(session_id), data, Some(ttl_seconds))
                .await
            {
                tracing::warn!(?error, session_id, "durable session write failed");
            }
        }

        Ok(())
    }

    async fn session_get(&self, session_id: &str) -> StorageResult<Option<String>> {
        if let Some(redis) = self.redis_ready() {
            match redis
                .get_and_deserialize::<_, String>(models::session_key(session_id))
                .await
            {
                Ok(data) => return Ok(Some(data)),
                Err(error) if error.is_not_found() => {}
                Err(error) => {
                    tracing::warn!(?error, session_id, "durable session read failed");
                }
            }
        }

        Ok(self.memory.get_session(session_id))
    }

    async fn session_delete(&self, session_id: &str) -> StorageResult<()> {
        self.memory.delete_session(session_id);

        if let Some(redis) = self.redis_ready() {
            if let Err(error) = redis.delete_key(models::session_key(session_id)).await {
                tracing::warn!(?error, session_id, "durable session delete failed");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let store = Store::new(None);
        store
            .session_put("s1", "{\"device\":\"android\"}".into(), None)
            .await
            .unwrap();

        assert!(store.session_get("s1").await.unwrap().is_some());

        store.session_delete("s1").await.unwrap();
        assert!(store.session_get("s1").await.unwrap().is_none());
    }
}
