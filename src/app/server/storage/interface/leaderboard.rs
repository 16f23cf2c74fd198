use crate::app::server::storage::{models, StorageResult, Store};

#[allow(async_fn_in_trait)]
pub trait LeaderboardInterface {
    async fn leaderboard_upsert(&self, user_id: &str, win_count: u64) -> StorageResult<()>;
    async fn leaderboard_top(&self, count: usize) -> StorageResult<Vec<(String, u64)>>;
    /// 1-based; 0 for users with no leaderboard entry.
    async fn leaderboard_rank(&self, user_id: &str) -> StorageResult<u64>;
}

impl LeaderboardInterface for Store {
    async fn leaderboard_upsert(&self, user_id: &str, win_count: u64) -> StorageResult<()> {
        self.memory.leaderboard_upsert(user_id, win_count);

        if let Some(redis) = self.redis_ready() {
            if let Err(error) = redis
                .sorted_set_upsert(models::LEADERBOARD_KEY, user_id, win_count as f64)
                .await
            {
                tracing::warn!(?error, user_id, "durable leaderboard write failed");
            }
        }

        Ok(())
    }

    async fn leaderboard_top(&self, count: usize) -> StorageResult<Vec<(String, u64)>> {
        if let Some(redis) = self.redis_ready() {
            match redis
                .sorted_set_top_desc(models::LEADERBOARD_KEY, count)
                .await
            {
                Ok(entries) => {
                    return Ok(entries
                        .into_iter()
                        .map(|(user_id, score)| (user_id, score as u64))
                        .collect());
                }
                Err(error) => {
                    tracing::warn!(?error, "durable leaderboard read failed");
                }
            }
        }

        Ok(self.memory.leaderboard_top(count))
    }

    async fn leaderboard_rank(&self, user_id: &str) -> StorageResult<u64> {
        if let Some(redis) = self.redis_ready() {
            match redis
                .sorted_set_rank_desc(models::LEADERBOARD_KEY, user_id)
                .await
            {
                Ok(position) => return Ok(position.map(|index| index as u64 + 1).unwrap_or(0)),
                Err(error) => {
                    tracing::warn!(?error, user_id, "durable leaderboard rank failed");
                }
            }
        }

        Ok(self.memory.leaderboard_rank(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rank_matches_top_ordering() {
        let store = Store::new(None);
        store.leaderboard_upsert("u1", 4).await.unwrap();
        store.leaderboard_upsert("u2", 7).await.unwrap();

        let top = store.leaderboard_top(10).await.unwrap();
        assert_eq!(top[0].0, "u2");
        assert_eq!(store.leaderboard_rank("u2").await.unwrap(), 1);
        assert_eq!(store.leaderboard_rank("u1").await.unwrap(), 2);
        assert_eq!(store.leaderboard_rank("ghost").await.unwrap(), 0);
    }
}
