use crate::app::server::{
    errors::DbError,
    storage::{models, StorageResult, Store},
};
use crate::app::utils;

#[allow(async_fn_in_trait)]
pub trait UserInterface {
    async fn insert_user(&self, user: models::User) -> StorageResult<models::User>;
    async fn find_user(&self, user_id: &str) -> StorageResult<models::User>;
    async fn delete_user(&self, user_id: &str) -> StorageResult<()>;
    async fn list_users(&self) -> StorageResult<Vec<models::User>>;
    fn user_count(&self) -> usize;
}

impl UserInterface for Store {
    async fn insert_user(&self, mut user: models::User) -> StorageResult<models::User> {
        user.last_update = utils::unix_timestamp();

        self.memory.put_user(user.clone());

        if let Some(redis) = self.redis_ready() {
            match redis
                .serialize_and_set(models::user_key(&user.user_id), user.clone(), None)
                .await
            {
                Ok(_) => {
                    let _ = redis
                        .set_add(models::USERS_INDEX_KEY, &user.user_id)
                        .await;
                }
                Err(error) => {
                    tracing::warn!(?error, user_id = %user.user_id, "durable user write failed");
                }
            }
        }

        Ok(user)
    }

    async fn find_user(&self, user_id: &str) -> StorageResult<models::User> {
        if let Some(redis) = self.redis_ready() {
            match redis
                .get_and_deserialize::<_, models::User>(models::user_key(user_id))
                .await
            {
                Ok(user) => {
                    self.memory.put_user(user.clone());
                    return Ok(user);
                }
                Err(error) if error.is_not_found() => {}
                Err(error) => {
                    tracing::warn!(?error, user_id, "durable user read failed");
                }
            }
        }

        self.memory.get_user(user_id).ok_or(DbError::NotFound)
    }

    async fn delete_user(&self, user_id: &str) -> StorageResult<()> {
        let existed = self.memory.delete_user(user_id);

        if let Some(redis) = self.redis_ready() {
            if let Err(error) = redis.delete_key(models::user_key(user_id)).await {
                tracing::warn!(?error, user_id, "durable user delete failed");
            }
            let _ = redis.set_remove(models::USERS_INDEX_KEY, user_id).await;
        }

        if existed {
            Ok(())
        } else {
            Err(DbError::NotFound)
        }
    }

    async fn list_users(&self) -> StorageResult<Vec<models::User>> {
        if let Some(redis) = self.redis_ready() {
            let listed = async {
                let user_ids = redis.set_members(models::USERS_INDEX_KEY).await?;
                if user_ids.is_empty() {
                    return Ok(Vec::new());
                }
                let keys = user_ids
                    .iter()
                    .map(|user_id| models::user_key(user_id))
                    .collect::<Vec<_>>();
                redis.get_multiple_keys::<_, models::User>(keys).await
            }
            .await;

            match listed {
                Ok(users) => return Ok(users),
                Err(error) => {
                    tracing::warn!(?error, "durable user listing failed");
                }
            }
        }

        Ok(self.memory.list_users())
    }

    fn user_count(&self) -> usize {
        self.memory.user_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_only_store() -> Store {
        Store::new(None)
    }

    #[tokio::test]
    async fn insert_stamps_last_update() {
        let store = memory_only_store();
        let mut user = models::User::new("u1".into(), "Asha".into());
        user.last_update = 0;

        let stored = store.insert_user(user).await.unwrap();
        assert!(stored.last_update > 0);

        let reloaded = store.find_user("u1").await.unwrap();
        assert_eq!(reloaded.last_update, stored.last_update);
    }

    #[tokio::test]
    async fn find_missing_user_is_not_found() {
        let store = memory_only_store();
        let error = store.find_user("nope").await.unwrap_err();
        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn delete_and_list() {
        let store = memory_only_store();
        store
            .insert_user(models::User::new("u1".into(), "Asha".into()))
            .await
            .unwrap();
        store
            .insert_user(models::User::new("u2".into(), "Ben".into()))
            .await
            .unwrap();

        assert_eq!(store.list_users().await.unwrap().len(), 2);
        assert_eq!(store.user_count(), 2);

        store.delete_user("u1").await.unwrap();
        assert_eq!(store.user_count(), 1);
        assert!(store.delete_user("u1").await.is_err());
    }
}
