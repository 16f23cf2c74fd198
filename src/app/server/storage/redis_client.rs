use fred::{
    interfaces::{ClientLike, KeysInterface, SetsInterface, SortedSetsInterface},
    types::{ClientState, Expiration, MultipleKeys},
};

use crate::app::server::errors;
use crate::app::types;

#[derive(Clone)]
pub struct RedisClient {
    client: fred::clients::RedisClient,
}

type DbResult<T> = Result<T, errors::DbError>;

impl RedisClient {
    pub fn new(inner_client: fred::clients::RedisClient) -> Self {
        Self {
            client: inner_client,
        }
    }

    pub async fn connect(
        redis_config: types::RedisConfig,
    ) -> Result<Self, fred::error::RedisError> {
        let config = fred::types::RedisConfig {
            server: fred::types::ServerConfig::Centralized {
                server: fred::types::Server {
                    host: redis_config.host.into(),
                    port: redis_config.port,
                },
            },
            username: redis_config.username,
            password: redis_config.password,
            database: redis_config.database,
            ..fred::types::RedisConfig::default()
        };

        let client = fred::clients::RedisClient::new(config, None, None, None);

        // connect to the server, returning a handle to a task that drives the connection
        client.connect();

        // wait for the client to connect
        client.wait_for_connect().await?;

        Ok(Self::new(client))
    }

    /// Liveness probe used to decide between the durable and in-memory paths.
    pub fn is_connected(&self) -> bool {
        self.client.state() == ClientState::Connected
    }

    pub async fn get_and_deserialize<
        K: Into<fred::types::RedisKey> + Send,
        V: serde::de::DeserializeOwned,
    >(
        &self,
        key: K,
    ) -> DbResult<V> {
        let get_command_result = self.client.get::<Option<String>, _>(key).await;

        match get_command_result {
            Ok(value_string_optional) => match value_string_optional {
                Some(value_string) => match serde_json::from_str::<V>(&value_string) {
                    Ok(value) => Ok(value),
                    Err(deserialize_error) => {
                        log::error!("{deserialize_error:?}");
                        Err(errors::DbError::ParsingFailure)
                    }
                },
                None => Err(errors::DbError::NotFound),
            },
            Err(error) => Err(errors::DbError::Backend(error)),
        }
    }

    pub async fn serialize_and_set<
        K: Into<fred::types::RedisKey> + Send,
        V: serde::Serialize + serde::de::DeserializeOwned,
    >(
        &self,
        key: K,
        value: V,
        ttl_seconds: Option<i64>,
    ) -> DbResult<V> {
        let serialized_value = serde_json::to_string(&value);

        match serialized_value {
            Ok(serialized_value) => {
                match self
                    .client
                    .set::<String, _, _>(
                        key,
                        serialized_value,
                        ttl_seconds.map(Expiration::EX),
                        None,
                        false,
                    )
                    .await
                {
                    Ok(_) => Ok(value),
                    Err(error) => Err(errors::DbError::Backend(error)),
                }
            }
            Err(serialization_error) => {
                log::error!("serialization_error {serialization_error:?}");
                Err(errors::DbError::ParsingFailure)
            }
        }
    }

    pub async fn delete_key<K: Into<fred::types::RedisKey> + Send>(&self, key: K) -> DbResult<()> {
        let key: fred::types::RedisKey = key.into();
        self.client
            .del::<i64, _>(key)
            .await
            .map(|_| ())
            .map_err(errors::DbError::Backend)
    }

    pub async fn get_multiple_keys<
        K: Into<MultipleKeys> + Send,
        V: serde::Serialize + serde::de::DeserializeOwned,
    >(
        &self,
        keys: K,
    ) -> DbResult<Vec<V>> {
        let get_command_result = self.client.mget::<Vec<String>, _>(keys).await;

        match get_command_result {
            Ok(value_strings) => {
                let result = value_strings
                    .iter()
                    .map(|value_string| serde_json::from_str::<V>(value_string))
                    .collect::<Result<Vec<_>, _>>();

                result.map_err(|serialize_error| {
                    tracing::error!(?serialize_error);
                    errors::DbError::ParsingFailure
                })
            }
            Err(error) => Err(errors::DbError::Backend(error)),
        }
    }

    pub async fn set_add<K: Into<fred::types::RedisKey> + Send>(
        &self,
        key: K,
        member: &str,
    ) -> DbResult<()> {
        self.client
            .sadd::<i64, _, _>(key, member)
            .await
            .map(|_| ())
            .map_err(errors::DbError::Backend)
    }

    pub async fn set_remove<K: Into<fred::types::RedisKey> + Send>(
        &self,
        key: K,
        member: &str,
    ) -> DbResult<()> {
        self.client
            .srem::<i64, _, _>(key, member)
            .await
            .map(|_| ())
            .map_err(errors::DbError::Backend)
    }

    pub async fn set_members<K: Into<fred::types::RedisKey> + Send>(
        &self,
        key: K,
    ) -> DbResult<Vec<String>> {
        self.client
            .smembers::<Vec<String>, _>(key)
            .await
            .map_err(errors::DbError::Backend)
    }

    /// Upsert a member into a score-sorted set.
    pub async fn sorted_set_upsert<K: Into<fred::types::RedisKey> + Send>(
        &self,
        key: K,
        member: &str,
        score: f64,
    ) -> DbResult<()> {
        self.client
            .zadd::<i64, _, _>(key, None, None, false, false, (score, member))
            .await
            .map(|_| ())
            .map_err(errors::DbError::Backend)
    }

    /// 0-based position of `member` when the set is read highest-score-first.
    pub async fn sorted_set_rank_desc<K: Into<fred::types::RedisKey> + Send>(
        &self,
        key: K,
        member: &str,
    ) -> DbResult<Option<i64>> {
        self.client
            .zrevrank::<Option<i64>, _, _>(key, member)
            .await
            .map_err(errors::DbError::Backend)
    }

    /// Top `count` members with scores, highest first.
    pub async fn sorted_set_top_desc<K: Into<fred::types::RedisKey> + Send>(
        &self,
        key: K,
        count: usize,
    ) -> DbResult<Vec<(String, f64)>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        self.client
            .zrevrange::<Vec<(String, f64)>, _>(key, 0, count as i64 - 1, true)
            .await
            .map_err(errors::DbError::Backend)
    }
}
