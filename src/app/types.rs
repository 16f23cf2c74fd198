use std::time::Duration;

/// No-action limit per turn. Three strikes remove the player.
pub const TURN_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_TURN_TIMEOUTS: u8 = 3;

/// Window during which a disconnected player may reconnect with full state
/// restoration before being marked timed out.
pub const DISCONNECT_GRACE: Duration = Duration::from_secs(30);

/// Client-side win animation runs before the final payout is announced.
pub const WIN_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Finished rooms linger so late events can observe the terminal state.
pub const ROOM_CLEANUP_DELAY: Duration = Duration::from_secs(10);

pub const STARTING_COINS: u64 = 1000;
pub const FRIEND_CODE_LEN: usize = 6;
pub const SESSION_TTL_SECONDS: i64 = 3600;

#[derive(serde::Deserialize, Default)]
pub struct ServerConfig {
    pub server: Option<HttpConfig>,
    pub redis: Option<RedisConfig>,
}

#[derive(serde::Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

#[derive(serde::Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_host")]
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<u8>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_redis_host(),
            port: default_redis_port(),
            username: None,
            password: None,
            database: None,
        }
    }
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_port() -> u16 {
    6379
}
