pub mod errors;
pub mod game;
pub mod http;
pub mod storage;
pub mod ws;

use std::sync::Arc;

use crate::app::types;

use self::{
    game::registry::RoomRegistry,
    storage::{redis_client::RedisClient, Store},
    ws::session::SessionRegistry,
};

/// Single-process coordinator state shared by every connection task, timer
/// callback and the status surface.
pub struct GameServer {
    pub store: Store,
    pub rooms: RoomRegistry,
    pub sessions: SessionRegistry,
}

pub type SharedServer = Arc<GameServer>;

impl GameServer {
    pub fn new(store: Store) -> SharedServer {
        Arc::new(Self {
            store,
            rooms: RoomRegistry::new(),
            sessions: SessionRegistry::new(),
        })
    }
}

pub async fn start_server(
    server_config: types::ServerConfig,
    tcp_listener: tokio::net::TcpListener,
) {
    let store = match RedisClient::connect(server_config.redis.unwrap_or_default()).await {
        Ok(redis_client) => Store::new(Some(redis_client)),
        Err(error) => {
            tracing::warn!(?error, "redis unreachable, serving from the in-memory store");
            Store::new(None)
        }
    };

    let server = GameServer::new(store);

    tracing::info!("Server successfully running");

    axum::serve(tcp_listener, http::router(server))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Could not start the server");
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received, closing the server");
}
