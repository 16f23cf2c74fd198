use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::app::server::storage::interface::user::UserInterface;

use super::{ws, SharedServer};

pub fn router(server: SharedServer) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/status", get(status))
        .route("/ws", get(ws::server::ws_handler))
        .with_state(server)
}

async fn liveness() -> &'static str {
    "Ludo coordinator is running"
}

/// Aggregate counters for dashboards and probes.
async fn status(State(server): State<SharedServer>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "rooms": server.rooms.len(),
        "users": server.store.user_count(),
        "connections": server.sessions.len(),
    }))
}
