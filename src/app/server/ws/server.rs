use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use tokio::sync::mpsc;

use crate::app::server::{game::dispatcher, SharedServer};

use super::{
    events::{self, Frame},
    session::ConnectionHandle,
};

pub async fn ws_handler(
    State(server): State<SharedServer>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(server, socket))
}

/// One task per connection. Multiplexes the outbound frame queue and the
/// inbound socket; every inbound frame is dispatched inline so a single
/// client's events stay ordered.
async fn handle_socket(server: SharedServer, mut socket: WebSocket) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();
    let conn = ConnectionHandle::new(tx);

    tracing::info!(conn_id = conn.conn_id(), "client connected");

    loop {
        tokio::select! {
            // Outbound: drain queued frames onto the socket.
            maybe_frame = rx.recv() => {
                let Some(frame) = maybe_frame else { break; };
                let Ok(text) = serde_json::to_string(&frame) else { continue; };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            // Inbound: parse the envelope and dispatch.
            maybe_msg = socket.recv() => {
                match maybe_msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<Frame>(&text) {
                            Ok(frame) => {
                                dispatcher::dispatch(&server, &conn, &frame.event, &frame.data).await;
                            }
                            Err(error) => {
                                tracing::warn!(%error, "dropping malformed frame");
                                conn.emit(
                                    events::ERROR,
                                    serde_json::to_string(&events::ErrorResponse {
                                        message: "Malformed frame".to_string(),
                                    })
                                    .unwrap_or_default(),
                                );
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(error)) => {
                        tracing::warn!(%error, conn_id = conn.conn_id(), "socket error");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!(conn_id = conn.conn_id(), "client disconnected");
    dispatcher::on_disconnect(&server, &conn).await;
}
