use crate::app::server::SharedServer;
use crate::app::types;

use super::{dispatcher, room::Room};

/// Rearm the one-shot turn timer. The prior handle is aborted and the
/// sequence bumped, so a fire that lost the race no-ops on arrival.
pub fn arm_turn_timer(server: &SharedServer, room: &mut Room) {
    room.timer_seq += 1;
    if let Some(handle) = room.turn_timer.take() {
        handle.abort();
    }

    let seq = room.timer_seq;
    let room_id = room.room_id.clone();
    let server = server.clone();

    room.turn_timer = Some(tokio::spawn(async move {
        tokio::time::sleep(types::TURN_TIMEOUT).await;
        dispatcher::on_turn_timer(server, room_id, seq).await;
    }));
}

pub fn disarm_turn_timer(room: &mut Room) {
    room.timer_seq += 1;
    if let Some(handle) = room.turn_timer.take() {
        handle.abort();
    }
}

/// Payout after the client-side win animation. Not cancellable by client
/// action; the callback tolerates the room having been deleted meanwhile.
pub fn schedule_delayed_settlement(server: &SharedServer, room_id: &str) {
    let server = server.clone();
    let room_id = room_id.to_string();
    tokio::spawn(async move {
        tokio::time::sleep(types::WIN_SETTLE_DELAY).await;
        dispatcher::on_delayed_settlement(server, room_id).await;
    });
}

/// Finished rooms are dropped from the registry after a short linger.
pub fn schedule_room_cleanup(server: &SharedServer, room_id: &str) {
    let server = server.clone();
    let room_id = room_id.to_string();
    tokio::spawn(async move {
        tokio::time::sleep(types::ROOM_CLEANUP_DELAY).await;
        server.rooms.remove(&room_id);
        tracing::info!(%room_id, "finished room removed");
    });
}

/// Reconnection window after a transport drop mid-game. The callback checks
/// whether the departed connection was replaced before acting.
pub fn schedule_disconnect_grace(
    server: &SharedServer,
    user_id: String,
    room_id: String,
    conn_id: u64,
) {
    let server = server.clone();
    tokio::spawn(async move {
        tokio::time::sleep(types::DISCONNECT_GRACE).await;
        dispatcher::on_disconnect_grace(server, user_id, room_id, conn_id).await;
    });
}
