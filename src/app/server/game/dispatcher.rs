use serde::de::DeserializeOwned;

use crate::app::server::{
    errors::{ApiError, ResultExtApp},
    storage::{interface::user::UserInterface, models},
    ws::{events, session::ConnectionHandle},
    GameServer, SharedServer,
};
use crate::app::{types, utils};

use super::{
    room::{PlayerStatus, Room, RoomStatus},
    settlement, timer,
};

/// Route one inbound frame. Handlers never raise to the connection loop:
/// failures are logged and mapped to the client-visible failure events.
pub async fn dispatch(server: &SharedServer, conn: &ConnectionHandle, event: &str, data: &str) {
    let result = match event {
        events::ADD_USER => handle_add_user(server, conn, data).await,
        events::GET_USERDATA => handle_get_userdata(server, conn, data).await,
        events::REQUEST_JOIN => handle_request_join(server, conn, data).await,
        events::FRIEND_CREATE_ROOM => handle_friend_create_room(server, conn, data).await,
        events::FRIEND_JOIN_ROOM => handle_friend_join_room(server, conn, data).await,
        events::DICE_SEND => handle_dice_send(server, data).await,
        events::TOKEN_SEND => handle_token_send(server, data).await,
        events::TOKEN_RESET => handle_token_reset(server, data).await,
        events::CHANGE_TURN => handle_change_turn(server, data).await,
        events::WIN_GAME => handle_win_game(server, data).await,
        events::LEAVE_ROOM => handle_leave_room(server, data).await,
        events::USER_CHAT => handle_relay::<events::UserChat>(server, events::USER_CHAT, data).await,
        events::USER_EMOJI_ID => {
            handle_relay::<events::UserEmoji>(server, events::USER_EMOJI_ID, data).await
        }
        events::USER_SEND_GIFT => {
            handle_relay::<events::UserSendGift>(server, events::USER_SEND_GIFT, data).await
        }
        events::GET_PREVIOUS_ROOM => handle_get_previous_room(server, conn, data).await,
        events::REMOVE_FROM_MATCHMAKING => handle_remove_from_matchmaking(server, data).await,
        unknown => {
            tracing::warn!(event = unknown, "dropping unknown event");
            Ok(())
        }
    };

    if let Err(error) = result {
        tracing::error!(?error, event, "event handler failed");
        emit_error(conn, error);
    }
}

fn emit_error(conn: &ConnectionHandle, error: ApiError) {
    match error {
        ApiError::InsufficientCoins { required, current } => conn.emit(
            events::INSUFFICIENT_COINS,
            encode(&events::InsufficientCoins { required, current }),
        ),
        ApiError::RoomNotFound { room_id } => conn.emit(
            events::ROOM_NOT_FOUND,
            encode(&events::RoomNotFound { room_id }),
        ),
        ApiError::RoomFull
        | ApiError::GameAlreadyStarted
        | ApiError::RoomAlreadyExists { .. }
        | ApiError::UserNotFound { .. } => conn.emit(
            events::FRIEND_ERROR_RESPONSE,
            encode(&events::FriendErrorResponse {
                message: error.to_string(),
            }),
        ),
        ApiError::BadRequest { .. } | ApiError::InternalServerError => conn.emit(
            events::ERROR,
            encode(&events::ErrorResponse {
                message: error.to_string(),
            }),
        ),
    }
}

fn parse_payload<T: DeserializeOwned>(data: &str) -> Result<T, ApiError> {
    serde_json::from_str(data).map_err(|error| {
        tracing::warn!(%error, "malformed payload");
        ApiError::BadRequest {
            message: "Malformed payload".to_string(),
        }
    })
}

fn encode<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

// -- Identity & economy ------------------------------------------------------

async fn handle_add_user(
    server: &SharedServer,
    conn: &ConnectionHandle,
    data: &str,
) -> Result<(), ApiError> {
    let payload: events::AddUser = parse_payload(data)?;

    server.sessions.bind(&payload.user_id, conn.clone());
    conn.emit(
        events::AUTH_TOKEN,
        encode(&utils::generate_auth_token(&payload.user_id)),
    );

    tracing::info!(user_id = %payload.user_id, "session bound");
    Ok(())
}

async fn handle_get_userdata(
    server: &SharedServer,
    conn: &ConnectionHandle,
    data: &str,
) -> Result<(), ApiError> {
    let payload: events::GetUserData = parse_payload(data)?;
    conn.bind_user(&payload.user_id);

    let user = match server.store.find_user(&payload.user_id).await {
        Ok(user) => user,
        Err(error) if error.is_not_found() => {
            // First sight of this user: create the profile with the grant.
            let fresh = models::User::new(payload.user_id.clone(), payload.user_name.clone());
            server
                .store
                .insert_user(fresh)
                .await
                .to_internal_api_error()?
        }
        Err(error) => {
            tracing::error!(db_error = ?error);
            return Err(ApiError::InternalServerError);
        }
    };

    conn.emit(
        events::USER_DATA,
        encode(&events::UserData {
            user_id: user.user_id,
            user_name: user.user_name,
            user_coin: user.coins,
            numof_win: user.win_count,
            numof_lose: user.lost_count,
            user_level: user.level,
            total_games: user.total_games_played,
        }),
    );
    Ok(())
}

/// Debit the stake before seating. The caller must reverse this with
/// `refund_bet` if seating subsequently fails.
async fn deduct_bet(
    server: &GameServer,
    user_id: &str,
    bet_amount: u64,
) -> Result<models::User, ApiError> {
    let mut user = server
        .store
        .find_user(user_id)
        .await
        .to_not_found(ApiError::UserNotFound {
            user_id: user_id.to_string(),
        })?;

    if user.coins < bet_amount {
        return Err(ApiError::InsufficientCoins {
            required: bet_amount,
            current: user.coins,
        });
    }

    user.coins -= bet_amount;
    server.store.insert_user(user).await.to_internal_api_error()
}

async fn refund_bet(server: &GameServer, user_id: &str, bet_amount: u64) {
    match server.store.find_user(user_id).await {
        Ok(mut user) => {
            user.coins += bet_amount;
            if let Err(error) = server.store.insert_user(user).await {
                tracing::error!(?error, user_id, bet_amount, "bet refund failed");
            }
        }
        Err(error) => tracing::error!(?error, user_id, bet_amount, "bet refund failed"),
    }
}

fn validate_table(bet_amount: u64, max_players: usize) -> Result<(), ApiError> {
    if bet_amount == 0 || !matches!(max_players, 2 | 4) {
        return Err(ApiError::BadRequest {
            message: "Invalid room parameters".to_string(),
        });
    }
    Ok(())
}

// -- Joining -----------------------------------------------------------------

async fn handle_request_join(
    server: &SharedServer,
    conn: &ConnectionHandle,
    data: &str,
) -> Result<(), ApiError> {
    let payload: events::RequestJoin = parse_payload(data)?;
    validate_table(payload.room_coin_value, payload.room_players_size)?;
    conn.bind_user(&payload.user_id);

    deduct_bet(server, &payload.user_id, payload.room_coin_value).await?;

    // A found room can fill between the scan and our lock; re-check seated
    // and fall through to a fresh room rather than overbooking.
    loop {
        let shared = match server
            .rooms
            .find_available(payload.room_coin_value, payload.room_players_size)
            .await
        {
            Some(shared) => shared,
            None => server.rooms.insert(Room::new(
                utils::generate_room_id(),
                payload.user_id.clone(),
                payload.room_coin_value,
                payload.room_players_size,
            )),
        };

        let mut room = shared.lock().await;
        if !room.has_seat() {
            continue;
        }

        seat_player(
            server,
            conn,
            &mut room,
            payload.user_id.clone(),
            payload.user_name.clone(),
        );
        return Ok(());
    }
}

async fn handle_friend_create_room(
    server: &SharedServer,
    conn: &ConnectionHandle,
    data: &str,
) -> Result<(), ApiError> {
    let payload: events::FriendCreateRoom = parse_payload(data)?;
    validate_table(payload.room_coin_value, payload.room_players_size)?;
    conn.bind_user(&payload.user_id);

    let room_code = payload
        .room_code
        .filter(|code| !code.trim().is_empty())
        .map(|code| code.trim().to_uppercase())
        .unwrap_or_else(utils::generate_room_code);

    if server.rooms.contains(&room_code) {
        return Err(ApiError::RoomAlreadyExists { room_id: room_code });
    }

    deduct_bet(server, &payload.user_id, payload.room_coin_value).await?;

    let room = Room::new(
        room_code.clone(),
        payload.user_id.clone(),
        payload.room_coin_value,
        payload.room_players_size,
    );
    let Some(shared) = server.rooms.insert_if_absent(room) else {
        // Lost a creation race on the same code.
        refund_bet(server, &payload.user_id, payload.room_coin_value).await;
        return Err(ApiError::RoomAlreadyExists { room_id: room_code });
    };

    conn.emit(
        events::FRIEND_ROOM_CODE,
        encode(&events::FriendRoomCode {
            room_code: room_code.clone(),
        }),
    );

    let mut room = shared.lock().await;
    seat_player(server, conn, &mut room, payload.user_id, payload.user_name);
    tracing::info!(%room_code, "friend room created");
    Ok(())
}

async fn handle_friend_join_room(
    server: &SharedServer,
    conn: &ConnectionHandle,
    data: &str,
) -> Result<(), ApiError> {
    let payload: events::FriendJoinRoom = parse_payload(data)?;
    conn.bind_user(&payload.user_id);

    let room_code = payload.room_code.trim().to_uppercase();
    let Some(shared) = server.rooms.get(&room_code) else {
        conn.emit(
            events::FRIEND_ERROR_RESPONSE,
            encode(&events::FriendErrorResponse {
                message: "Room not found".to_string(),
            }),
        );
        return Ok(());
    };

    let bet_amount = shared.lock().await.bet_amount;
    deduct_bet(server, &payload.user_id, bet_amount).await?;

    let mut room = shared.lock().await;
    if room.is_full() {
        refund_bet(server, &payload.user_id, bet_amount).await;
        return Err(ApiError::RoomFull);
    }
    if room.status != RoomStatus::Waiting {
        refund_bet(server, &payload.user_id, bet_amount).await;
        return Err(ApiError::GameAlreadyStarted);
    }
    if room.player_by_user_id(&payload.user_id).is_some() {
        refund_bet(server, &payload.user_id, bet_amount).await;
        return Err(ApiError::BadRequest {
            message: "User already seated in this room".to_string(),
        });
    }

    seat_player(server, conn, &mut room, payload.user_id, payload.user_name);
    Ok(())
}

fn seat_player(
    server: &SharedServer,
    conn: &ConnectionHandle,
    room: &mut Room,
    user_id: String,
    user_name: String,
) {
    let peer_id = room.seat(user_id, user_name.clone(), conn.clone());
    conn.set_room(&room.room_id);

    room.broadcast(
        events::PLAYER_JOINED,
        &encode(&events::PlayerJoined {
            peer_id,
            user_name,
            player_count: room.players.len(),
            max_players: room.max_players,
        }),
    );

    if room.is_full() {
        start_game(server, room);
    }
}

fn start_game(server: &SharedServer, room: &mut Room) {
    room.status = RoomStatus::Playing;
    room.current_turn = 0;

    let userdata = room
        .players
        .iter()
        .map(|player| events::RoomUserData {
            user_id: player.user_id.clone(),
            user_name: player.user_name.clone(),
            peer_id: player.peer_id,
        })
        .collect();

    room.broadcast(
        events::GAME_START,
        &encode(&events::GameStart {
            room_id: room.room_id.clone(),
            room_coin: room.bet_amount,
            userdata,
        }),
    );

    timer::arm_turn_timer(server, room);
    tracing::info!(room_id = %room.room_id, players = room.players.len(), "game started");
}

// -- In-game relays ----------------------------------------------------------

async fn handle_dice_send(server: &SharedServer, data: &str) -> Result<(), ApiError> {
    let payload: events::DiceSend = parse_payload(data)?;
    let Some(shared) = server.rooms.get(&payload.room_id) else {
        tracing::debug!(room_id = %payload.room_id, "dice for unknown room dropped");
        return Ok(());
    };

    let mut room = shared.lock().await;
    if room.status != RoomStatus::Playing {
        return Ok(());
    }

    room.game_data.last_dice = payload.dice_face;
    room.broadcast_except(
        payload.peer_id,
        events::DICE_RECIEVED,
        &encode(&events::DiceRecieved {
            peer_id: payload.peer_id,
            dice_face: payload.dice_face,
        }),
    );
    timer::arm_turn_timer(server, &mut room);
    Ok(())
}

async fn handle_token_send(server: &SharedServer, data: &str) -> Result<(), ApiError> {
    let payload: events::TokenSend = parse_payload(data)?;
    let Some(shared) = server.rooms.get(&payload.room_id) else {
        tracing::debug!(room_id = %payload.room_id, "token for unknown room dropped");
        return Ok(());
    };

    let mut room = shared.lock().await;
    if room.status != RoomStatus::Playing {
        return Ok(());
    }

    room.record_move(payload.peer_id, payload.token_id, payload.token_value);
    let dice_face = room.game_data.last_dice;
    room.broadcast_except(
        payload.peer_id,
        events::TOKEN_RECIEVED,
        &encode(&events::TokenRecieved {
            peer_id: payload.peer_id,
            token_id: payload.token_id,
            token_value: payload.token_value,
            dice_face,
        }),
    );
    timer::arm_turn_timer(server, &mut room);
    Ok(())
}

/// A kill notice travels to the killed token's owner, never back to the
/// sender, and carries no dice face.
async fn handle_token_reset(server: &SharedServer, data: &str) -> Result<(), ApiError> {
    let payload: events::TokenSend = parse_payload(data)?;
    let Some(shared) = server.rooms.get(&payload.room_id) else {
        return Ok(());
    };

    let room = shared.lock().await;
    if room.status != RoomStatus::Playing {
        return Ok(());
    }

    room.broadcast_except(
        payload.peer_id,
        events::TOKEN_RECIEVED,
        &encode(&events::TokenRecieved {
            peer_id: payload.peer_id,
            token_id: payload.token_id,
            token_value: payload.token_value,
            dice_face: 0,
        }),
    );
    Ok(())
}

async fn handle_change_turn(server: &SharedServer, data: &str) -> Result<(), ApiError> {
    let payload: events::ChangeTurn = parse_payload(data)?;
    let Some(shared) = server.rooms.get(&payload.room_id) else {
        return Ok(());
    };

    let mut room = shared.lock().await;
    if room.status != RoomStatus::Playing {
        return Ok(());
    }

    if !advance_and_announce(server, &mut room) {
        finish_room(server, &mut room).await;
    }
    Ok(())
}

async fn handle_win_game(server: &SharedServer, data: &str) -> Result<(), ApiError> {
    let payload: events::WinGame = parse_payload(data)?;
    let Some(shared) = server.rooms.get(&payload.room_id) else {
        return Ok(());
    };

    let mut room = shared.lock().await;
    if room.status != RoomStatus::Playing {
        return Ok(());
    }
    match room.player_by_peer(payload.peer_id) {
        Some(player) if player.status == PlayerStatus::Playing => {}
        _ => return Ok(()),
    }

    room.players[payload.peer_id].status = PlayerStatus::Win;
    room.broadcast_except(payload.peer_id, events::WIN_GAME, &encode(&payload.peer_id));

    if room.playing_count() <= 1 {
        finish_room(server, &mut room).await;
    } else if room.players[room.current_turn].status != PlayerStatus::Playing
        && !advance_and_announce(server, &mut room)
    {
        finish_room(server, &mut room).await;
    }
    Ok(())
}

async fn handle_leave_room(server: &SharedServer, data: &str) -> Result<(), ApiError> {
    let payload: events::LeaveRoom = parse_payload(data)?;
    let Some(shared) = server.rooms.get(&payload.room_id) else {
        return Ok(());
    };

    let mut room = shared.lock().await;
    match room.status {
        RoomStatus::Waiting => {
            if mark_left_in_waiting(&mut room, payload.peer_id) && room.all_seats_left() {
                let room_id = room.room_id.clone();
                drop(room);
                server.rooms.remove(&room_id);
                tracing::info!(%room_id, "waiting room emptied");
            }
        }
        RoomStatus::Playing => {
            let Some(player) = room.player_by_peer_mut(payload.peer_id) else {
                return Ok(());
            };
            if player.status != PlayerStatus::Playing {
                return Ok(());
            }
            player.status = PlayerStatus::Left;
            player.conn.clear_room();

            room.broadcast_except(
                payload.peer_id,
                events::LEAVE_ROOM,
                &encode(&events::LeaveRoomNotice {
                    room_id: room.room_id.clone(),
                    peer_id: payload.peer_id,
                }),
            );

            resolve_departure(server, &mut room).await;
        }
        RoomStatus::Finished => {}
    }
    Ok(())
}

/// Mark a WAITING seat abandoned. The seat stays in the roster (peer ids
/// are positional) and the stake is not refunded.
fn mark_left_in_waiting(room: &mut Room, peer_id: usize) -> bool {
    let Some(player) = room.player_by_peer_mut(peer_id) else {
        return false;
    };
    if player.status != PlayerStatus::Playing {
        return false;
    }
    player.status = PlayerStatus::Left;
    player.conn.clear_room();

    room.broadcast_except(
        peer_id,
        events::LEAVE_ROOM,
        &encode(&events::LeaveRoomNotice {
            room_id: room.room_id.clone(),
            peer_id,
        }),
    );
    true
}

/// After a seat stops playing mid-game: last survivor wins and is paid
/// immediately; an empty table settles as-is; otherwise a dangling cursor
/// moves on.
async fn resolve_departure(server: &SharedServer, room: &mut Room) {
    match room.playing_count() {
        0 => finish_room(server, room).await,
        1 => {
            let survivor = room.playing_peers()[0];
            room.players[survivor].status = PlayerStatus::Win;
            room.broadcast(events::WIN_GAME, &encode(&survivor));
            finish_room(server, room).await;
        }
        _ => {
            if room.players[room.current_turn].status != PlayerStatus::Playing
                && !advance_and_announce(server, room)
            {
                finish_room(server, room).await;
            }
        }
    }
}

/// Move the cursor and tell the table. False means nobody can act and the
/// caller must terminate the game.
fn advance_and_announce(server: &SharedServer, room: &mut Room) -> bool {
    match room.advance_turn() {
        Some(next_peer) => {
            room.broadcast(events::TURN_CHANGED, &encode(&next_peer));
            timer::arm_turn_timer(server, room);
            true
        }
        None => false,
    }
}

async fn finish_room(server: &SharedServer, room: &mut Room) {
    room.status = RoomStatus::Finished;
    timer::disarm_turn_timer(room);
    settlement::settle_room(server, room).await;
    timer::schedule_room_cleanup(server, &room.room_id);
}

async fn handle_relay<T: DeserializeOwned + serde::Serialize>(
    server: &SharedServer,
    event: &str,
    data: &str,
) -> Result<(), ApiError> {
    let payload: T = parse_payload(data)?;
    let value = serde_json::to_value(&payload).map_err(|_| ApiError::InternalServerError)?;

    let (Some(room_id), Some(peer_id)) = (
        value.get("room_id").and_then(|v| v.as_str()),
        value.get("peer_id").and_then(|v| v.as_u64()),
    ) else {
        return Ok(());
    };

    let Some(shared) = server.rooms.get(room_id) else {
        return Ok(());
    };

    let room = shared.lock().await;
    room.broadcast_except(peer_id as usize, event, &encode(&payload));
    Ok(())
}

// -- Reconnection & withdrawal -----------------------------------------------

async fn handle_get_previous_room(
    server: &SharedServer,
    conn: &ConnectionHandle,
    data: &str,
) -> Result<(), ApiError> {
    let payload: events::GetPreviousRoom = parse_payload(data)?;
    conn.bind_user(&payload.user_id);

    let Some(shared) = server.rooms.get(&payload.room_id) else {
        return Err(ApiError::RoomNotFound {
            room_id: payload.room_id,
        });
    };

    let mut room = shared.lock().await;
    let Some(player) = room.player_by_user_id_mut(&payload.user_id) else {
        return Err(ApiError::RoomNotFound {
            room_id: payload.room_id,
        });
    };

    // Rebind the seat to the fresh transport and rejoin the broadcast group.
    player.conn = conn.clone();
    let peer_id = player.peer_id;
    server.sessions.bind(&payload.user_id, conn.clone());
    conn.set_room(&room.room_id);

    let userdata = room
        .players
        .iter()
        .map(|seat| events::RoomPlayerData {
            user_id: seat.user_id.clone(),
            user_name: seat.user_name.clone(),
            peer_id: seat.peer_id,
            player_status: seat.status.code(),
            numoftimeout: seat.numoftimeout,
        })
        .collect();

    conn.emit(
        events::PREVIOUS_ROOM_DATA,
        encode(&events::PreviousRoomData {
            room_id: room.room_id.clone(),
            room_coin: room.bet_amount,
            max_players: room.max_players,
            peer_id,
            current_turn: room.current_turn,
            userdata,
            game_data: room.game_data.clone(),
        }),
    );

    tracing::info!(room_id = %room.room_id, user_id = %payload.user_id, "player reconnected");
    Ok(())
}

/// Withdraw a queued user. The payload is the bare user id, not JSON.
async fn handle_remove_from_matchmaking(server: &SharedServer, data: &str) -> Result<(), ApiError> {
    let user_id = data.trim().trim_matches('"');
    if user_id.is_empty() {
        return Ok(());
    }

    let Some(shared) = server.rooms.find_waiting_with_user(user_id).await else {
        return Ok(());
    };

    let mut room = shared.lock().await;
    if room.status != RoomStatus::Waiting {
        return Ok(());
    }
    let Some(peer_id) = room.player_by_user_id(user_id).map(|player| player.peer_id) else {
        return Ok(());
    };

    if mark_left_in_waiting(&mut room, peer_id) && room.all_seats_left() {
        let room_id = room.room_id.clone();
        drop(room);
        server.rooms.remove(&room_id);
        tracing::info!(%room_id, user_id, "matchmaking withdrawal emptied room");
    }
    Ok(())
}

// -- Transport callbacks -----------------------------------------------------

/// Transport ended. WAITING seats are abandoned immediately; PLAYING seats
/// get the reconnection grace window.
pub async fn on_disconnect(server: &SharedServer, conn: &ConnectionHandle) {
    let user_id = conn.user_id();
    let room_id = conn.room_id();

    if let Some(user_id) = &user_id {
        server.sessions.unbind_conn(user_id, conn.conn_id());
    }

    let Some(room_id) = room_id else {
        return;
    };
    let Some(shared) = server.rooms.get(&room_id) else {
        return;
    };

    let mut room = shared.lock().await;
    match room.status {
        RoomStatus::Waiting => {
            let departed = room
                .players
                .iter()
                .find(|player| {
                    player.conn.conn_id() == conn.conn_id()
                        && player.status == PlayerStatus::Playing
                })
                .map(|player| player.peer_id);

            if let Some(peer_id) = departed {
                if mark_left_in_waiting(&mut room, peer_id) && room.all_seats_left() {
                    drop(room);
                    server.rooms.remove(&room_id);
                    tracing::info!(%room_id, "waiting room emptied by disconnect");
                }
            }
        }
        RoomStatus::Playing => {
            let Some(user_id) = user_id else {
                return;
            };
            let still_bound = room
                .player_by_user_id(&user_id)
                .map(|player| {
                    player.conn.conn_id() == conn.conn_id()
                        && player.status == PlayerStatus::Playing
                })
                .unwrap_or(false);

            if still_bound {
                timer::schedule_disconnect_grace(server, user_id, room_id.clone(), conn.conn_id());
                tracing::info!(%room_id, "player disconnected mid-game, grace started");
            }
        }
        RoomStatus::Finished => {}
    }
}

/// Grace expired. Acts only when no reconnect replaced the departed
/// transport. Never touches the turn timer and never ends the game; the
/// turn-timer escalation owns both.
pub async fn on_disconnect_grace(
    server: SharedServer,
    user_id: String,
    room_id: String,
    conn_id: u64,
) {
    if let Some(current) = server.sessions.get(&user_id) {
        if current.conn_id() != conn_id {
            return;
        }
    }

    let Some(shared) = server.rooms.get(&room_id) else {
        return;
    };
    let mut room = shared.lock().await;
    if room.status != RoomStatus::Playing {
        return;
    }

    let Some(player) = room.player_by_user_id_mut(&user_id) else {
        return;
    };
    if player.conn.conn_id() != conn_id || player.status != PlayerStatus::Playing {
        return;
    }

    player.status = PlayerStatus::Timeout;
    let peer_id = player.peer_id;
    room.broadcast(events::USER_TIMEOUT, &encode(&peer_id));
    tracing::info!(%room_id, %user_id, "grace expired, player timed out");
}

/// Turn timer fired. Stale sequences and terminal rooms no-op; otherwise
/// escalate the current seat's strike count.
pub async fn on_turn_timer(server: SharedServer, room_id: String, seq: u64) {
    let Some(shared) = server.rooms.get(&room_id) else {
        return;
    };

    let mut room = shared.lock().await;
    if room.status != RoomStatus::Playing || room.timer_seq != seq {
        return;
    }
    room.turn_timer = None;

    let index = room.current_turn;
    let current_is_playing = room
        .players
        .get(index)
        .map(|player| player.status == PlayerStatus::Playing)
        .unwrap_or(false);

    if current_is_playing {
        let strikes = {
            let player = &mut room.players[index];
            player.numoftimeout += 1;
            player.numoftimeout
        };

        if strikes < types::MAX_TURN_TIMEOUTS {
            room.broadcast(
                events::USER_TIMEOUT_COUNTER,
                &encode(&events::UserTimeoutCounter {
                    peer_id: index,
                    numoftimeout: strikes,
                }),
            );
            if !advance_and_announce(&server, &mut room) {
                finish_room(&server, &mut room).await;
            }
            return;
        }

        room.players[index].status = PlayerStatus::Timeout;
        room.broadcast(events::USER_TIMEOUT, &encode(&index));
        tracing::info!(%room_id, peer_id = index, "player struck out");
    }

    let playing = room.playing_peers();
    match playing.len() {
        0 => finish_room(&server, &mut room).await,
        1 => {
            // Sole survivor: announce the win now, pay after the animation.
            let survivor = playing[0];
            room.players[survivor].status = PlayerStatus::Win;
            room.status = RoomStatus::Finished;
            timer::disarm_turn_timer(&mut room);
            room.broadcast(events::WIN_GAME, &encode(&survivor));
            timer::schedule_delayed_settlement(&server, &room.room_id);
            timer::schedule_room_cleanup(&server, &room.room_id);
        }
        _ => {
            if !advance_and_announce(&server, &mut room) {
                finish_room(&server, &mut room).await;
            }
        }
    }
}

/// Deferred payout after the win animation. Tolerates the room having been
/// deleted; settlement itself is idempotent.
pub async fn on_delayed_settlement(server: SharedServer, room_id: String) {
    let Some(shared) = server.rooms.get(&room_id) else {
        return;
    };

    let mut room = shared.lock().await;
    if room.status != RoomStatus::Finished {
        return;
    }
    settlement::settle_room(&server, &mut room).await;
}
