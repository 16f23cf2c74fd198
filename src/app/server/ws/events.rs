//! Wire vocabulary. Event names and payload field casing are protocol,
//! shared with the mobile clients, and must not be renamed (including the
//! `dice_recieved` / `token_recieved` spellings).

// Inbound
pub const ADD_USER: &str = "add_user";
pub const GET_USERDATA: &str = "get_userdata";
pub const REQUEST_JOIN: &str = "request_join";
pub const FRIEND_CREATE_ROOM: &str = "friend_create_room";
pub const FRIEND_JOIN_ROOM: &str = "friend_join_room";
pub const DICE_SEND: &str = "dice_send";
pub const TOKEN_SEND: &str = "token_send";
pub const TOKEN_RESET: &str = "token_reset";
pub const CHANGE_TURN: &str = "change_turn";
pub const WIN_GAME: &str = "win_game";
pub const LEAVE_ROOM: &str = "leave_room";
pub const USER_CHAT: &str = "user_chat";
pub const USER_EMOJI_ID: &str = "user_emoji_id";
pub const USER_SEND_GIFT: &str = "user_send_gift";
pub const GET_PREVIOUS_ROOM: &str = "get_previous_room";
pub const REMOVE_FROM_MATCHMAKING: &str = "remove_from_matchmaking";

// Outbound
pub const AUTH_TOKEN: &str = "auth_token";
pub const USER_DATA: &str = "user_data";
pub const GAME_START: &str = "game_start";
pub const TURN_CHANGED: &str = "turn_changed";
pub const DICE_RECIEVED: &str = "dice_recieved";
pub const TOKEN_RECIEVED: &str = "token_recieved";
pub const USER_TIMEOUT_COUNTER: &str = "user_timeout_counter";
pub const USER_TIMEOUT: &str = "user_timeout";
pub const GAME_OVER: &str = "game_over";
pub const PLAYER_JOINED: &str = "player_joined";
pub const FRIEND_ROOM_CODE: &str = "friend_room_code";
pub const PREVIOUS_ROOM_DATA: &str = "previous_room_data";
pub const ROOM_NOT_FOUND: &str = "room_not_found";
pub const INSUFFICIENT_COINS: &str = "insufficient_coins";
pub const FRIEND_ERROR_RESPONSE: &str = "friend_error_response";
pub const ERROR: &str = "error";

/// One websocket text message. `data` is itself a JSON document encoded as
/// a string, except `remove_from_matchmaking` where it is a bare user id.
#[derive(serde::Deserialize, serde::Serialize, Debug)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: String,
}

// -- Inbound payloads --------------------------------------------------------

#[derive(serde::Deserialize, Debug)]
pub struct AddUser {
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub fcm_token: Option<String>,
}

#[derive(serde::Deserialize, Debug)]
pub struct GetUserData {
    pub user_id: String,
    pub user_name: String,
}

#[derive(serde::Deserialize, Debug)]
pub struct RequestJoin {
    pub user_id: String,
    pub user_name: String,
    pub room_coin_value: u64,
    pub room_players_size: usize,
}

#[derive(serde::Deserialize, Debug)]
pub struct FriendCreateRoom {
    pub user_id: String,
    pub user_name: String,
    pub room_coin_value: u64,
    pub room_players_size: usize,
    #[serde(default)]
    pub room_code: Option<String>,
}

#[derive(serde::Deserialize, Debug)]
pub struct FriendJoinRoom {
    pub user_id: String,
    pub user_name: String,
    pub room_code: String,
}

#[derive(serde::Deserialize, Debug)]
pub struct DiceSend {
    pub room_id: String,
    pub peer_id: usize,
    pub dice_face: u8,
}

#[derive(serde::Deserialize, Debug)]
pub struct TokenSend {
    pub room_id: String,
    pub peer_id: usize,
    pub token_id: u32,
    pub token_value: i32,
}

#[derive(serde::Deserialize, Debug)]
pub struct ChangeTurn {
    pub room_id: String,
    pub peer_id: usize,
}

#[derive(serde::Deserialize, Debug)]
pub struct WinGame {
    pub room_id: String,
    pub peer_id: usize,
    #[serde(default)]
    pub player_rank: usize,
}

#[derive(serde::Deserialize, Debug)]
pub struct LeaveRoom {
    pub room_id: String,
    pub peer_id: usize,
}

#[derive(serde::Deserialize, serde::Serialize, Debug)]
pub struct UserChat {
    pub room_id: String,
    pub peer_id: usize,
    pub chat_text: String,
}

#[derive(serde::Deserialize, serde::Serialize, Debug)]
pub struct UserEmoji {
    pub room_id: String,
    pub peer_id: usize,
    pub emoji_id: u32,
}

#[derive(serde::Deserialize, serde::Serialize, Debug)]
pub struct UserSendGift {
    pub room_id: String,
    pub peer_id: usize,
    pub gift_id: u32,
}

#[derive(serde::Deserialize, Debug)]
pub struct GetPreviousRoom {
    pub room_id: String,
    pub user_id: String,
}

// -- Outbound payloads -------------------------------------------------------

#[derive(serde::Serialize, Debug)]
pub struct UserData {
    pub user_id: String,
    pub user_name: String,
    pub user_coin: u64,
    pub numof_win: u64,
    pub numof_lose: u64,
    pub user_level: u64,
    pub total_games: u64,
}

#[derive(serde::Serialize, Debug)]
pub struct GameStart {
    pub room_id: String,
    pub room_coin: u64,
    pub userdata: Vec<RoomUserData>,
}

#[derive(serde::Serialize, Debug)]
pub struct RoomUserData {
    pub user_id: String,
    pub user_name: String,
    pub peer_id: usize,
}

#[derive(serde::Serialize, Debug)]
pub struct DiceRecieved {
    pub peer_id: usize,
    pub dice_face: u8,
}

#[derive(serde::Serialize, Debug)]
pub struct TokenRecieved {
    pub peer_id: usize,
    pub token_id: u32,
    pub token_value: i32,
    pub dice_face: u8,
}

#[derive(serde::Serialize, Debug)]
pub struct UserTimeoutCounter {
    pub peer_id: usize,
    pub numoftimeout: u8,
}

#[derive(serde::Serialize, Debug)]
pub struct PlayerJoined {
    pub peer_id: usize,
    pub user_name: String,
    pub player_count: usize,
    pub max_players: usize,
}

#[derive(serde::Serialize, Debug)]
pub struct FriendRoomCode {
    pub room_code: String,
}

#[derive(serde::Serialize, Debug)]
pub struct LeaveRoomNotice {
    pub room_id: String,
    pub peer_id: usize,
}

/// Full room snapshot sent to a reconnecting player.
#[derive(serde::Serialize, Debug)]
pub struct PreviousRoomData {
    pub room_id: String,
    pub room_coin: u64,
    pub max_players: usize,
    pub peer_id: usize,
    pub current_turn: usize,
    pub userdata: Vec<RoomPlayerData>,
    pub game_data: crate::app::server::game::room::GameData,
}

#[derive(serde::Serialize, Debug)]
pub struct RoomPlayerData {
    pub user_id: String,
    pub user_name: String,
    pub peer_id: usize,
    pub player_status: u8,
    pub numoftimeout: u8,
}

#[derive(serde::Serialize, Debug)]
pub struct RoomNotFound {
    pub room_id: String,
}

#[derive(serde::Serialize, Debug)]
pub struct InsufficientCoins {
    pub required: u64,
    pub current: u64,
}

#[derive(serde::Serialize, Debug)]
pub struct FriendErrorResponse {
    pub message: String,
}

#[derive(serde::Serialize, Debug)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_data_defaults_to_empty() {
        let frame: Frame = serde_json::from_str(r#"{"event":"leave_room"}"#).unwrap();
        assert_eq!(frame.event, "leave_room");
        assert_eq!(frame.data, "");
    }

    #[test]
    fn inbound_field_names_match_protocol() {
        let join: RequestJoin = serde_json::from_str(
            r#"{"user_id":"u1","user_name":"Asha","room_coin_value":100,"room_players_size":2}"#,
        )
        .unwrap();
        assert_eq!(join.room_coin_value, 100);
        assert_eq!(join.room_players_size, 2);

        let dice: DiceSend =
            serde_json::from_str(r#"{"room_id":"r","peer_id":1,"dice_face":6}"#).unwrap();
        assert_eq!(dice.dice_face, 6);
    }

    #[test]
    fn outbound_field_names_match_protocol() {
        let payload = serde_json::to_value(UserData {
            user_id: "u1".into(),
            user_name: "Asha".into(),
            user_coin: 900,
            numof_win: 1,
            numof_lose: 2,
            user_level: 1,
            total_games: 3,
        })
        .unwrap();
        assert!(payload.get("user_coin").is_some());
        assert!(payload.get("numof_win").is_some());
        assert!(payload.get("numof_lose").is_some());
        assert!(payload.get("total_games").is_some());

        let token = serde_json::to_value(TokenRecieved {
            peer_id: 0,
            token_id: 2,
            token_value: 14,
            dice_face: 0,
        })
        .unwrap();
        assert_eq!(token.get("dice_face").unwrap(), 0);
    }
}
