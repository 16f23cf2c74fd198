use crate::app::server::{
    storage::interface::{leaderboard::LeaderboardInterface, user::UserInterface},
    ws::events,
    GameServer,
};

use super::room::{Player, PlayerStatus, Room};

#[derive(serde::Serialize, Clone, Debug)]
pub struct PlayerResult {
    pub user_id: String,
    pub user_name: String,
    pub peer_id: usize,
    pub player_rank: usize,
    pub player_status: u8,
    pub winning_coin: u64,
}

/// Rank the roster and price each seat. Winners sort first, stable, so ties
/// between winners resolve by roster order; everyone else keeps roster order
/// behind them. Bets were taken at join time, so losers' net is -bet.
pub fn compute_results(room: &Room) -> Vec<PlayerResult> {
    let mut seats: Vec<&Player> = room.players.iter().collect();
    seats.sort_by_key(|player| u8::from(player.status != PlayerStatus::Win));

    seats
        .iter()
        .enumerate()
        .map(|(index, player)| {
            let player_rank = index + 1;
            PlayerResult {
                user_id: player.user_id.clone(),
                user_name: player.user_name.clone(),
                peer_id: player.peer_id,
                player_rank,
                player_status: player.status.code(),
                winning_coin: payout(room.max_players, room.bet_amount, player_rank, player.status),
            }
        })
        .collect()
}

/// 2-player: winner takes the pool. 4-player: 3x to first, 1x to second,
/// zero rake either way. Non-winners get nothing regardless of rank.
fn payout(max_players: usize, bet_amount: u64, rank: usize, status: PlayerStatus) -> u64 {
    if status != PlayerStatus::Win {
        return 0;
    }
    match (max_players, rank) {
        (2, 1) => 2 * bet_amount,
        (4, 1) => 3 * bet_amount,
        (4, 2) => bet_amount,
        _ => 0,
    }
}

/// Credit every seat, update stats and the leaderboard, then announce the
/// outcome. Credits are best-effort per user; `game_over` goes out only
/// after every credit has been attempted. Idempotent per room.
pub async fn settle_room(server: &GameServer, room: &mut Room) -> Vec<PlayerResult> {
    if room.settled {
        return Vec::new();
    }
    room.settled = true;

    let results = compute_results(room);

    for result in &results {
        match server.store.find_user(&result.user_id).await {
            Ok(mut user) => {
                user.coins += result.winning_coin;
                if result.player_status == PlayerStatus::Win.code() {
                    user.record_win();
                } else {
                    user.record_loss();
                }

                let win_count = user.win_count;
                if let Err(error) = server.store.insert_user(user).await {
                    tracing::error!(?error, user_id = %result.user_id, "settlement credit failed");
                    continue;
                }
                if let Err(error) = server
                    .store
                    .leaderboard_upsert(&result.user_id, win_count)
                    .await
                {
                    tracing::error!(?error, user_id = %result.user_id, "leaderboard upsert failed");
                }
            }
            Err(error) => {
                tracing::error!(?error, user_id = %result.user_id, "settlement skipped unknown user");
            }
        }
    }

    let payload = serde_json::to_string(&results).unwrap_or_default();
    room.broadcast(events::GAME_OVER, &payload);

    tracing::info!(room_id = %room.room_id, results = results.len(), "room settled");
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::server::ws::session::ConnectionHandle;
    use tokio::sync::mpsc;

    fn test_conn() -> ConnectionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        std::mem::forget(rx);
        ConnectionHandle::new(tx)
    }

    fn room(bet_amount: u64, max_players: usize) -> Room {
        let mut room = Room::new("r1".into(), "u0".into(), bet_amount, max_players);
        for index in 0..max_players {
            room.seat(format!("u{index}"), format!("Player{index}"), test_conn());
        }
        room
    }

    #[test]
    fn two_player_winner_takes_pool() {
        let mut room = room(100, 2);
        room.players[0].status = PlayerStatus::Win;

        let results = compute_results(&room);
        assert_eq!(results[0].user_id, "u0");
        assert_eq!(results[0].player_rank, 1);
        assert_eq!(results[0].winning_coin, 200);
        assert_eq!(results[1].user_id, "u1");
        assert_eq!(results[1].player_rank, 2);
        assert_eq!(results[1].winning_coin, 0);
        assert_eq!(results[1].player_status, PlayerStatus::Playing.code());

        let pool: u64 = results.iter().map(|r| r.winning_coin).sum();
        assert_eq!(pool, 2 * room.bet_amount);
    }

    #[test]
    fn four_player_split_pays_first_and_second_winner() {
        let mut room = room(50, 4);
        room.players[0].status = PlayerStatus::Win;
        room.players[1].status = PlayerStatus::Win;
        room.players[2].status = PlayerStatus::Win;

        let results = compute_results(&room);
        assert_eq!(results[0].winning_coin, 150);
        assert_eq!(results[1].winning_coin, 50);
        // Third winner ranks 3 and is outside the paid places.
        assert_eq!(results[2].winning_coin, 0);
        assert_eq!(results[3].winning_coin, 0);

        let pool: u64 = results.iter().map(|r| r.winning_coin).sum();
        assert_eq!(pool, 4 * room.bet_amount);
    }

    #[test]
    fn non_winners_rank_in_roster_order() {
        let mut room = room(50, 4);
        room.players[2].status = PlayerStatus::Win;
        room.players[0].status = PlayerStatus::Timeout;
        room.players[3].status = PlayerStatus::Left;

        let results = compute_results(&room);
        assert_eq!(results[0].user_id, "u2");
        assert_eq!(results[0].winning_coin, 150);
        // Remaining seats follow in roster order: u0, u1, u3.
        assert_eq!(results[1].user_id, "u0");
        assert_eq!(results[2].user_id, "u1");
        assert_eq!(results[3].user_id, "u3");
        assert_eq!(results[1].player_status, PlayerStatus::Timeout.code());
        assert_eq!(results[3].player_status, PlayerStatus::Left.code());
    }

    #[test]
    fn timeout_win_never_pays_non_winner() {
        let mut room = room(100, 2);
        room.players[0].status = PlayerStatus::Timeout;
        room.players[1].status = PlayerStatus::Win;

        let results = compute_results(&room);
        assert_eq!(results[0].user_id, "u1");
        assert_eq!(results[0].winning_coin, 200);
        assert_eq!(results[1].user_id, "u0");
        assert_eq!(results[1].winning_coin, 0);
    }
}
