use crate::game::Game;

use super::models::{PlayerSummary, RecentResult};

pub const RECENT_RESULTS_LIMIT: usize = 5;

/// Read-only view deriving per-player numbers from archived games
pub struct StatsAggregator<'a> {
    history: &'a [Game],
}

impl<'a> StatsAggregator<'a> {
    pub fn new(history: &'a [Game]) -> Self {
        Self { history }
    }

    /// Games the player took part in, most recent first
    pub fn games_for<'s>(&'s self, player_id: &'s str) -> impl Iterator<Item = &'a Game> + 's {
        let history = self.history;
        history.iter().filter(move |g| g.has_player(player_id))
    }

    pub fn summary(&self, player_id: &str) -> PlayerSummary {
        let (total_games, wins) = self
            .games_for(player_id)
            .fold((0u32, 0u32), |(total, wins), game| {
                (total + 1, wins + u32::from(won(game, player_id)))
            });

        PlayerSummary {
            total_games,
            wins,
            win_rate: win_rate(wins, total_games),
        }
    }

    pub fn recent_results(&self, player_id: &str, limit: usize) -> Vec<RecentResult> {
        self.games_for(player_id)
            .take(limit)
            .map(|game| RecentResult {
                game_id: game.id.clone(),
                game_type: game.game_type(),
                won: won(game, player_id),
                ended_at: game.ended_at,
            })
            .collect()
    }
}

fn won(game: &Game, player_id: &str) -> bool {
    game.winner.as_ref().is_some_and(|w| w.id == player_id)
}

/// round(100 * wins / total), halves rounding up; 0 when no games
fn win_rate(wins: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (200 * wins + total) / (2 * total)
}
