//! Score bookkeeping shared by both game modes.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

use super::models::{Game, RankOrder, Scores, Standing};

/// Turns whatever was typed into a score.
///
/// Score entry never fails during live play: leading digits are taken
/// (so `"12abc"` is 12), while blanks, non-numeric text, negative numbers
/// and values that overflow all become 0.
pub fn parse_score_input(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let unsigned = match trimmed.as_bytes().first() {
        Some(b'-') => return 0,
        Some(b'+') => &trimmed[1..],
        _ => trimmed,
    };

    let digits_end = unsigned
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(index, _)| index)
        .unwrap_or(unsigned.len());

    unsigned[..digits_end].parse().unwrap_or(0)
}

/// Deserializes a score field as typed text.
///
/// Numbers keep their digits; `null` and any other JSON value read as blank.
pub fn score_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    })
}

/// Stores the parsed input for `player_id` and returns the recorded value
pub fn set_score(scores: &mut Scores, player_id: &str, raw: &str) -> u32 {
    let score = parse_score_input(raw);
    scores.insert(player_id.to_string(), score);
    score
}

/// Sum of a player's points across every round; 0 for a game with no rounds
pub fn total_score(game: &Game, player_id: &str) -> u32 {
    game.round_scores()
        .into_iter()
        .map(|scores| scores.get(player_id).copied().unwrap_or(0))
        .fold(0u32, u32::saturating_add)
}

pub fn totals(game: &Game) -> HashMap<String, u32> {
    game.players
        .iter()
        .map(|p| (p.id.clone(), total_score(game, &p.id)))
        .collect()
}

/// Full ranking of the game's players.
///
/// Ties keep the order in which players joined the game.
pub fn standings(game: &Game) -> Vec<Standing> {
    let standings = game
        .players
        .iter()
        .map(|player| Standing {
            player: player.clone(),
            total_score: total_score(game, &player.id),
        })
        .collect();

    rank(standings, game.rank_order())
}

/// Stable sort of standings in the given direction
pub fn rank(mut standings: Vec<Standing>, order: RankOrder) -> Vec<Standing> {
    match order {
        RankOrder::LowestWins => standings.sort_by(|a, b| a.total_score.cmp(&b.total_score)),
        RankOrder::HighestWins => standings.sort_by(|a, b| b.total_score.cmp(&a.total_score)),
    }
    standings
}
