use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use super::domino::round_label;
use super::errors::GameError;
use super::ledger::parse_score_input;
use super::rummy::DEFAULT_JOKER_VALUE;
use crate::player::Player;

/// Player id -> points for one round. Missing entries count as 0.
pub type Scores = HashMap<String, u32>;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 10;
pub const DEFAULT_MAX_DOUBLE: u8 = 12;
pub const MAX_DOUBLE_LIMIT: u8 = 12;
pub const DEFAULT_TURN_SECONDS: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameType {
    Domino,
    Rummy,
}

/// How rummy rounds are recorded and who wins
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScoringMode {
    /// Everyone keeps their own hand points, lowest total wins
    #[default]
    Penalty,
    /// The round winner collects everyone else's points, highest total wins
    Accumulative,
}

/// Direction of the final ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    LowestWins,
    HighestWins,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub player: Player,
    pub total_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DominoRound {
    pub round_number: u32,
    pub round_name: String,
    #[serde(deserialize_with = "lenient_scores")]
    pub scores: Scores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RummyRound {
    pub id: i64,
    #[serde(deserialize_with = "lenient_scores")]
    pub scores: Scores,
    /// Pre-transform points, kept for accumulative rounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_scores: Option<Scores>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerState {
    pub total_time: u32,
    pub remaining: u32,
    pub running: bool,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(DEFAULT_TURN_SECONDS)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DominoGame {
    pub max_double: u8,
    pub rounds: Vec<DominoRound>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RummyGame {
    pub scoring_mode: ScoringMode,
    pub joker_value: u32,
    pub rounds: Vec<RummyRound>,
    pub active_player_index: usize,
    pub timer: TimerState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameKind {
    Domino(DominoGame),
    Rummy(RummyGame),
}

/// A game, active or archived.
///
/// The persisted form is the loose record the browser application wrote;
/// conversion happens through [`GameRecord`] so legacy field names are
/// accepted on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GameRecord", into = "GameRecord")]
pub struct Game {
    pub id: String,
    pub players: Vec<Player>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub winner: Option<Player>,
    pub final_standings: Option<Vec<Standing>>,
    pub kind: GameKind,
}

impl Game {
    /// Starts a game for a fixed roster of 2 to 10 distinct players
    pub fn new(players: Vec<Player>, kind: GameKind) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players.len()) {
            return Err(GameError::InvalidPlayerCount {
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
                got: players.len(),
            });
        }

        let unique: HashSet<&str> = players.iter().map(|p| p.id.as_str()).collect();
        if unique.len() != players.len() {
            return Err(GameError::DuplicatePlayer);
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            players,
            started_at: Utc::now(),
            ended_at: None,
            winner: None,
            final_standings: None,
            kind,
        })
    }

    pub fn game_type(&self) -> GameType {
        match self.kind {
            GameKind::Domino(_) => GameType::Domino,
            GameKind::Rummy(_) => GameType::Rummy,
        }
    }

    pub fn rank_order(&self) -> RankOrder {
        match &self.kind {
            GameKind::Rummy(rummy) if rummy.scoring_mode == ScoringMode::Accumulative => {
                RankOrder::HighestWins
            }
            _ => RankOrder::LowestWins,
        }
    }

    pub fn player_ids(&self) -> impl Iterator<Item = &str> {
        self.players.iter().map(|p| p.id.as_str())
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    /// Score maps of every round, in play order
    pub fn round_scores(&self) -> Vec<&Scores> {
        match &self.kind {
            GameKind::Domino(domino) => domino.rounds.iter().map(|r| &r.scores).collect(),
            GameKind::Rummy(rummy) => rummy.rounds.iter().map(|r| &r.scores).collect(),
        }
    }

    pub fn round_count(&self) -> usize {
        match &self.kind {
            GameKind::Domino(domino) => domino.rounds.len(),
            GameKind::Rummy(rummy) => rummy.rounds.len(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn as_domino(&self) -> Option<&DominoGame> {
        match &self.kind {
            GameKind::Domino(domino) => Some(domino),
            GameKind::Rummy(_) => None,
        }
    }

    pub fn as_rummy(&self) -> Option<&RummyGame> {
        match &self.kind {
            GameKind::Rummy(rummy) => Some(rummy),
            GameKind::Domino(_) => None,
        }
    }

    /// Elapsed play time, e.g. "42 minutes" or "1h 5m"
    pub fn duration_label(&self, now: DateTime<Utc>) -> String {
        let end = self.ended_at.unwrap_or(now);
        let minutes = (end - self.started_at).num_minutes().max(0);

        if minutes < 60 {
            format!("{} minutes", minutes)
        } else {
            format!("{}h {}m", minutes / 60, minutes % 60)
        }
    }
}

/// On-disk shape of a game, shared by both modes and by legacy snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameRecord {
    id: String,
    #[serde(rename = "type", default)]
    game_type: Option<GameType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<u8>,
    players: Vec<Player>,
    #[serde(default)]
    rounds: Vec<RoundRecord>,
    started_at: DateTime<Utc>,
    #[serde(default)]
    ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    winner: Option<Player>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    final_scores: Option<Vec<Standing>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    final_standings: Option<Vec<Standing>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scoring_mode: Option<ScoringMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    joker_value: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_player_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timer: Option<TimerState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoundRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    round_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    round_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_scores")]
    scores: Scores,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_optional_scores")]
    original_scores: Option<Scores>,
}

impl TryFrom<GameRecord> for Game {
    type Error = String;

    fn try_from(record: GameRecord) -> Result<Self, Self::Error> {
        let kind = match record.game_type.unwrap_or(GameType::Domino) {
            GameType::Domino => {
                let max_double = record.mode.unwrap_or(DEFAULT_MAX_DOUBLE);
                if max_double > MAX_DOUBLE_LIMIT {
                    return Err(format!("unsupported domino mode {}", max_double));
                }
                let rounds = record
                    .rounds
                    .into_iter()
                    .enumerate()
                    .map(|(index, round)| DominoRound {
                        round_number: round.round_number.unwrap_or(index as u32 + 1),
                        round_name: round.round_name.unwrap_or_else(|| {
                            round_label(max_double.saturating_sub(index as u8))
                        }),
                        scores: round.scores,
                    })
                    .collect();
                GameKind::Domino(DominoGame { max_double, rounds })
            }
            GameType::Rummy => {
                let rounds = record
                    .rounds
                    .into_iter()
                    .enumerate()
                    .map(|(index, round)| RummyRound {
                        id: round.id.unwrap_or(index as i64),
                        scores: round.scores,
                        original_scores: round.original_scores,
                    })
                    .collect();
                GameKind::Rummy(RummyGame {
                    scoring_mode: record.scoring_mode.unwrap_or_default(),
                    joker_value: record.joker_value.unwrap_or(DEFAULT_JOKER_VALUE),
                    rounds,
                    active_player_index: record.active_player_index.unwrap_or(0),
                    timer: record.timer.unwrap_or_default(),
                })
            }
        };

        Ok(Game {
            id: record.id,
            players: record.players,
            started_at: record.started_at,
            ended_at: record.ended_at.or(record.finished_at),
            winner: record.winner,
            final_standings: record.final_scores.or(record.final_standings),
            kind,
        })
    }
}

impl From<Game> for GameRecord {
    fn from(game: Game) -> Self {
        let game_type = game.game_type();
        let mut record = GameRecord {
            id: game.id,
            game_type: Some(game_type),
            mode: None,
            players: game.players,
            rounds: Vec::new(),
            started_at: game.started_at,
            ended_at: game.ended_at,
            finished_at: None,
            winner: game.winner,
            final_scores: None,
            final_standings: None,
            scoring_mode: None,
            joker_value: None,
            active_player_index: None,
            timer: None,
        };

        match game.kind {
            GameKind::Domino(domino) => {
                record.mode = Some(domino.max_double);
                record.final_scores = game.final_standings;
                record.rounds = domino
                    .rounds
                    .into_iter()
                    .map(|round| RoundRecord {
                        id: None,
                        round_number: Some(round.round_number),
                        round_name: Some(round.round_name),
                        scores: round.scores,
                        original_scores: None,
                    })
                    .collect();
            }
            GameKind::Rummy(rummy) => {
                record.final_standings = game.final_standings;
                record.scoring_mode = Some(rummy.scoring_mode);
                record.joker_value = Some(rummy.joker_value);
                record.active_player_index = Some(rummy.active_player_index);
                record.timer = Some(rummy.timer);
                record.rounds = rummy
                    .rounds
                    .into_iter()
                    .map(|round| RoundRecord {
                        id: Some(round.id),
                        round_number: None,
                        round_name: None,
                        scores: round.scores,
                        original_scores: round.original_scores,
                    })
                    .collect();
            }
        }

        record
    }
}

/// Accepts any JSON value per entry and coerces it to a non-negative score
fn lenient_scores<'de, D>(deserializer: D) -> Result<Scores, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<String, serde_json::Value> = HashMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(player_id, value)| (player_id, coerce_score(&value)))
        .collect())
}

fn lenient_optional_scores<'de, D>(deserializer: D) -> Result<Option<Scores>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|map| {
        map.into_iter()
            .map(|(player_id, value)| (player_id, coerce_score(&value)))
            .collect()
    }))
}

fn coerce_score(value: &serde_json::Value) -> u32 {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u32))
            .unwrap_or(0),
        serde_json::Value::String(s) => parse_score_input(s),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn legacy_domino_json() -> &'static str {
        r#"{
            "id": "1700000000000",
            "mode": 9,
            "players": [
                {"id": "a", "name": "Ana", "photo": null, "gamesPlayed": 3, "gamesWon": 1, "createdAt": "2024-01-01T10:00:00.000Z"},
                {"id": "b", "name": "Luis", "photo": null, "gamesPlayed": 2, "gamesWon": 0, "createdAt": "2024-01-01T10:00:00.000Z"}
            ],
            "rounds": [
                {"roundNumber": 1, "roundName": "Mula del 9", "scores": {"a": 10, "b": -4}},
                {"roundNumber": 2, "roundName": "Mula del 8", "scores": {"a": "7", "b": null}}
            ],
            "startedAt": "2024-01-02T20:00:00.000Z",
            "finishedAt": "2024-01-02T21:05:00.000Z",
            "winner": {"id": "b", "name": "Luis", "photo": null},
            "finalStandings": [
                {"player": {"id": "b", "name": "Luis"}, "totalScore": 0},
                {"player": {"id": "a", "name": "Ana"}, "totalScore": 17}
            ]
        }"#
    }

    #[test]
    fn reads_legacy_domino_record_without_type() {
        let game: Game = serde_json::from_str(legacy_domino_json()).unwrap();

        assert_eq!(game.game_type(), GameType::Domino);
        let domino = game.as_domino().unwrap();
        assert_eq!(domino.max_double, 9);
        assert_eq!(domino.rounds.len(), 2);
        assert_eq!(domino.rounds[0].scores["b"], 0);
        assert_eq!(domino.rounds[1].scores["a"], 7);
        assert_eq!(domino.rounds[1].scores["b"], 0);
    }

    #[test]
    fn falls_back_to_legacy_end_and_standings_fields() {
        let game: Game = serde_json::from_str(legacy_domino_json()).unwrap();

        assert_eq!(
            game.ended_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 21, 5, 0).unwrap())
        );
        let standings = game.final_standings.as_ref().unwrap();
        assert_eq!(standings[0].player.id, "b");
        assert_eq!(game.duration_label(Utc::now()), "1h 5m");
    }

    #[test]
    fn rummy_record_round_trips_mode_fields() {
        let json = r#"{
            "id": "g1",
            "type": "rummy",
            "scoringMode": "accumulative",
            "jokerValue": 25,
            "players": [{"id": "a", "name": "Ana"}, {"id": "b", "name": "Luis"}],
            "rounds": [{"id": 1700000000001, "scores": {"a": 40, "b": 0}, "originalScores": {"a": 0, "b": 40}}],
            "startedAt": "2024-01-02T20:00:00Z",
            "activePlayerIndex": 1,
            "timer": {"totalTime": 60, "remaining": 12, "running": true, "interval": null}
        }"#;

        let game: Game = serde_json::from_str(json).unwrap();
        let rummy = game.as_rummy().unwrap();
        assert_eq!(rummy.scoring_mode, ScoringMode::Accumulative);
        assert_eq!(rummy.joker_value, 25);
        assert_eq!(rummy.active_player_index, 1);
        assert_eq!(rummy.timer.remaining, 12);
        assert_eq!(game.rank_order(), RankOrder::HighestWins);

        let written = serde_json::to_value(&game).unwrap();
        assert_eq!(written["type"], "rummy");
        assert_eq!(written["rounds"][0]["originalScores"]["b"], 40);
        assert!(written.get("finishedAt").is_none());
    }

    #[test]
    fn legacy_rummy_record_without_joker_value_uses_default() {
        let json = r#"{
            "id": "g2",
            "type": "rummy",
            "players": [{"id": "a", "name": "Ana"}, {"id": "b", "name": "Luis"}],
            "rounds": [],
            "startedAt": "2024-01-02T20:00:00Z"
        }"#;

        let game: Game = serde_json::from_str(json).unwrap();
        let rummy = game.as_rummy().unwrap();
        assert_eq!(rummy.joker_value, DEFAULT_JOKER_VALUE);
        assert_eq!(rummy.scoring_mode, ScoringMode::Penalty);
    }

    #[test]
    fn explicit_zero_joker_value_is_kept() {
        let json = r#"{"id":"g3","type":"rummy","jokerValue":0,"players":[],"startedAt":"2024-01-02T20:00:00Z"}"#;

        let game: Game = serde_json::from_str(json).unwrap();
        assert_eq!(game.as_rummy().unwrap().joker_value, 0);
    }

    #[test]
    fn rejects_unsupported_domino_mode() {
        let json = r#"{"id":"g","mode":15,"players":[],"startedAt":"2024-01-02T20:00:00Z"}"#;
        assert!(serde_json::from_str::<Game>(json).is_err());
    }

    #[test]
    fn duration_label_under_an_hour() {
        let mut game: Game = serde_json::from_str(legacy_domino_json()).unwrap();
        game.ended_at = Some(game.started_at + chrono::Duration::minutes(42));

        assert_eq!(game.duration_label(Utc::now()), "42 minutes");
    }
}
