//! Parses a raw replay-log JSON document into the typed [ReplayLog] model.
//!
//! Failure policy is two-tier: the table id and perspective-player id are
//! game-identifying and must parse (downstream storage keys on them), so a
//! bad value aborts the whole parse with [ReplayError::MalformedReplay].
//! Every other identifier is a leaf: an unparsable player entry, move actor,
//! or map key drops only that entry, with a warning.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::replay::model::{
    GameState, Move, MoveNumber, PlayerId, PlayerInfo, PlayerVp, ReplayLog, StandingEntry,
    StartingHand,
};

#[derive(Debug)]
pub enum ReplayError {
    Read(std::io::Error),
    Json(serde_json::Error),
    /// Table id or perspective-player id missing/unparsable; no output is
    /// produced for such a document.
    MalformedReplay(String),
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read replay file: {err}"),
            Self::Json(err) => write!(f, "failed to parse replay JSON: {err}"),
            Self::MalformedReplay(msg) => write!(f, "malformed replay: {msg}"),
        }
    }
}

impl std::error::Error for ReplayError {}

/// Parse a replay-log document from a JSON string.
pub fn parse_replay_json(input: &str) -> Result<ReplayLog, ReplayError> {
    let raw: RawReplay = serde_json::from_str(input).map_err(ReplayError::Json)?;
    raw.into_log()
}

/// Read and parse a replay-log document from disk.
pub fn load_replay_file(path: impl AsRef<Path>) -> Result<ReplayLog, ReplayError> {
    let raw = fs::read_to_string(path).map_err(ReplayError::Read)?;
    parse_replay_json(&raw)
}

/// JSON value that may arrive as a number or a numeric string. Replay
/// documents are inconsistent about this across log format versions.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Num(i64),
    Str(String),
}

impl NumOrStr {
    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Num(n) => Some(*n),
            Self::Str(s) => s.trim().parse().ok(),
        }
    }

    fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|n| u64::try_from(n).ok())
    }

    fn as_u32(&self) -> Option<u32> {
        self.as_i64().and_then(|n| u32::try_from(n).ok())
    }
}

fn parse_player_key(key: &str, context: &str) -> Option<PlayerId> {
    match key.trim().parse::<PlayerId>() {
        Ok(id) => Some(id),
        Err(_) => {
            warn!("replay: unparsable player id '{key}' in {context}; entry skipped");
            None
        }
    }
}

/// Re-key a string-keyed map by numeric player id, dropping bad keys.
fn rekey_by_player<V, W>(
    map: HashMap<String, V>,
    context: &str,
    convert: impl Fn(V) -> W,
) -> HashMap<PlayerId, W> {
    map.into_iter()
        .filter_map(|(key, value)| {
            parse_player_key(&key, context).map(|id| (id, convert(value)))
        })
        .collect()
}

// ----- Raw document shape -----

#[derive(Debug, Deserialize)]
struct RawReplay {
    table_id: Option<NumOrStr>,
    player_perspective: Option<NumOrStr>,
    #[serde(default)]
    players: HashMap<String, RawPlayer>,
    #[serde(default)]
    moves: Vec<RawMove>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPlayer {
    #[serde(default)]
    player_name: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    corporation: Option<String>,
    #[serde(default)]
    final_score: Option<NumOrStr>,
    #[serde(default)]
    final_tr: Option<NumOrStr>,
    #[serde(default)]
    starting_hand: RawStartingHand,
    #[serde(default)]
    cards_played: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStartingHand {
    #[serde(default)]
    corporations: Vec<String>,
    #[serde(default)]
    preludes: Vec<String>,
    #[serde(default)]
    project_cards: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMove {
    move_number: Option<NumOrStr>,
    #[serde(default)]
    player_id: Option<NumOrStr>,
    #[serde(default)]
    action_type: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    card_played: Option<String>,
    #[serde(default)]
    card_drafted: Option<String>,
    #[serde(default)]
    card_options: HashMap<String, Vec<String>>,
    #[serde(default)]
    cards_kept: HashMap<String, Vec<String>>,
    #[serde(default)]
    tile_placed: Option<String>,
    #[serde(default)]
    tile_location: Option<String>,
    #[serde(default)]
    game_state: RawGameState,
}

#[derive(Debug, Default, Deserialize)]
struct RawGameState {
    #[serde(default)]
    generation: Option<NumOrStr>,
    #[serde(default)]
    temperature: Option<NumOrStr>,
    #[serde(default)]
    oxygen: Option<NumOrStr>,
    #[serde(default)]
    oceans: Option<NumOrStr>,
    #[serde(default)]
    milestones: HashMap<String, RawStanding>,
    #[serde(default)]
    awards: HashMap<String, RawStanding>,
    #[serde(default)]
    player_vp: HashMap<String, RawPlayerVp>,
    #[serde(default)]
    player_trackers: HashMap<String, HashMap<String, NumOrStr>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStanding {
    #[serde(default)]
    player: Option<NumOrStr>,
    #[serde(default, rename = "move")]
    move_number: Option<NumOrStr>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPlayerVp {
    #[serde(default)]
    total: Option<NumOrStr>,
    #[serde(default)]
    total_details: RawVpDetails,
}

#[derive(Debug, Default, Deserialize)]
struct RawVpDetails {
    #[serde(default)]
    cards: HashMap<String, NumOrStr>,
    #[serde(default)]
    cities: HashMap<String, NumOrStr>,
    #[serde(default)]
    greeneries: HashMap<String, NumOrStr>,
    #[serde(default)]
    awards: HashMap<String, RawAwardStanding>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAwardStanding {
    #[serde(default)]
    place: Option<NumOrStr>,
    #[serde(default)]
    counter: Option<NumOrStr>,
}

// ----- Conversion -----

impl RawReplay {
    fn into_log(self) -> Result<ReplayLog, ReplayError> {
        let table_id = self
            .table_id
            .as_ref()
            .and_then(NumOrStr::as_u64)
            .ok_or_else(|| ReplayError::MalformedReplay("table id is missing or non-numeric".into()))?;
        let perspective_player = self
            .player_perspective
            .as_ref()
            .and_then(NumOrStr::as_u64)
            .ok_or_else(|| {
                ReplayError::MalformedReplay("perspective player id is missing or non-numeric".into())
            })?;

        let players = rekey_by_player(self.players, "players", RawPlayer::into_info);
        let mut moves = Vec::with_capacity(self.moves.len());
        let mut last_number: MoveNumber = 0;
        for (index, raw) in self.moves.into_iter().enumerate() {
            let mv = raw.into_move(index, last_number);
            last_number = mv.move_number;
            moves.push(mv);
        }

        Ok(ReplayLog {
            table_id,
            perspective_player,
            players,
            moves,
        })
    }
}

impl RawPlayer {
    fn into_info(self) -> PlayerInfo {
        PlayerInfo {
            name: self.player_name,
            color: self.color,
            corporation: self.corporation,
            final_score: self.final_score.as_ref().and_then(NumOrStr::as_i64),
            final_tr: self.final_tr.as_ref().and_then(NumOrStr::as_i64),
            starting_hand: StartingHand {
                corporations: self.starting_hand.corporations,
                preludes: self.starting_hand.preludes,
                project_cards: self.starting_hand.project_cards,
            },
            cards_played: self.cards_played,
        }
    }
}

impl RawMove {
    fn into_move(self, index: usize, last_number: MoveNumber) -> Move {
        let move_number = match self.move_number.as_ref().and_then(NumOrStr::as_u32) {
            Some(n) => n,
            None => {
                // Positional fallback keeps the stream addressable; clamped
                // so the sequence stays non-decreasing past explicit numbers.
                let fallback = (index as u32 + 1).max(last_number + 1);
                warn!("replay: move at index {index} has no parsable move number; using {fallback}");
                fallback
            }
        };
        let actor = match &self.player_id {
            Some(raw) => {
                let id = raw.as_u64();
                if id.is_none() {
                    warn!("replay: move {move_number} has unparsable actor id; treated as absent");
                }
                id
            }
            None => None,
        };

        Move {
            move_number,
            actor,
            action: self.action_type,
            description: self.description,
            card_played: self.card_played,
            card_drafted: self.card_drafted,
            card_options: rekey_by_player(self.card_options, "card_options", |v| v),
            cards_kept: rekey_by_player(self.cards_kept, "cards_kept", |v| v),
            tile_placed: self.tile_placed,
            tile_location: self.tile_location,
            state: self.game_state.into_state(),
        }
    }
}

impl RawGameState {
    fn into_state(self) -> GameState {
        let int_map = |map: HashMap<String, NumOrStr>| -> HashMap<String, i64> {
            map.into_iter()
                .filter_map(|(k, v)| v.as_i64().map(|n| (k, n)))
                .collect()
        };

        GameState {
            generation: self.generation.as_ref().and_then(NumOrStr::as_u32),
            temperature: self
                .temperature
                .as_ref()
                .and_then(NumOrStr::as_i64)
                .and_then(|n| i32::try_from(n).ok()),
            oxygen: self
                .oxygen
                .as_ref()
                .and_then(NumOrStr::as_i64)
                .and_then(|n| i32::try_from(n).ok()),
            oceans: self
                .oceans
                .as_ref()
                .and_then(NumOrStr::as_i64)
                .and_then(|n| i32::try_from(n).ok()),
            milestones: self
                .milestones
                .into_iter()
                .map(|(name, raw)| (name, raw.into_entry()))
                .collect(),
            awards: self
                .awards
                .into_iter()
                .map(|(name, raw)| (name, raw.into_entry()))
                .collect(),
            player_vp: rekey_by_player(self.player_vp, "player_vp", |raw| PlayerVp {
                total: raw.total.as_ref().and_then(NumOrStr::as_i64),
                cards: int_map(raw.total_details.cards),
                cities: int_map(raw.total_details.cities),
                greeneries: int_map(raw.total_details.greeneries),
                awards: raw
                    .total_details
                    .awards
                    .into_iter()
                    .map(|(award, standing)| {
                        (
                            award,
                            crate::replay::model::AwardStanding {
                                place: standing
                                    .place
                                    .as_ref()
                                    .and_then(NumOrStr::as_i64)
                                    .and_then(|n| i32::try_from(n).ok())
                                    .unwrap_or(0),
                                counter: standing
                                    .counter
                                    .as_ref()
                                    .and_then(NumOrStr::as_i64)
                                    .and_then(|n| i32::try_from(n).ok())
                                    .unwrap_or(0),
                            },
                        )
                    })
                    .collect(),
            }),
            trackers: rekey_by_player(self.player_trackers, "player_trackers", int_map),
        }
    }
}

impl RawStanding {
    fn into_entry(self) -> StandingEntry {
        StandingEntry {
            // Unparsable claimant stays None; the standings finalizer skips it.
            player: self.player.as_ref().and_then(NumOrStr::as_u64),
            move_number: self.move_number.as_ref().and_then(NumOrStr::as_u32),
        }
    }
}
