//! Typed model of a single game's replay-log document.
//!
//! A replay log is an ordered sequence of [Move]s, each carrying structured
//! fields (present only in newer log formats), a `|`-delimited free-text
//! description (the only event source in legacy logs), and a full
//! [GameState] snapshot. The model performs no interpretation; the
//! `reconstruct` module owns all heuristics.

use std::collections::HashMap;

use serde::Serialize;

pub type PlayerId = u64;
pub type TableId = u64;
pub type MoveNumber = u32;
pub type Generation = u32;

/// Fully parsed replay log. Produced by [crate::replay::parse_replay_json].
#[derive(Debug, Clone, Default)]
pub struct ReplayLog {
    pub table_id: TableId,
    pub perspective_player: PlayerId,
    pub players: HashMap<PlayerId, PlayerInfo>,
    /// Moves in non-decreasing `move_number` order, as they appear in the document.
    pub moves: Vec<Move>,
}

impl ReplayLog {
    /// Snapshot attached to the last move; authoritative for end-of-game aggregates.
    pub fn terminal_state(&self) -> Option<&GameState> {
        self.moves.last().map(|m| &m.state)
    }

    pub fn player_name(&self, id: PlayerId) -> Option<&str> {
        self.players.get(&id).map(|p| p.name.as_str())
    }

    /// Reverse lookup used when legacy phrases name the actor by display name.
    pub fn player_by_name(&self, name: &str) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|(_, info)| info.name == name)
            .map(|(id, _)| *id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlayerInfo {
    pub name: String,
    pub color: Option<String>,
    pub corporation: Option<String>,
    pub final_score: Option<i64>,
    pub final_tr: Option<i64>,
    pub starting_hand: StartingHand,
    pub cards_played: Vec<String>,
}

/// Cards dealt at game start, split by kind. Project cards feed the
/// StartingHand draw type; preludes matter only for the kept-card override.
#[derive(Debug, Clone, Default)]
pub struct StartingHand {
    pub corporations: Vec<String>,
    pub preludes: Vec<String>,
    pub project_cards: Vec<String>,
}

/// One replay move. All structured fields are optional; legacy logs carry
/// only `action`, `description` and the snapshot.
#[derive(Debug, Clone, Default)]
pub struct Move {
    pub move_number: MoveNumber,
    pub actor: Option<PlayerId>,
    /// Free-form action tag: play_card, draft_card, draft, activate_card,
    /// place_tile, pass, standard_project, ...
    pub action: String,
    /// `|`-delimited natural-language phrases.
    pub description: String,
    pub card_played: Option<String>,
    pub card_drafted: Option<String>,
    /// Cards offered to each actor at a purchase/draft window.
    pub card_options: HashMap<PlayerId, Vec<String>>,
    pub cards_kept: HashMap<PlayerId, Vec<String>>,
    pub tile_placed: Option<String>,
    pub tile_location: Option<String>,
    pub state: GameState,
}

impl Move {
    /// Non-empty trimmed phrases of the description.
    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.description
            .split('|')
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    pub fn generation(&self) -> Option<Generation> {
        self.state.generation
    }

    pub fn is_draft_kind(&self) -> bool {
        matches!(self.action.as_str(), "draft" | "draft_card")
    }

    pub fn is_pass(&self) -> bool {
        self.action == "pass"
    }

    pub fn is_play_card(&self) -> bool {
        self.action == "play_card"
    }

    pub fn is_place_tile(&self) -> bool {
        self.action == "place_tile"
    }

    pub fn is_activation(&self) -> bool {
        self.action == "activate_card"
    }
}

/// Full game-state snapshot attached to a move.
#[derive(Debug, Clone, Default)]
pub struct GameState {
    pub generation: Option<Generation>,
    pub temperature: Option<i32>,
    pub oxygen: Option<i32>,
    pub oceans: Option<i32>,
    pub milestones: HashMap<String, StandingEntry>,
    pub awards: HashMap<String, StandingEntry>,
    pub player_vp: HashMap<PlayerId, PlayerVp>,
    pub trackers: HashMap<PlayerId, HashMap<String, i64>>,
}

/// Milestone claim / award funding as recorded in a snapshot. `player` is
/// None when the claimant id in the document could not be parsed; the
/// standings finalizer skips such entries.
#[derive(Debug, Clone, Default)]
pub struct StandingEntry {
    pub player: Option<PlayerId>,
    pub move_number: Option<MoveNumber>,
}

/// Per-player victory point breakdown from a snapshot.
#[derive(Debug, Clone, Default)]
pub struct PlayerVp {
    pub total: Option<i64>,
    /// Card name -> VP scored by that card.
    pub cards: HashMap<String, i64>,
    /// City location -> points scored by adjacent greeneries.
    pub cities: HashMap<String, i64>,
    /// Greenery location -> VP.
    pub greeneries: HashMap<String, i64>,
    /// Award name -> final placement.
    pub awards: HashMap<String, AwardStanding>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AwardStanding {
    pub place: i32,
    pub counter: i32,
}
