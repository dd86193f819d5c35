//! Reconstruction engine: one [crate::replay::ReplayLog] in, normalized
//! per-entity event histories out.
//!
//! The engine is a pure, synchronous, single-threaded transformation. All
//! working state (pending-effect queues, draw counters, draft memory) is
//! scoped to a single [reconstruct_game] call, so callers may fan out across
//! independent logs with zero coordination (see [crate::parallel]).

pub mod cards;
pub mod params;
pub mod pending;
pub mod phrases;
pub mod standings;
pub mod tiles;
pub mod trackers;

use serde::Serialize;

use crate::replay::{Generation, MoveNumber, PlayerId, ReplayLog, TableId};

/// How a card first became visible to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DrawType {
    StartingHand,
    Draft,
    Effect,
    PlayCard,
    Activation,
    Tile,
    Reveal,
}

/// One row per (table, player, card). Generation fields are first-write-wins
/// and stay `None` when the log never shows the corresponding event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRecord {
    pub table_id: TableId,
    pub player_id: PlayerId,
    pub card_name: String,
    pub seen_gen: Option<Generation>,
    pub drawn_gen: Option<Generation>,
    pub kept_gen: Option<Generation>,
    pub drafted_gen: Option<Generation>,
    pub bought_gen: Option<Generation>,
    pub played_gen: Option<Generation>,
    pub draw_type: Option<DrawType>,
    /// Free text naming the cause of the draw (effect card, activated card,
    /// placed tile, "Research draft", ...).
    pub draw_reason: Option<String>,
    pub vp_scored: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Parameter {
    Temperature,
    Oxygen,
    Oceans,
}

impl Parameter {
    /// Unit step of the shared track: temperature moves in 2s.
    pub fn step_size(self) -> i32 {
        match self {
            Self::Temperature => 2,
            Self::Oxygen | Self::Oceans => 1,
        }
    }
}

/// One unit-step increase of a shared planetary parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterEvent {
    pub table_id: TableId,
    pub parameter: Parameter,
    pub generation: Generation,
    pub increased_to: i32,
    pub increased_by: Option<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackerClass {
    Production,
    Tag,
    Resource,
}

/// One value change of a per-player resource/production/tag counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerEvent {
    pub table_id: TableId,
    pub player_id: PlayerId,
    pub tracker: String,
    pub class: TrackerClass,
    pub generation: Generation,
    pub move_number: MoveNumber,
    pub changed_to: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MilestoneClaim {
    pub table_id: TableId,
    pub milestone: String,
    pub claimed_by: PlayerId,
    /// 0 when the claiming move could not be resolved to a generation.
    pub claimed_gen: Generation,
}

/// One row per player with a placement entry for a funded award; funding
/// fields are shared across the award's rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwardFunding {
    pub table_id: TableId,
    pub player_id: PlayerId,
    pub award: String,
    pub funded_by: PlayerId,
    pub funded_gen: Generation,
    pub place: i32,
    pub counter: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TileKind {
    City,
    Greenery,
}

impl TileKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::City => "City",
            Self::Greenery => "Greenery",
        }
    }
}

/// City or greenery from the terminal snapshot, with the located placement
/// generation when one of the owner's moves matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TilePlacement {
    pub table_id: TableId,
    pub player_id: PlayerId,
    pub kind: TileKind,
    pub location: String,
    /// Cities only: points scored by adjacent greeneries.
    pub points: Option<i64>,
    pub placed_gen: Option<Generation>,
}

/// Diagnostics for leaf records skipped during reconstruction. Skips are
/// never fatal; they are reported so callers can surface data quality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconstructReport {
    /// Milestone names whose claimant id could not be parsed.
    pub skipped_milestones: Vec<String>,
    /// Award names whose funder id could not be parsed.
    pub skipped_awards: Vec<String>,
}

impl ReconstructReport {
    pub fn is_clean(&self) -> bool {
        self.skipped_milestones.is_empty() && self.skipped_awards.is_empty()
    }
}

/// All entity lists reconstructed from one replay log. Built fresh per call;
/// the persistence collaborator owns storage lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameRecords {
    pub table_id: TableId,
    pub cards: Vec<CardRecord>,
    pub parameters: Vec<ParameterEvent>,
    pub trackers: Vec<TrackerEvent>,
    pub milestones: Vec<MilestoneClaim>,
    pub awards: Vec<AwardFunding>,
    pub tiles: Vec<TilePlacement>,
    pub report: ReconstructReport,
}

/// Run every reconstruction pass over one log. Deterministic: identical
/// inputs yield identical outputs, including row order.
pub fn reconstruct_game(log: &ReplayLog) -> GameRecords {
    let mut report = ReconstructReport::default();
    let cards = cards::reconstruct_cards(log);
    let parameters = params::extract_parameter_events(log);
    let trackers = trackers::extract_tracker_events(log);
    let (milestones, awards) = standings::finalize_standings(log, &mut report);
    let tiles = tiles::finalize_tile_placements(log);

    GameRecords {
        table_id: log.table_id,
        cards,
        parameters,
        trackers,
        milestones,
        awards,
        tiles,
        report,
    }
}

/// Map a phrase-level actor reference to a player id. `You` is always the
/// perspective player; named actors resolve through the player table.
pub(crate) fn resolve_actor(log: &ReplayLog, actor: phrases::ActorRef<'_>) -> Option<PlayerId> {
    match actor {
        phrases::ActorRef::You => Some(log.perspective_player),
        phrases::ActorRef::Named(name) => log.player_by_name(name),
    }
}

/// Set-once cell: the structured-field pass and the legacy-text pass both
/// write through this, so pass order never affects the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstWrite<T>(Option<T>);

// Manual impl: the empty cell needs no `T: Default`.
impl<T> Default for FirstWrite<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> FirstWrite<T> {
    /// Store `value` if nothing was stored yet. Returns true when it wrote.
    pub fn set(&mut self, value: T) -> bool {
        if self.0.is_none() {
            self.0 = Some(value);
            true
        } else {
            false
        }
    }

    /// Replace the stored value unconditionally. Only the dealt-prelude
    /// draw-type override uses this.
    pub fn force(&mut self, value: T) {
        self.0 = Some(value);
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

impl<T: Copy> FirstWrite<T> {
    pub fn value(&self) -> Option<T> {
        self.0
    }
}
