//! Replay-log document model and parsing.

pub mod model;
pub mod parse;

pub use model::{
    AwardStanding, GameState, Generation, Move, MoveNumber, PlayerId, PlayerInfo, PlayerVp,
    ReplayLog, StandingEntry, StartingHand, TableId,
};
pub use parse::{load_replay_file, parse_replay_json, ReplayError};
