//! tharsis: reconstructs normalized per-entity event histories from a single
//! Terraforming Mars replay-log document.
//!
//! The engine ([reconstruct::reconstruct_game]) is a pure, synchronous
//! transformation: one parsed [replay::ReplayLog] in, entity lists out.
//! Fetching documents, persisting rows and serving queries belong to
//! external collaborators.

pub mod cli;
pub mod parallel;
pub mod reconstruct;
pub mod replay;
