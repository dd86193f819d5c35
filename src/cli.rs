//! Command-line dispatch: `normalize` runs the full reconstruction over one
//! replay document and emits entity lists as JSON; `inspect` prints a short
//! summary of a parsed document.

use std::fs;

use crate::reconstruct::reconstruct_game;
use crate::replay::load_replay_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Normalize,
    Inspect,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("normalize") => Some(Command::Normalize),
        Some("inspect") => Some(Command::Inspect),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Normalize) => handle_normalize(args),
        Some(Command::Inspect) => handle_inspect(args),
        None => {
            eprintln!("usage: tharsis <normalize|inspect> <replay.json> [--out <path>]");
            2
        }
    }
}

fn out_path(args: &[String]) -> Option<&String> {
    args.iter()
        .position(|arg| arg == "--out")
        .and_then(|pos| args.get(pos + 1))
}

fn handle_normalize(args: &[String]) -> i32 {
    let Some(input) = args.get(2) else {
        eprintln!("usage: tharsis normalize <replay.json> [--out <path>]");
        return 2;
    };
    let log = match load_replay_file(input) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("normalize: {err}");
            return 1;
        }
    };
    let records = reconstruct_game(&log);
    let payload = match serde_json::to_string_pretty(&records) {
        Ok(json) => json,
        Err(err) => {
            eprintln!("normalize: failed to serialize output: {err}");
            return 1;
        }
    };
    match out_path(args) {
        Some(path) => {
            if let Err(err) = fs::write(path, payload) {
                eprintln!("normalize: failed to write '{path}': {err}");
                return 1;
            }
        }
        None => println!("{payload}"),
    }
    0
}

fn handle_inspect(args: &[String]) -> i32 {
    let Some(input) = args.get(2) else {
        eprintln!("usage: tharsis inspect <replay.json>");
        return 2;
    };
    let log = match load_replay_file(input) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("inspect: {err}");
            return 1;
        }
    };
    let terminal_gen = log
        .terminal_state()
        .and_then(|state| state.generation)
        .unwrap_or(0);
    println!("table {}", log.table_id);
    println!("perspective {}", log.perspective_player);
    let mut players: Vec<_> = log.players.iter().collect();
    players.sort_by_key(|(id, _)| **id);
    for (id, info) in players {
        println!(
            "player {id} {} ({})",
            info.name,
            info.corporation.as_deref().unwrap_or("unknown corporation")
        );
    }
    println!("moves {}", log.moves.len());
    println!("final generation {terminal_gen}");
    0
}
