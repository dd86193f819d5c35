//! Tests for replay-log document parsing against the recorded fixture.

use std::path::Path;

use tharsis::replay::{load_replay_file, parse_replay_json, ReplayError};

fn fixture_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn parse_sample_replay_fixture() {
    let log = load_replay_file(fixture_path("sample_replay.json")).expect("parse fixture");
    assert_eq!(log.table_id, 251_432_114);
    assert_eq!(log.perspective_player, 86_534_716);
    assert_eq!(log.players.len(), 2);
    assert_eq!(log.player_name(86_534_716), Some("Ada"));
    assert_eq!(log.player_name(91_121_314), Some("Bert"));
    assert_eq!(log.player_by_name("Bert"), Some(91_121_314));
    assert_eq!(log.moves.len(), 15);
}

#[test]
fn fixture_starting_hands_are_split_by_kind() {
    let log = load_replay_file(fixture_path("sample_replay.json")).expect("parse fixture");
    let ada = &log.players[&86_534_716];
    assert_eq!(ada.corporation.as_deref(), Some("Thorgate"));
    assert_eq!(ada.final_score, Some(110));
    assert_eq!(ada.starting_hand.corporations.len(), 2);
    assert_eq!(
        ada.starting_hand.preludes,
        vec!["Metals Company".to_string(), "Business Empire".to_string()]
    );
    assert_eq!(ada.starting_hand.project_cards.len(), 3);
}

#[test]
fn fixture_move_numbers_are_non_decreasing() {
    let log = load_replay_file(fixture_path("sample_replay.json")).expect("parse fixture");
    let numbers: Vec<u32> = log.moves.iter().map(|mv| mv.move_number).collect();
    assert!(numbers.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(log.moves[0].move_number, 1);
    assert_eq!(log.moves.last().map(|mv| mv.move_number), Some(300));
}

#[test]
fn fixture_terminal_snapshot_carries_aggregates() {
    let log = load_replay_file(fixture_path("sample_replay.json")).expect("parse fixture");
    let terminal = log.terminal_state().expect("terminal snapshot");
    assert_eq!(terminal.generation, Some(7));
    assert_eq!(terminal.milestones.len(), 1);
    assert_eq!(terminal.awards.len(), 1);
    assert_eq!(terminal.player_vp.len(), 2);
    let ada_vp = &terminal.player_vp[&86_534_716];
    assert_eq!(ada_vp.total, Some(110));
    assert_eq!(ada_vp.cards["Vesta Shipyard"], 2);
    assert_eq!(ada_vp.cities["Tharsis Hex (4,5)"], 3);
}

#[test]
fn missing_table_id_aborts_the_whole_parse() {
    let err = parse_replay_json(r#"{"player_perspective": 7, "moves": []}"#).unwrap_err();
    assert!(matches!(err, ReplayError::MalformedReplay(_)));
    let message = err.to_string();
    assert!(message.contains("table id"), "got: {message}");
}

#[test]
fn non_numeric_perspective_aborts_the_whole_parse() {
    let err = parse_replay_json(
        r#"{"table_id": 1, "player_perspective": "archive-unavailable", "moves": []}"#,
    )
    .unwrap_err();
    assert!(matches!(err, ReplayError::MalformedReplay(_)));
}

#[test]
fn bad_leaf_identifiers_drop_only_their_entries() {
    let log = parse_replay_json(
        r#"{
            "table_id": 1, "player_perspective": 7,
            "players": {
                "7": {"player_name": "Ada"},
                "corrupted": {"player_name": "Ghost"}
            },
            "moves": [{
                "move_number": 1, "action_type": "keep", "description": "",
                "cards_kept": {"7": ["Birds"], "???": ["Fish"]},
                "game_state": {"generation": 1}
            }]
        }"#,
    )
    .expect("leaf damage is not fatal");
    assert_eq!(log.players.len(), 1);
    assert_eq!(log.moves[0].cards_kept.len(), 1);
    assert_eq!(log.moves[0].cards_kept[&7], vec!["Birds".to_string()]);
}

#[test]
fn unreadable_file_reports_read_error() {
    let err = load_replay_file(fixture_path("does_not_exist.json")).unwrap_err();
    assert!(matches!(err, ReplayError::Read(_)));
}

#[test]
fn invalid_json_reports_json_error() {
    let err = parse_replay_json("{not json").unwrap_err();
    assert!(matches!(err, ReplayError::Json(_)));
}
