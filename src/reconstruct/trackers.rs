//! Per-player counter diff: emits one event for every value change of any
//! resource/production/tag tracker, including the first sighting.

use std::collections::HashMap;

use crate::reconstruct::{TrackerClass, TrackerEvent};
use crate::replay::{PlayerId, ReplayLog};

/// Classify a tracker by its display name.
pub fn classify_tracker(name: &str) -> TrackerClass {
    if name.contains("Production") {
        TrackerClass::Production
    } else if name.starts_with("Count of ") && name.trim_end().ends_with("tags") {
        TrackerClass::Tag
    } else {
        TrackerClass::Resource
    }
}

/// Diff every (actor, tracker) pair across the move stream. Moves are
/// visited in explicit move-number order; within a move, actors and tracker
/// names are visited in sorted order so output is deterministic.
pub fn extract_tracker_events(log: &ReplayLog) -> Vec<TrackerEvent> {
    let mut order: Vec<usize> = (0..log.moves.len()).collect();
    order.sort_by_key(|&i| log.moves[i].move_number);

    let mut last: HashMap<(PlayerId, &str), i64> = HashMap::new();
    let mut events = Vec::new();

    for index in order {
        let mv = &log.moves[index];
        let Some(generation) = mv.generation() else {
            continue;
        };

        let mut actors: Vec<PlayerId> = mv.state.trackers.keys().copied().collect();
        actors.sort_unstable();
        for actor in actors {
            let snapshot = &mv.state.trackers[&actor];
            let mut names: Vec<&String> = snapshot.keys().collect();
            names.sort();
            for name in names {
                let value = snapshot[name];
                if last.get(&(actor, name.as_str())) == Some(&value) {
                    continue;
                }
                events.push(TrackerEvent {
                    table_id: log.table_id,
                    player_id: actor,
                    tracker: name.clone(),
                    class: classify_tracker(name),
                    generation,
                    move_number: mv.move_number,
                    changed_to: value,
                });
                last.insert((actor, name.as_str()), value);
            }
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::{GameState, Move, ReplayLog};

    fn move_with_trackers(
        number: u32,
        generation: u32,
        trackers: Vec<(PlayerId, Vec<(&str, i64)>)>,
    ) -> Move {
        Move {
            move_number: number,
            state: GameState {
                generation: Some(generation),
                trackers: trackers
                    .into_iter()
                    .map(|(player, values)| {
                        (
                            player,
                            values
                                .into_iter()
                                .map(|(name, v)| (name.to_string(), v))
                                .collect(),
                        )
                    })
                    .collect(),
                ..GameState::default()
            },
            ..Move::default()
        }
    }

    #[test]
    fn classification_by_name() {
        assert_eq!(classify_tracker("Steel Production"), TrackerClass::Production);
        assert_eq!(classify_tracker("Count of Science tags"), TrackerClass::Tag);
        assert_eq!(classify_tracker("Heat"), TrackerClass::Resource);
    }

    #[test]
    fn first_sighting_and_changes_emit_unchanged_does_not() {
        let log = ReplayLog {
            table_id: 3,
            moves: vec![
                move_with_trackers(1, 1, vec![(7, vec![("Heat", 0)])]),
                move_with_trackers(2, 1, vec![(7, vec![("Heat", 0)])]),
                move_with_trackers(3, 2, vec![(7, vec![("Heat", 5)])]),
            ],
            ..ReplayLog::default()
        };
        let events = extract_tracker_events(&log);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].changed_to, 0);
        assert_eq!(events[0].move_number, 1);
        assert_eq!(events[1].changed_to, 5);
        assert_eq!(events[1].generation, 2);
    }

    #[test]
    fn moves_are_diffed_in_move_number_order() {
        let log = ReplayLog {
            table_id: 3,
            moves: vec![
                move_with_trackers(2, 1, vec![(7, vec![("Plants", 2)])]),
                move_with_trackers(1, 1, vec![(7, vec![("Plants", 1)])]),
            ],
            ..ReplayLog::default()
        };
        let events = extract_tracker_events(&log);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].move_number, 1);
        assert_eq!(events[0].changed_to, 1);
        assert_eq!(events[1].changed_to, 2);
    }
}
