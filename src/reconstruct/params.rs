//! Shared planetary-parameter track: emits one event per unit step of
//! temperature, oxygen and oceans, attributed to the move's actor.

use crate::reconstruct::{Parameter, ParameterEvent};
use crate::replay::{GameState, ReplayLog};

fn snapshot_value(state: &GameState, parameter: Parameter) -> Option<i32> {
    match parameter {
        Parameter::Temperature => state.temperature,
        Parameter::Oxygen => state.oxygen,
        Parameter::Oceans => state.oceans,
    }
}

const TRACKED: [Parameter; 3] = [Parameter::Temperature, Parameter::Oxygen, Parameter::Oceans];

/// Walk moves in order keeping last-seen values; a strict increase at a move
/// with a known generation emits one event per unit step. Last-seen is
/// always updated afterward, even for an unparsable actor or an
/// equal/decreasing value (which emit nothing).
pub fn extract_parameter_events(log: &ReplayLog) -> Vec<ParameterEvent> {
    let mut last: [Option<i32>; 3] = [None; 3];
    let mut events = Vec::new();

    for mv in &log.moves {
        let Some(generation) = mv.generation() else {
            continue;
        };
        for (slot, parameter) in TRACKED.into_iter().enumerate() {
            let Some(value) = snapshot_value(&mv.state, parameter) else {
                continue;
            };
            if let Some(previous) = last[slot] {
                if value > previous {
                    let step = parameter.step_size();
                    let mut reached = previous + step;
                    while reached <= value {
                        events.push(ParameterEvent {
                            table_id: log.table_id,
                            parameter,
                            generation,
                            increased_to: reached,
                            increased_by: mv.actor,
                        });
                        reached += step;
                    }
                }
            }
            last[slot] = Some(value);
        }
    }
    events
}
