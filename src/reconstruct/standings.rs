//! Milestone and award finalizers. Both read only the terminal snapshot;
//! the move stream is consulted just to turn a recorded claiming/funding
//! move number into a generation.

use log::warn;

use crate::reconstruct::{AwardFunding, MilestoneClaim, ReconstructReport};
use crate::replay::{Generation, MoveNumber, PlayerId, ReplayLog};

/// Generation of the move with the given number; 0 when unresolvable.
/// Downstream storage treats 0 as "unknown".
fn generation_of_move(log: &ReplayLog, number: Option<MoveNumber>) -> Generation {
    number
        .and_then(|n| log.moves.iter().find(|mv| mv.move_number == n))
        .and_then(|mv| mv.generation())
        .unwrap_or(0)
}

pub fn finalize_standings(
    log: &ReplayLog,
    report: &mut ReconstructReport,
) -> (Vec<MilestoneClaim>, Vec<AwardFunding>) {
    let Some(terminal) = log.terminal_state() else {
        return (Vec::new(), Vec::new());
    };

    let mut milestones = Vec::new();
    let mut names: Vec<&String> = terminal.milestones.keys().collect();
    names.sort();
    for name in names {
        let entry = &terminal.milestones[name];
        let Some(claimed_by) = entry.player else {
            warn!("standings: milestone '{name}' has unparsable claimant; skipped");
            report.skipped_milestones.push(name.clone());
            continue;
        };
        milestones.push(MilestoneClaim {
            table_id: log.table_id,
            milestone: name.clone(),
            claimed_by,
            claimed_gen: generation_of_move(log, entry.move_number),
        });
    }

    let mut awards = Vec::new();
    let mut award_names: Vec<&String> = terminal.awards.keys().collect();
    award_names.sort();
    let mut players: Vec<PlayerId> = terminal.player_vp.keys().copied().collect();
    players.sort_unstable();

    for award in award_names {
        let entry = &terminal.awards[award];
        let Some(funded_by) = entry.player else {
            warn!("standings: award '{award}' has unparsable funder; skipped");
            report.skipped_awards.push(award.clone());
            continue;
        };
        let funded_gen = generation_of_move(log, entry.move_number);

        // One row per player with a placement entry for this award, all
        // carrying the shared funding data.
        for &player in &players {
            let Some(standing) = terminal.player_vp[&player].awards.get(award) else {
                continue;
            };
            awards.push(AwardFunding {
                table_id: log.table_id,
                player_id: player,
                award: award.clone(),
                funded_by,
                funded_gen,
                place: standing.place,
                counter: standing.counter,
            });
        }
    }

    (milestones, awards)
}
