//! Tile placement locator: resolves the generation a city or greenery was
//! placed by searching the owning player's moves for a matching placement.
//!
//! Locations in snapshots and in prose disagree in format (`Tharsis Hex
//! (4,5)` vs `(4, 5)` vs a named city like `Ganymede Colony`), so matching
//! goes through a normalized form. Finding nothing is expected, not an
//! error: the record simply carries no placement generation.

use crate::reconstruct::{phrases, resolve_actor, TileKind, TilePlacement};
use crate::replay::{Generation, Move, PlayerId, ReplayLog};

/// Location reduced to its comparable parts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedLocation {
    pub is_hex: bool,
    /// Token immediately preceding the literal word `Hex` (the map name).
    pub map_name: Option<String>,
    pub coords: Option<(i64, i64)>,
}

fn parse_pair(token: &str) -> Option<(i64, i64)> {
    let (x, y) = token.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// Preferred form: a parenthesized `x,y` anywhere in the string.
fn parenthesized_pair(raw: &str) -> Option<(i64, i64)> {
    let open = raw.find('(')?;
    let close = raw[open..].find(')')? + open;
    parse_pair(&raw[open + 1..close])
}

/// Fallback: a bare `x,y` token delimited by whitespace, `|` or `:`.
fn bare_pair(raw: &str) -> Option<(i64, i64)> {
    raw.split(|c: char| c.is_whitespace() || c == '|' || c == ':')
        .find_map(parse_pair)
}

pub fn normalize_location(raw: &str) -> NormalizedLocation {
    let coords = parenthesized_pair(raw).or_else(|| bare_pair(raw));
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let map_name = tokens
        .windows(2)
        .find(|pair| pair[1] == "Hex")
        .map(|pair| pair[0].to_string());
    NormalizedLocation {
        is_hex: coords.is_some(),
        map_name,
        coords,
    }
}

/// Two normalized locations match when both are hex-form with equal
/// coordinates and the map names agree (or either side omits one).
pub fn hex_match(a: &NormalizedLocation, b: &NormalizedLocation) -> bool {
    if !(a.is_hex && b.is_hex) {
        return false;
    }
    if a.coords != b.coords || a.coords.is_none() {
        return false;
    }
    match (&a.map_name, &b.map_name) {
        (Some(lhs), Some(rhs)) => lhs == rhs,
        _ => true,
    }
}

fn text_matches(candidate: &str, target_raw: &str, target: &NormalizedLocation) -> bool {
    if candidate.contains(target_raw) || target_raw.contains(candidate) {
        return true;
    }
    hex_match(&normalize_location(candidate), target)
}

fn tile_type_matches(text: &str, kind: TileKind) -> bool {
    text.to_lowercase().contains(&kind.label().to_lowercase())
}

/// Search one owner's moves for the placement of a final-state location.
pub fn locate_placement_generation(
    log: &ReplayLog,
    owner: PlayerId,
    location: &str,
    kind: TileKind,
) -> Option<Generation> {
    let target = normalize_location(location);

    // Structured place_tile moves first.
    for mv in owner_moves(log, owner) {
        if !mv.is_place_tile() {
            continue;
        }
        let Some(tile) = mv.tile_placed.as_deref() else {
            continue;
        };
        if !tile_type_matches(tile, kind) {
            continue;
        }
        let matched = match mv.tile_location.as_deref() {
            Some(loc) => text_matches(loc, location, &target),
            None => false,
        };
        if matched {
            if let Some(gen) = mv.generation() {
                return Some(gen);
            }
        }
    }

    // Legacy free-text `places <Type> ...` phrases.
    for mv in log.moves.iter() {
        for phrase in mv.phrases() {
            let Some((actor, rest)) = phrases::placement(phrase) else {
                continue;
            };
            if resolve_actor(log, actor).or(mv.actor) != Some(owner) {
                continue;
            }
            if !tile_type_matches(rest, kind) {
                continue;
            }
            if text_matches(rest, location, &target) {
                if let Some(gen) = mv.generation() {
                    return Some(gen);
                }
            }
        }
    }

    // Named (non-hex) city locations only: the card play that created the
    // city doubles as its placement.
    if kind == TileKind::City && !target.is_hex {
        for mv in owner_moves(log, owner) {
            let played = mv
                .card_played
                .as_deref()
                .map(|card| card == location)
                .unwrap_or(false)
                || mv.phrases().any(|phrase| {
                    phrases::plays(phrase)
                        .map(|(_, card)| card == location)
                        .unwrap_or(false)
                });
            if played {
                if let Some(gen) = mv.generation() {
                    return Some(gen);
                }
            }
        }
    }

    None
}

fn owner_moves<'a>(log: &'a ReplayLog, owner: PlayerId) -> impl Iterator<Item = &'a Move> {
    log.moves.iter().filter(move |mv| mv.actor == Some(owner))
}

/// Build city/greenery rows from the terminal snapshot's VP breakdown,
/// locating a placement generation for each.
pub fn finalize_tile_placements(log: &ReplayLog) -> Vec<TilePlacement> {
    let Some(terminal) = log.terminal_state() else {
        return Vec::new();
    };

    let mut players: Vec<PlayerId> = terminal.player_vp.keys().copied().collect();
    players.sort_unstable();

    let mut tiles = Vec::new();
    for player in players {
        let vp = &terminal.player_vp[&player];

        let mut cities: Vec<(&String, &i64)> = vp.cities.iter().collect();
        cities.sort_by_key(|(location, _)| location.as_str());
        for (location, points) in cities {
            tiles.push(TilePlacement {
                table_id: log.table_id,
                player_id: player,
                kind: TileKind::City,
                location: location.clone(),
                points: Some(*points),
                placed_gen: locate_placement_generation(log, player, location, TileKind::City),
            });
        }

        let mut greeneries: Vec<&String> = vp.greeneries.keys().collect();
        greeneries.sort();
        for location in greeneries {
            tiles.push(TilePlacement {
                table_id: log.table_id,
                player_id: player,
                kind: TileKind::Greenery,
                location: location.clone(),
                points: None,
                placed_gen: locate_placement_generation(
                    log,
                    player,
                    location,
                    TileKind::Greenery,
                ),
            });
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::GameState;

    #[test]
    fn normalize_prefers_parenthesized_pair() {
        let loc = normalize_location("Tharsis Hex (4,5)");
        assert!(loc.is_hex);
        assert_eq!(loc.coords, Some((4, 5)));
        assert_eq!(loc.map_name.as_deref(), Some("Tharsis"));
    }

    #[test]
    fn normalize_finds_bare_pair_token() {
        let loc = normalize_location("greenery | 5,3");
        assert!(loc.is_hex);
        assert_eq!(loc.coords, Some((5, 3)));
        assert_eq!(loc.map_name, None);
    }

    #[test]
    fn named_locations_are_not_hex() {
        let loc = normalize_location("Ganymede Colony");
        assert!(!loc.is_hex);
        assert_eq!(loc.coords, None);
    }

    #[test]
    fn named_city_location_falls_back_to_the_card_play() {
        let mut log = ReplayLog {
            table_id: 1,
            ..ReplayLog::default()
        };
        log.moves.push(Move {
            move_number: 80,
            actor: Some(7),
            action: "play_card".into(),
            card_played: Some("Ganymede Colony".into()),
            state: GameState {
                generation: Some(6),
                ..GameState::default()
            },
            ..Move::default()
        });
        assert_eq!(
            locate_placement_generation(&log, 7, "Ganymede Colony", TileKind::City),
            Some(6)
        );
        // Only non-hex cities use the proxy.
        assert_eq!(
            locate_placement_generation(&log, 7, "Ganymede Colony", TileKind::Greenery),
            None
        );
        assert_eq!(
            locate_placement_generation(&log, 3, "Ganymede Colony", TileKind::City),
            None,
            "other players' plays do not count"
        );
    }

    #[test]
    fn hex_match_requires_equal_coords_and_agreeing_maps() {
        let a = normalize_location("Tharsis Hex (4,5)");
        let b = normalize_location("(4, 5)");
        let c = normalize_location("Elysium Hex (4,5)");
        let d = normalize_location("Tharsis Hex (4,6)");
        assert!(hex_match(&a, &b), "absent map name matches any");
        assert!(!hex_match(&a, &c), "disagreeing map names do not match");
        assert!(!hex_match(&a, &d));
        assert!(!hex_match(&a, &normalize_location("Ganymede Colony")));
    }
}
