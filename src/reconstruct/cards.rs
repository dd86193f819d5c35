//! Card Lifecycle Reconstructor: one forward scan over the move stream,
//! building exactly one record per (player, card) ever encountered.
//!
//! Every concern runs as two layered passes per move: the structured-field
//! pass first, then the legacy text-phrase pass, both writing through
//! [FirstWrite] cells so pass order never affects the stored value.
//! Classifiers are independent functions tried in precedence order,
//! first success wins.

use std::collections::HashMap;

use crate::reconstruct::pending::{effect_profile, PendingQueue};
use crate::reconstruct::phrases::{self, ActorRef};
use crate::reconstruct::{resolve_actor, tiles, CardRecord, DrawType, FirstWrite};
use crate::replay::{Generation, Move, MoveNumber, PlayerId, ReplayLog};

/// Buy/keep events this many moves after a draft offer are still attributed
/// to that draft.
const DRAFT_BACKFILL_WINDOW: MoveNumber = 20;
/// Forward window (moves by the same actor) for resolving a draw session
/// into keeps/buys.
const DRAW_RESOLUTION_WINDOW: usize = 10;
/// Look-back window (moves by the same actor) for inferring the cause of an
/// unexplained draw.
const INFERENCE_LOOKBACK: usize = 3;
/// A research draft deals exactly four cards.
const DRAFT_HAND_SIZE: usize = 4;

#[derive(Debug, Default)]
struct CardHistory {
    seen: FirstWrite<Generation>,
    drawn: FirstWrite<Generation>,
    kept: FirstWrite<Generation>,
    drafted: FirstWrite<Generation>,
    bought: FirstWrite<Generation>,
    played: FirstWrite<Generation>,
    draw_type: FirstWrite<DrawType>,
    draw_reason: FirstWrite<String>,
}

#[derive(Debug, Clone, Copy)]
struct DraftRecord {
    move_number: MoveNumber,
    generation: Generation,
    actor: PlayerId,
}

/// Outcome of the draw-type precedence chain for one set of drawn names.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DrawClass {
    Draft,
    Effect,
    Inferred(DrawType, String),
    Unknown,
}

struct CardPass<'a> {
    log: &'a ReplayLog,
    cards: HashMap<(PlayerId, String), CardHistory>,
    pending: HashMap<PlayerId, PendingQueue>,
    /// Draw events resolved so far, per actor.
    draw_events: HashMap<PlayerId, u32>,
    /// Every draft offer/pick seen so far, by card name, for back-attribution.
    draft_events: HashMap<String, Vec<DraftRecord>>,
    current_gen: Generation,
}

/// Reconstruct the full card lifecycle table for one log.
pub fn reconstruct_cards(log: &ReplayLog) -> Vec<CardRecord> {
    let mut pass = CardPass {
        log,
        cards: HashMap::new(),
        pending: HashMap::new(),
        draw_events: HashMap::new(),
        draft_events: HashMap::new(),
        current_gen: 1,
    };
    pass.seed_starting_hands();
    for index in 0..log.moves.len() {
        pass.process_move(index);
    }
    pass.finalize()
}

impl<'a> CardPass<'a> {
    fn card(&mut self, player: PlayerId, name: &str) -> &mut CardHistory {
        self.cards
            .entry((player, name.to_string()))
            .or_default()
    }

    fn resolve(&self, actor: ActorRef<'_>) -> Option<PlayerId> {
        resolve_actor(self.log, actor)
    }

    /// True for corporation names, which never participate in draft phrases.
    fn is_corporation(&self, name: &str) -> bool {
        self.log.players.values().any(|p| {
            p.corporation.as_deref() == Some(name)
                || p.starting_hand.corporations.iter().any(|c| c == name)
        })
    }

    fn is_dealt_prelude(&self, player: PlayerId, name: &str) -> bool {
        self.log
            .players
            .get(&player)
            .map(|p| p.starting_hand.preludes.iter().any(|c| c == name))
            .unwrap_or(false)
    }

    /// Step 1: every project card dealt at game start is seen and drawn at
    /// generation 1, even if never kept.
    fn seed_starting_hands(&mut self) {
        let mut players: Vec<PlayerId> = self.log.players.keys().copied().collect();
        players.sort_unstable();
        for player in players {
            let dealt: Vec<String> = self.log.players[&player]
                .starting_hand
                .project_cards
                .clone();
            for name in dealt {
                let history = self.card(player, &name);
                history.seen.set(1);
                history.drawn.set(1);
                history.draw_type.set(DrawType::StartingHand);
            }
        }
    }

    fn process_move(&mut self, index: usize) {
        let mv = &self.log.moves[index];
        if let Some(gen) = mv.generation() {
            self.current_gen = gen;
        }
        let gen = self.current_gen;

        self.handle_options(mv, gen);
        self.handle_drafts(mv, gen);
        self.handle_keeps(mv, gen);
        self.handle_play_and_reveal(mv, gen);
        self.handle_effect_signals(mv);
        self.handle_draws(index, mv, gen);
        self.handle_buys(mv, gen);
    }

    /// Step 2: offered options mark every offered card seen and drawn. The
    /// offer is also remembered as a draft event so a later buy/keep inside
    /// the window back-attributes to it.
    fn handle_options(&mut self, mv: &Move, gen: Generation) {
        let mut actors: Vec<PlayerId> = mv.card_options.keys().copied().collect();
        actors.sort_unstable();
        for actor in actors {
            for name in mv.card_options[&actor].clone() {
                let history = self.card(actor, &name);
                history.seen.set(gen);
                history.drawn.set(gen);
                self.draft_events
                    .entry(name)
                    .or_default()
                    .push(DraftRecord {
                        move_number: mv.move_number,
                        generation: gen,
                        actor,
                    });
            }
        }
    }

    /// Step 3: draft picks, structured field first, then legacy phrases.
    fn handle_drafts(&mut self, mv: &Move, gen: Generation) {
        if let (Some(card), Some(actor)) = (mv.card_drafted.clone(), mv.actor) {
            self.mark_draft(actor, &card, gen, mv.move_number);
        }
        for phrase in mv.phrases() {
            let Some((actor_ref, card)) = phrases::draft(phrase) else {
                continue;
            };
            if self.is_corporation(card) {
                continue;
            }
            let card = card.to_string();
            if let Some(actor) = self.resolve(actor_ref) {
                self.mark_draft(actor, &card, gen, mv.move_number);
            }
        }
    }

    fn mark_draft(&mut self, actor: PlayerId, card: &str, gen: Generation, number: MoveNumber) {
        let history = self.card(actor, card);
        history.seen.set(gen);
        history.drawn.set(gen);
        history.drafted.set(gen);
        history.draw_type.set(DrawType::Draft);
        self.draft_events
            .entry(card.to_string())
            .or_default()
            .push(DraftRecord {
                move_number: number,
                generation: gen,
                actor,
            });
    }

    /// Step 4: kept cards, with the dealt-prelude override and draft
    /// back-attribution (step 7).
    fn handle_keeps(&mut self, mv: &Move, gen: Generation) {
        let mut actors: Vec<PlayerId> = mv.cards_kept.keys().copied().collect();
        actors.sort_unstable();
        for actor in actors {
            for name in mv.cards_kept[&actor].clone() {
                self.mark_kept(actor, &name, gen, mv.move_number);
            }
        }
        for phrase in mv.phrases() {
            let Some((actor_ref, names)) = phrases::keeps(phrase) else {
                continue;
            };
            if let Some(actor) = self.resolve(actor_ref) {
                for name in names {
                    self.mark_kept(actor, &name, gen, mv.move_number);
                }
            }
        }
    }

    fn mark_kept(&mut self, actor: PlayerId, card: &str, gen: Generation, number: MoveNumber) {
        let dealt_prelude = self.is_dealt_prelude(actor, card);
        let history = self.card(actor, card);
        history.seen.set(gen);
        history.kept.set(gen);
        history.drawn.set(gen);
        if dealt_prelude {
            history.draw_type.force(DrawType::StartingHand);
            return;
        }
        self.backfill_draft(actor, card, gen, number);
    }

    /// Step 7: a buy/keep without a draft marker inherits the nearest
    /// same-generation draft event within the window.
    fn backfill_draft(&mut self, actor: PlayerId, card: &str, gen: Generation, number: MoveNumber) {
        if self.cards[&(actor, card.to_string())].drafted.is_set() {
            return;
        }
        let Some(records) = self.draft_events.get(card) else {
            return;
        };
        let window_start = number.saturating_sub(DRAFT_BACKFILL_WINDOW);
        let matched = records
            .iter()
            .filter(|r| {
                r.generation == gen && r.move_number <= number && r.move_number >= window_start
            })
            .max_by_key(|r| r.move_number)
            .copied();
        if let Some(record) = matched {
            log::debug!(
                "cards: '{card}' bought/kept at move {number} attributed to draft at move {} by {}",
                record.move_number,
                record.actor
            );
            let history = self.card(actor, card);
            history.drafted.set(record.generation);
            history.drawn.set(record.generation);
            history.draw_type.set(DrawType::Draft);
        }
    }

    /// Step 8: plays and reveal sub-phrases.
    fn handle_play_and_reveal(&mut self, mv: &Move, gen: Generation) {
        let mut played: Option<(PlayerId, String)> = None;
        if mv.is_play_card() {
            if let (Some(card), Some(actor)) = (mv.card_played.clone(), mv.actor) {
                played = Some((actor, card));
            }
        }
        if played.is_none() {
            for phrase in mv.phrases() {
                if let Some((actor_ref, card)) = phrases::plays(phrase) {
                    let card = card.to_string();
                    if let Some(actor) = self.resolve(actor_ref) {
                        played = Some((actor, card));
                        break;
                    }
                }
            }
        }
        let Some((actor, card)) = played else {
            return;
        };

        if actor != self.log.perspective_player {
            // Only the play itself is knowable for other players' copies.
            self.card(actor, &card).played.set(gen);
            return;
        }

        {
            let history = self.card(actor, &card);
            history.seen.set(gen);
            history.played.set(gen);
        }

        for phrase in mv.phrases() {
            let Some(reveal) = phrases::reveal(phrase) else {
                continue;
            };
            let name = reveal.card.to_string();
            let history = self.card(actor, &name);
            if reveal.tag_hit {
                // Tag hit means the play drew this card.
                history.seen.set(gen);
                history.drawn.set(gen);
                history.draw_type.set(DrawType::PlayCard);
                history.draw_reason.set(card.clone());
            } else {
                history.seen.set(gen);
                history.draw_type.set(DrawType::Reveal);
            }
        }
    }

    /// Step 6 (enqueue/confirm half): triggered effects enter the pending
    /// queue; removal/discard phrases confirm awaiting ones.
    fn handle_effect_signals(&mut self, mv: &Move) {
        if mv.is_play_card() {
            for phrase in mv.phrases() {
                let Some(name) = phrases::triggered_effect(phrase) else {
                    continue;
                };
                let Some(profile) = effect_profile(name) else {
                    continue;
                };
                let Some(actor) = mv.actor else {
                    continue;
                };
                let next = self.draw_events.get(&actor).copied().unwrap_or(0) + 1;
                self.pending
                    .entry(actor)
                    .or_default()
                    .enqueue(name, profile, next);
            }
        }

        for phrase in mv.phrases() {
            if let Some((_, card)) = phrases::removes_resource(phrase) {
                let Some(actor) = mv.actor else {
                    continue;
                };
                let next = self.draw_events.get(&actor).copied().unwrap_or(0) + 1;
                if let Some(queue) = self.pending.get_mut(&actor) {
                    queue.confirm_named(card, next);
                }
            } else if let Some((actor_ref, _)) = phrases::discards(phrase) {
                let Some(actor) = self.resolve(actor_ref).or(mv.actor) else {
                    continue;
                };
                let next = self.draw_events.get(&actor).copied().unwrap_or(0) + 1;
                if let Some(queue) = self.pending.get_mut(&actor) {
                    queue.confirm_any(next);
                }
            }
        }
    }

    /// Steps 5, 6 (consume half) and 9: draw events.
    fn handle_draws(&mut self, index: usize, mv: &Move, gen: Generation) {
        for phrase in mv.phrases() {
            let Some((actor_ref, names)) = phrases::draws(phrase) else {
                continue;
            };
            let Some(actor) = self.resolve(actor_ref).or(mv.actor) else {
                continue;
            };
            self.handle_draw_event(index, mv, actor, &names, gen);
        }
    }

    fn handle_draw_event(
        &mut self,
        index: usize,
        mv: &Move,
        actor: PlayerId,
        names: &[String],
        gen: Generation,
    ) {
        let upcoming = self.draw_events.get(&actor).copied().unwrap_or(0) + 1;
        let class = self.classify_draw(index, mv, actor, names, upcoming);

        // Ready effects targeting this event are consumed no matter how the
        // draw classified; the credits only become DrawReasons for Effect.
        let credited = self
            .pending
            .entry(actor)
            .or_default()
            .consume(upcoming, names.len());

        for (position, name) in names.iter().enumerate() {
            let history = self.card(actor, name);
            history.seen.set(gen);
            history.drawn.set(gen);
            match &class {
                DrawClass::Draft => {
                    history.draw_type.set(DrawType::Draft);
                }
                DrawClass::Effect => {
                    if let Some(reason) = credited.get(position) {
                        history.draw_type.set(DrawType::Effect);
                        history.draw_reason.set(reason.clone());
                    }
                }
                DrawClass::Inferred(draw_type, reason) => {
                    history.draw_type.set(*draw_type);
                    history.draw_reason.set(reason.clone());
                }
                DrawClass::Unknown => {}
            }
        }

        if class == DrawClass::Draft {
            // Research-draft deals count as draft events for later
            // back-attribution of buys/keeps.
            for name in names {
                self.draft_events
                    .entry(name.clone())
                    .or_default()
                    .push(DraftRecord {
                        move_number: mv.move_number,
                        generation: gen,
                        actor,
                    });
            }
        }

        self.draw_events.insert(actor, upcoming);

        if !names.is_empty() {
            self.resolve_draw_session(index, actor, names, gen);
        }
    }

    /// Step 5 precedence chain. Each arm is independent; first success wins.
    fn classify_draw(
        &self,
        index: usize,
        mv: &Move,
        actor: PlayerId,
        names: &[String],
        upcoming: u32,
    ) -> DrawClass {
        if let Some(class) = self.classify_as_draft(index, mv, names) {
            return class;
        }
        if let Some(class) = self.classify_as_effect(actor, upcoming) {
            return class;
        }
        if let Some(class) = self.classify_by_lookback(index, actor) {
            return class;
        }
        DrawClass::Unknown
    }

    fn classify_as_draft(&self, index: usize, mv: &Move, names: &[String]) -> Option<DrawClass> {
        if mv.is_draft_kind() || mv.description.contains("Research draft") {
            return Some(DrawClass::Draft);
        }
        if names.len() == DRAFT_HAND_SIZE {
            return Some(DrawClass::Draft);
        }
        if names.is_empty() || index == 0 {
            return None;
        }
        let prev = &self.log.moves[index - 1];
        let new_round = prev.is_pass()
            || prev.phrases().any(phrases::is_new_generation)
            || mv.phrases().any(phrases::is_new_generation)
            || matches!(
                (prev.generation(), mv.generation()),
                (Some(before), Some(after)) if after > before
            );
        new_round.then_some(DrawClass::Draft)
    }

    fn classify_as_effect(&self, actor: PlayerId, upcoming: u32) -> Option<DrawClass> {
        self.pending
            .get(&actor)
            .filter(|queue| queue.has_ready_for(upcoming))
            .map(|_| DrawClass::Effect)
    }

    /// Step 5(c): adopt the cause from one of the actor's three preceding
    /// moves: an activation, a card play, or a coordinate-bearing placement.
    fn classify_by_lookback(&self, index: usize, actor: PlayerId) -> Option<DrawClass> {
        let mut inspected = 0;
        for mv in self.log.moves[..index].iter().rev() {
            if mv.actor != Some(actor) {
                continue;
            }
            inspected += 1;
            if inspected > INFERENCE_LOOKBACK {
                break;
            }

            for phrase in mv.phrases() {
                if let Some((_, card)) = phrases::activates(phrase) {
                    return Some(DrawClass::Inferred(DrawType::Activation, card.to_string()));
                }
            }
            if mv.is_activation() {
                if let Some(card) = mv.card_played.as_deref() {
                    return Some(DrawClass::Inferred(DrawType::Activation, card.to_string()));
                }
            }

            if let Some(card) = mv.card_played.as_deref() {
                if !mv.is_activation() {
                    return Some(DrawClass::Inferred(DrawType::PlayCard, card.to_string()));
                }
            }
            for phrase in mv.phrases() {
                if let Some((_, card)) = phrases::plays(phrase) {
                    return Some(DrawClass::Inferred(DrawType::PlayCard, card.to_string()));
                }
            }

            if mv.is_place_tile() {
                if let Some(tile) = mv.tile_placed.as_deref() {
                    return Some(DrawClass::Inferred(DrawType::Tile, tile.to_string()));
                }
            }
            for phrase in mv.phrases() {
                let Some((_, rest)) = phrases::placement(phrase) else {
                    continue;
                };
                // Only coordinate-bearing placements qualify as draw causes.
                if tiles::normalize_location(rest).is_hex {
                    let tile = rest.split('(').next().unwrap_or(rest).trim();
                    return Some(DrawClass::Inferred(DrawType::Tile, tile.to_string()));
                }
            }
        }
        None
    }

    /// Step 9: resolve a draw session by looking forward for keeps/buys of
    /// the drawn cards. Abandoned when the very next move skips the rest of
    /// the turn; otherwise unresolved cards default to kept at the draw
    /// generation.
    fn resolve_draw_session(
        &mut self,
        index: usize,
        actor: PlayerId,
        names: &[String],
        gen: Generation,
    ) {
        if let Some(next) = self.log.moves.get(index + 1) {
            if next.phrases().any(phrases::is_skips_rest) {
                return;
            }
        }

        let mut resolved = false;
        let mut inspected = 0;
        for mv in self.log.moves[index + 1..].iter() {
            let phrase_actor = mv.phrases().find_map(|phrase| {
                phrases::keeps(phrase)
                    .map(|(a, _)| a)
                    .or_else(|| phrases::buys(phrase).map(|(a, _)| a))
            });
            let belongs_to_actor = mv.actor == Some(actor)
                || phrase_actor.and_then(|a| self.resolve(a)) == Some(actor);
            if !belongs_to_actor {
                continue;
            }
            inspected += 1;
            if inspected > DRAW_RESOLUTION_WINDOW {
                break;
            }

            let structured_keep = mv
                .cards_kept
                .get(&actor)
                .map(|kept| kept.iter().any(|name| names.contains(name)))
                .unwrap_or(false);
            let phrase_resolution = mv.phrases().any(|phrase| {
                let listed = phrases::keeps(phrase)
                    .or_else(|| phrases::buys(phrase))
                    .map(|(_, listed)| listed)
                    .unwrap_or_default();
                listed.iter().any(|name| names.contains(name))
            });
            if structured_keep || phrase_resolution {
                resolved = true;
                break;
            }
        }

        if !resolved {
            // Off-screen discards are misread as keeps here; preserved for
            // behavioral compatibility with the source logs.
            for name in names {
                self.card(actor, name).kept.set(gen);
            }
        }
    }

    /// Legacy buy phrases; buys join the draft back-attribution path.
    fn handle_buys(&mut self, mv: &Move, gen: Generation) {
        for phrase in mv.phrases() {
            let Some((actor_ref, names)) = phrases::buys(phrase) else {
                continue;
            };
            let Some(actor) = self.resolve(actor_ref).or(mv.actor) else {
                continue;
            };
            for name in names {
                {
                    let history = self.card(actor, &name);
                    history.seen.set(gen);
                    history.bought.set(gen);
                }
                self.backfill_draft(actor, &name, gen, mv.move_number);
            }
        }
    }

    /// Terminal pass: VP join, played-without-VP normalization, and the
    /// Kept⇒Drawn / Played⇒Kept∧Drawn backfill invariants.
    fn finalize(mut self) -> Vec<CardRecord> {
        if let Some(terminal) = self.log.terminal_state() {
            let mut players: Vec<PlayerId> = terminal.player_vp.keys().copied().collect();
            players.sort_unstable();
            let joins: Vec<(PlayerId, String, i64)> = players
                .into_iter()
                .flat_map(|player| {
                    let mut cards: Vec<(&String, &i64)> =
                        terminal.player_vp[&player].cards.iter().collect();
                    cards.sort_by_key(|(name, _)| name.as_str());
                    cards
                        .into_iter()
                        .map(move |(name, vp)| (player, name.clone(), *vp))
                        .collect::<Vec<_>>()
                })
                .collect();
            for (player, name, _) in &joins {
                self.card(*player, name);
            }

            let vp_by_key: HashMap<(PlayerId, String), i64> = joins
                .into_iter()
                .map(|(player, name, vp)| ((player, name), vp))
                .collect();

            return self.collect_records(&vp_by_key);
        }
        self.collect_records(&HashMap::new())
    }

    fn collect_records(self, vp_by_key: &HashMap<(PlayerId, String), i64>) -> Vec<CardRecord> {
        let table_id = self.log.table_id;
        let mut records: Vec<CardRecord> = self
            .cards
            .into_iter()
            .map(|((player, name), mut history)| {
                if let Some(played) = history.played.value() {
                    if !history.kept.is_set() {
                        history.kept.set(played);
                    }
                }
                if let Some(kept) = history.kept.value() {
                    if !history.drawn.is_set() {
                        history.drawn.set(kept);
                    }
                }

                let joined_vp = vp_by_key.get(&(player, name.clone())).copied();
                let vp_scored = match (joined_vp, history.played.is_set()) {
                    (Some(vp), _) => Some(vp),
                    (None, true) => Some(0),
                    (None, false) => None,
                };

                CardRecord {
                    table_id,
                    player_id: player,
                    card_name: name,
                    seen_gen: history.seen.value(),
                    drawn_gen: history.drawn.value(),
                    kept_gen: history.kept.value(),
                    drafted_gen: history.drafted.value(),
                    bought_gen: history.bought.value(),
                    played_gen: history.played.value(),
                    draw_type: history.draw_type.value(),
                    draw_reason: history.draw_reason.into_inner(),
                    vp_scored,
                }
            })
            .collect();
        records.sort_by(|a, b| {
            (a.player_id, a.card_name.as_str()).cmp(&(b.player_id, b.card_name.as_str()))
        });
        records
    }
}
