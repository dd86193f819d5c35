//! Legacy free-text phrase parsers.
//!
//! Older log formats carry no structured fields; the `|`-delimited
//! description phrases are the only event source. Each parser here targets
//! one phrase shape and returns `None` for anything it does not recognize;
//! an unrecognized phrase contributes no event, it never fails a move.
//!
//! The perspective player is always written as `You` (`You draft X`); other
//! players appear by display name (`Ada drafts X`).

/// Who a phrase attributes an action to. Resolution to a player id happens
/// in the card pass, which knows the perspective player and the name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRef<'a> {
    You,
    Named(&'a str),
}

/// Split `<actor> <verb> <rest>` for a second-person/third-person verb pair.
/// Multi-word player names are handled by splitting at the first
/// ` <third> ` occurrence.
fn actor_verb<'a>(phrase: &'a str, second: &str, third: &str) -> Option<(ActorRef<'a>, &'a str)> {
    let you_prefix = format!("You {second} ");
    if let Some(rest) = phrase.strip_prefix(&you_prefix) {
        return Some((ActorRef::You, rest.trim()));
    }
    let needle = format!(" {third} ");
    if let Some(pos) = phrase.find(&needle) {
        let name = phrase[..pos].trim();
        let rest = phrase[pos + needle.len()..].trim();
        if !name.is_empty() && !rest.is_empty() {
            return Some((ActorRef::Named(name), rest));
        }
    }
    None
}

/// True for purely numeric tails like `1 card`, `2 cards`, `3 card/s` that
/// name no cards at all.
fn count_only(rest: &str) -> bool {
    let mut tokens = rest.split_whitespace();
    let count = tokens.next();
    let noun = tokens.next();
    let trailing = tokens.next();
    matches!(
        (count, noun, trailing),
        (Some(c), Some(n), None)
            if c.parse::<u32>().is_ok() && matches!(n, "card" | "cards" | "card/s")
    )
}

/// Split a listed card tail (`A, B and C`) into names.
pub fn card_list(rest: &str) -> Vec<String> {
    rest.split(',')
        .flat_map(|part| part.split(" and "))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// `You draft X` / `<name> drafts X`. One card per phrase.
pub fn draft(phrase: &str) -> Option<(ActorRef<'_>, &str)> {
    actor_verb(phrase, "draft", "drafts")
}

/// `You keep X, Y` / `<name> keeps X`. Numeric-only tails (`keeps 1 card/s`)
/// are excluded: they name nothing.
pub fn keeps(phrase: &str) -> Option<(ActorRef<'_>, Vec<String>)> {
    let (actor, rest) = actor_verb(phrase, "keep", "keeps")?;
    if count_only(rest) {
        return None;
    }
    Some((actor, card_list(rest)))
}

/// `You draw X, Y` / `<name> draws X`. A numeric-only tail still counts as a
/// draw event (for pending-effect targeting) but carries no names.
pub fn draws(phrase: &str) -> Option<(ActorRef<'_>, Vec<String>)> {
    let (actor, rest) = actor_verb(phrase, "draw", "draws")?;
    if count_only(rest) {
        return Some((actor, Vec::new()));
    }
    Some((actor, card_list(rest)))
}

/// `You buy X` / `<name> buys X`.
pub fn buys(phrase: &str) -> Option<(ActorRef<'_>, Vec<String>)> {
    let (actor, rest) = actor_verb(phrase, "buy", "buys")?;
    if count_only(rest) {
        return None;
    }
    Some((actor, card_list(rest)))
}

/// `You play X` / `<name> plays X`.
pub fn plays(phrase: &str) -> Option<(ActorRef<'_>, &str)> {
    actor_verb(phrase, "play", "plays")
}

/// `You activate X` / `<name> activates X`.
pub fn activates(phrase: &str) -> Option<(ActorRef<'_>, &str)> {
    actor_verb(phrase, "activate", "activates")
}

/// `You discard X` / `<name> discards X`.
pub fn discards(phrase: &str) -> Option<(ActorRef<'_>, &str)> {
    actor_verb(phrase, "discard", "discards")
}

/// `You place [tile] <Type> ...` / `<name> places [tile] <Type> ...`.
/// Returns the tail after the optional `tile` keyword: tile type plus
/// whatever location text the log appended.
pub fn placement(phrase: &str) -> Option<(ActorRef<'_>, &str)> {
    let (actor, rest) = actor_verb(phrase, "place", "places")?;
    let rest = rest.strip_prefix("tile ").unwrap_or(rest);
    Some((actor, rest))
}

/// A revealed card: `reveals X: it has a Space tag`. `tag_hit` is true when
/// the sub-phrase confirms a Space or Plant tag, which means the reveal was
/// drawn by the play that revealed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal<'a> {
    pub card: &'a str,
    pub tag_hit: bool,
}

pub fn reveal(phrase: &str) -> Option<Reveal<'_>> {
    let pos = phrase.find("reveals ")?;
    let rest = &phrase[pos + "reveals ".len()..];
    let (card, tail) = match rest.split_once(':') {
        Some((card, tail)) => (card.trim(), tail),
        None => (rest.trim(), ""),
    };
    if card.is_empty() {
        return None;
    }
    let tag_hit = tail.contains("Space tag") || tail.contains("Plant tag");
    Some(Reveal { card, tag_hit })
}

/// `... triggered effect of <Name>`. Returns the effect card name.
pub fn triggered_effect(phrase: &str) -> Option<&str> {
    let pos = phrase.find("triggered effect of ")?;
    let rest = &phrase[pos + "triggered effect of ".len()..];
    let name = rest
        .split(':')
        .next()
        .unwrap_or(rest)
        .trim()
        .trim_end_matches(['.', ')']);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// `removes <Resource> from <Name>` (also `You remove ... from ...`).
/// Returns (resource text, card name).
pub fn removes_resource(phrase: &str) -> Option<(&str, &str)> {
    let rest = if let Some(r) = phrase.strip_prefix("You remove ") {
        r
    } else {
        let pos = phrase.find("removes ")?;
        &phrase[pos + "removes ".len()..]
    };
    let (resource, card) = rest.split_once(" from ")?;
    let resource = resource.trim();
    let card = card.trim().trim_end_matches('.');
    if resource.is_empty() || card.is_empty() {
        None
    } else {
        Some((resource, card))
    }
}

pub fn is_skips_rest(phrase: &str) -> bool {
    phrase.contains("skips rest of actions") || phrase.contains("skip rest of actions")
}

/// New-generation marker phrase (`New generation 4`).
pub fn is_new_generation(phrase: &str) -> bool {
    phrase.starts_with("New generation")
}
