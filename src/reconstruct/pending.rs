//! Pending-effect queue: correlates a triggering card effect with the later,
//! decoupled draw event it causes.
//!
//! Lifecycle of one effect: enqueued -> [awaiting signal] -> ready ->
//! consumed. Immediate effects are ready at enqueue time and bound to the
//! actor's next draw-event number right away; confirmation-required effects
//! wait for a `removes <Resource> from <Name>` or discard phrase and bind to
//! the next draw-event number at confirmation time.

use std::collections::VecDeque;

/// Behavior of one allow-listed triggered-effect card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectProfile {
    /// Waits for a resource-removal/discard signal before becoming ready.
    pub requires_confirmation: bool,
    /// Cards the effect draws once ready.
    pub draws: u32,
}

/// Allow-list of card effects that cause a later draw event. Anything not
/// listed here never enqueues, no matter what the description claims.
pub fn effect_profile(name: &str) -> Option<EffectProfile> {
    match name {
        "Point Luna" | "Mars Tech Lab" => Some(EffectProfile {
            requires_confirmation: false,
            draws: 1,
        }),
        "Olympus Conference" | "Mars University" => Some(EffectProfile {
            requires_confirmation: true,
            draws: 1,
        }),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEffect {
    /// Name of the effect card; becomes the DrawReason of the credited draw.
    pub reason: String,
    pub requires_confirmation: bool,
    pub ready: bool,
    pub remaining: u32,
    /// Draw-event number this effect is bound to, set when it becomes ready.
    pub target_draw_event: Option<u32>,
}

/// FIFO queue of pending effects for one actor.
#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    effects: VecDeque<PendingEffect>,
}

impl PendingQueue {
    /// Record a triggered effect. `next_draw_event` is the actor's upcoming
    /// draw-event number; immediate effects bind to it now.
    pub fn enqueue(&mut self, name: &str, profile: EffectProfile, next_draw_event: u32) {
        let ready = !profile.requires_confirmation;
        self.effects.push_back(PendingEffect {
            reason: name.to_string(),
            requires_confirmation: profile.requires_confirmation,
            ready,
            remaining: profile.draws,
            target_draw_event: ready.then_some(next_draw_event),
        });
    }

    /// Confirm the oldest awaiting effect named `card`, binding it to
    /// `next_draw_event`. Returns true when something was confirmed.
    pub fn confirm_named(&mut self, card: &str, next_draw_event: u32) -> bool {
        self.confirm(|e| e.reason == card, next_draw_event)
    }

    /// Confirm the oldest awaiting effect regardless of name (discard
    /// phrases do not name the effect card).
    pub fn confirm_any(&mut self, next_draw_event: u32) -> bool {
        self.confirm(|_| true, next_draw_event)
    }

    fn confirm(&mut self, matches: impl Fn(&PendingEffect) -> bool, next_draw_event: u32) -> bool {
        for effect in &mut self.effects {
            if effect.requires_confirmation && !effect.ready && matches(effect) {
                effect.ready = true;
                effect.target_draw_event = Some(next_draw_event);
                return true;
            }
        }
        false
    }

    /// True when a ready effect targets the given draw-event number.
    pub fn has_ready_for(&self, draw_event: u32) -> bool {
        self.effects
            .iter()
            .any(|e| e.ready && e.target_draw_event == Some(draw_event))
    }

    /// Consume ready effects targeting `draw_event`, crediting at most one
    /// per drawn card name (FIFO). Exhausted effects are removed. Returns the
    /// credited reasons, in order, at most `drawn_names` of them.
    pub fn consume(&mut self, draw_event: u32, drawn_names: usize) -> Vec<String> {
        let mut credited = Vec::new();
        for effect in &mut self.effects {
            if credited.len() == drawn_names {
                break;
            }
            if effect.ready && effect.target_draw_event == Some(draw_event) && effect.remaining > 0
            {
                let credits = effect
                    .remaining
                    .min((drawn_names - credited.len()) as u32);
                for _ in 0..credits {
                    credited.push(effect.reason.clone());
                }
                effect.remaining -= credits;
            }
        }
        self.effects.retain(|e| e.remaining > 0);
        credited
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
