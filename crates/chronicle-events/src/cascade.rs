//! Cascade engine: probabilistic, depth-limited consequence scheduling and
//! resolution.
//!
//! The engine never touches a global RNG. Every probability roll comes from
//! an injected [`RandomFn`] closure, so two engines constructed with
//! identical inputs and an identical (deterministic) random source produce
//! byte-identical event chains.

use std::collections::HashMap;

use chronicle_ecs::prelude::EntityId;

use crate::bus::EventBus;
use crate::event::{
    ConsequenceRule, DampeningProfile, Event, EventBuilder, EventCategory, EventId,
    EventIdAllocator,
};
use crate::log::EventLog;

/// `() -> [0, 1)` random source injected into the cascade engine. Production
/// callers wrap a [`chronicle_ecs::rng::SimRng`]; tests inject a closure
/// returning a fixed or scripted sequence.
pub type RandomFn = Box<dyn FnMut() -> f64>;

// ---------------------------------------------------------------------------
// Dampening
// ---------------------------------------------------------------------------

/// Raise a rule's dampening severity in proportion to how significant its
/// cause was -- a momentous cause produces consequences whose probability
/// decays more gently with chain depth than a minor one's.
///
/// Open question (spec-undefined curve; see design notes): this
/// implementation linearly interpolates severity toward 1.0 by up to half
/// the remaining headroom, scaled by `cause_significance / 100`. It
/// satisfies the only two required properties: the result is always in
/// `[0, 1]`, and it is monotonically non-decreasing in `cause_significance`.
pub fn adjust_dampening_for_significance(
    profile: DampeningProfile,
    cause_significance: u8,
) -> DampeningProfile {
    let significance_fraction = (cause_significance as f64 / 100.0).clamp(0.0, 1.0);
    let headroom = 1.0 - profile.severity;
    let adjusted = profile.severity + headroom * significance_fraction * 0.5;
    DampeningProfile::new(adjusted)
}

/// Compute the depth-dampened probability of a consequence firing.
///
/// Open question (spec-undefined curve; see design notes): modeled as
/// geometric decay, `base * (1 - decay_per_level)^depth`, where
/// `decay_per_level = 0.5 * (1 - severity)`. This satisfies the three
/// required invariants: strictly non-increasing in `depth` (decay factor is
/// in `[0, 1]`), a gentler decay rate for higher `severity` (i.e. higher
/// cause significance, via [`adjust_dampening_for_significance`]), and
/// `p >= 0` always.
pub fn calculate_dampened_probability(
    base_probability: f64,
    adjusted_dampening: DampeningProfile,
    chain_depth: u32,
) -> f64 {
    let decay_per_level = 0.5 * (1.0 - adjusted_dampening.severity);
    let retained = (1.0 - decay_per_level).clamp(0.0, 1.0).powi(chain_depth as i32);
    (base_probability * retained).max(0.0)
}

/// `round(max(5, cause_significance * (1 - 0.1 * new_depth)))`, clamped to
/// `[5, 100]`. `new_depth` is the depth of the *consequence* event being
/// created (i.e. one more than the depth at which its cause was evaluated).
pub fn consequence_significance(cause_significance: u8, new_depth: u32) -> u8 {
    let decayed = cause_significance as f64 * (1.0 - 0.1 * new_depth as f64);
    decayed.max(5.0).round().clamp(5.0, 100.0) as u8
}

// ---------------------------------------------------------------------------
// Cross-domain transition modifier table
// ---------------------------------------------------------------------------

/// Penalty applied when a consequence crosses into a category that has no
/// entry in the transition table.
pub const UNTABLED_TRANSITION_PENALTY: f64 = 0.1;

/// Table of plausible cross-domain transition modifiers.
///
/// Open question (spec references an un-shown `cross-domain-rules.js`
/// table; see design notes): this table was authored from first
/// principles rather than ported, covering the transitions judged most
/// narratively plausible. Any pair absent from the table -- including every
/// pair not listed here -- falls back to [`UNTABLED_TRANSITION_PENALTY`].
#[derive(Debug, Default)]
pub struct TransitionModifierTable {
    modifiers: HashMap<(EventCategory, EventCategory), f64>,
}

impl TransitionModifierTable {
    /// Build the default table.
    pub fn new() -> Self {
        let mut modifiers = HashMap::new();
        let mut set = |from: EventCategory, to: EventCategory, value: f64| {
            modifiers.insert((from, to), value);
        };
        set(EventCategory::Military, EventCategory::Economic, 0.6);
        set(EventCategory::Military, EventCategory::Political, 0.7);
        set(EventCategory::Military, EventCategory::Disaster, 0.3);
        set(EventCategory::Political, EventCategory::Military, 0.6);
        set(EventCategory::Political, EventCategory::Economic, 0.5);
        set(EventCategory::Political, EventCategory::Cultural, 0.4);
        set(EventCategory::Economic, EventCategory::Political, 0.4);
        set(EventCategory::Economic, EventCategory::Personal, 0.4);
        set(EventCategory::Disaster, EventCategory::Economic, 0.7);
        set(EventCategory::Disaster, EventCategory::Religious, 0.4);
        set(EventCategory::Disaster, EventCategory::Political, 0.3);
        set(EventCategory::Religious, EventCategory::Cultural, 0.6);
        set(EventCategory::Religious, EventCategory::Political, 0.3);
        set(EventCategory::Magical, EventCategory::Disaster, 0.5);
        set(EventCategory::Magical, EventCategory::Religious, 0.4);
        set(EventCategory::Scientific, EventCategory::Magical, 0.3);
        set(EventCategory::Scientific, EventCategory::Economic, 0.4);
        set(EventCategory::Exploratory, EventCategory::Economic, 0.5);
        set(EventCategory::Exploratory, EventCategory::Cultural, 0.3);
        set(EventCategory::Cultural, EventCategory::Religious, 0.4);
        set(EventCategory::Personal, EventCategory::Cultural, 0.3);
        set(EventCategory::Personal, EventCategory::Political, 0.2);
        Self { modifiers }
    }

    /// Look up the modifier for a cause category transitioning into a
    /// consequence category. Same-category transitions always pass
    /// through unmodified; any other untabled pair gets the hard-coded
    /// penalty.
    pub fn get(&self, from: EventCategory, to: EventCategory) -> f64 {
        if from == to {
            return 1.0;
        }
        self.modifiers
            .get(&(from, to))
            .copied()
            .unwrap_or(UNTABLED_TRANSITION_PENALTY)
    }
}

// ---------------------------------------------------------------------------
// CascadeConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct CascadeConfig {
    pub max_cascade_depth: u32,
    pub probability_threshold: f64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            max_cascade_depth: 10,
            probability_threshold: 0.01,
        }
    }
}

// ---------------------------------------------------------------------------
// PendingConsequence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct PendingConsequence {
    fire_tick: u64,
    probability: f64,
    category: EventCategory,
    subtype: String,
    cause_id: EventId,
    cause_significance: u8,
    cause_participants: Vec<EntityId>,
    cause_location: Option<EntityId>,
    /// Depth at which the cause event's rules were evaluated (0 for roots).
    cause_depth: u32,
}

/// Outcome of a [`CascadeEngine::resolve_tick`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CascadeResolution {
    pub events_generated: u32,
    pub pending_count_remaining: usize,
    pub max_depth_reached: u32,
}

// ---------------------------------------------------------------------------
// CascadeEngine
// ---------------------------------------------------------------------------

/// Schedules and resolves consequence chains. Owns the pending queue and the
/// injected random source exclusively; never touches a global RNG.
pub struct CascadeEngine {
    config: CascadeConfig,
    transitions: TransitionModifierTable,
    pending: Vec<PendingConsequence>,
    random_fn: RandomFn,
}

impl CascadeEngine {
    pub fn new(config: CascadeConfig, random_fn: RandomFn) -> Self {
        Self {
            config,
            transitions: TransitionModifierTable::new(),
            pending: Vec::new(),
            random_fn,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Evaluate every consequence rule attached to `event`, scheduling
    /// surviving ones into the pending queue keyed by fire tick. Does
    /// nothing if `chain_depth` has already reached the configured ceiling.
    pub fn process_event(&mut self, event: &Event, current_tick: u64, chain_depth: u32) {
        if chain_depth >= self.config.max_cascade_depth {
            return;
        }
        for rule in &event.consequence_rules {
            if let Some(pending) = self.evaluate_rule(event, rule, current_tick, chain_depth) {
                self.pending.push(pending);
            }
        }
    }

    fn evaluate_rule(
        &self,
        event: &Event,
        rule: &ConsequenceRule,
        current_tick: u64,
        chain_depth: u32,
    ) -> Option<PendingConsequence> {
        let adjusted = adjust_dampening_for_significance(rule.dampening, event.significance);
        let mut probability = calculate_dampened_probability(rule.base_probability, adjusted, chain_depth);
        if rule.category != event.category {
            probability *= self.transitions.get(event.category, rule.category);
        }
        if probability < self.config.probability_threshold {
            return None;
        }
        let fire_tick = current_tick + rule.delay_ticks + event.temporal_offset.unwrap_or(0);
        Some(PendingConsequence {
            fire_tick,
            probability,
            category: rule.category,
            subtype: rule.subtype.clone(),
            cause_id: event.id,
            cause_significance: event.significance,
            cause_participants: event.participants.clone(),
            cause_location: event.location,
            cause_depth: chain_depth,
        })
    }

    /// Fire every pending consequence whose `fire_tick <= current_tick`,
    /// rolling, creating, linking, emitting, logging, and recursing as
    /// described in the cascade contract. Loops until no newly-due item
    /// remains (covers zero-delay consequences fired mid-resolution).
    pub fn resolve_tick(
        &mut self,
        current_tick: u64,
        log: &mut EventLog,
        bus: &mut EventBus,
        id_alloc: &mut EventIdAllocator,
    ) -> CascadeResolution {
        let mut result = CascadeResolution::default();
        loop {
            let due_indices: Vec<usize> = self
                .pending
                .iter()
                .enumerate()
                .filter(|(_, p)| p.fire_tick <= current_tick)
                .map(|(i, _)| i)
                .collect();
            if due_indices.is_empty() {
                break;
            }
            let mut due = Vec::with_capacity(due_indices.len());
            for &idx in due_indices.iter().rev() {
                due.push(self.pending.remove(idx));
            }
            due.reverse();

            for item in due {
                let roll = (self.random_fn)();
                if roll >= item.probability {
                    continue;
                }
                let new_depth = item.cause_depth + 1;
                let significance = consequence_significance(item.cause_significance, new_depth);
                let new_id = id_alloc.allocate();

                let mut builder = EventBuilder::new(item.category, item.subtype.clone(), current_tick)
                    .participants(item.cause_participants.clone())
                    .causes(vec![item.cause_id])
                    .significance(significance);
                if let Some(location) = item.cause_location {
                    builder = builder.location(location);
                }
                let new_event = builder.build(new_id);

                if let Some(cause_event) = log.get_by_id_mut(item.cause_id) {
                    cause_event.link_consequence(new_id);
                }
                bus.emit(&new_event);
                log.append(new_event.clone());

                result.events_generated += 1;
                result.max_depth_reached = result.max_depth_reached.max(new_depth);

                self.process_event(&new_event, current_tick, new_depth);
            }
        }
        result.pending_count_remaining = self.pending.len();
        result
    }
}
