//! Event records and consequence rules.

use std::collections::HashMap;

use chronicle_ecs::prelude::EntityId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EventId
// ---------------------------------------------------------------------------

/// Globally unique, monotonically increasing event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(u64);

impl EventId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// Hands out monotonically increasing [`EventId`]s, mirroring the entity
/// allocator's never-recycled contract.
#[derive(Debug, Default)]
pub struct EventIdAllocator {
    next: u64,
}

impl EventIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// EventCategory
// ---------------------------------------------------------------------------

/// Closed tag set for event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Political,
    Military,
    Magical,
    Cultural,
    Religious,
    Scientific,
    Personal,
    Exploratory,
    Economic,
    Disaster,
}

impl EventCategory {
    /// All categories, in declaration order -- used to build the
    /// cross-domain transition modifier table exhaustively.
    pub const ALL: [EventCategory; 10] = [
        EventCategory::Political,
        EventCategory::Military,
        EventCategory::Magical,
        EventCategory::Cultural,
        EventCategory::Religious,
        EventCategory::Scientific,
        EventCategory::Personal,
        EventCategory::Exploratory,
        EventCategory::Economic,
        EventCategory::Disaster,
    ];
}

// ---------------------------------------------------------------------------
// DampeningProfile
// ---------------------------------------------------------------------------

/// A consequence rule's dampening profile: how quickly its probability
/// decays as cascade depth increases.
///
/// `severity` is a 0-1 knob: higher severity means the rule represents a
/// weightier kind of consequence and decays more gently with depth (see
/// [`crate::cascade::adjust_dampening_for_significance`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DampeningProfile {
    pub severity: f64,
}

impl DampeningProfile {
    pub fn new(severity: f64) -> Self {
        Self {
            severity: severity.clamp(0.0, 1.0),
        }
    }
}

// ---------------------------------------------------------------------------
// ConsequenceRule
// ---------------------------------------------------------------------------

/// A rule attached to an event describing one possible consequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsequenceRule {
    pub category: EventCategory,
    pub subtype: String,
    pub base_probability: f64,
    pub dampening: DampeningProfile,
    pub delay_ticks: u64,
}

impl ConsequenceRule {
    pub fn new(
        category: EventCategory,
        subtype: impl Into<String>,
        base_probability: f64,
        dampening: DampeningProfile,
        delay_ticks: u64,
    ) -> Self {
        Self {
            category,
            subtype: subtype.into(),
            base_probability: base_probability.clamp(0.0, 1.0),
            dampening,
            delay_ticks,
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// An immutable record of something that happened in the simulation.
///
/// `causes` is fixed at creation; `consequences` grows over time as the
/// cascade engine fires rules attached to this event, via
/// [`Event::link_consequence`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub category: EventCategory,
    pub subtype: String,
    pub timestamp: u64,
    pub participants: Vec<EntityId>,
    pub causes: Vec<EventId>,
    pub consequences: Vec<EventId>,
    pub data: HashMap<String, serde_json::Value>,
    pub significance: u8,
    pub location: Option<EntityId>,
    pub temporal_offset: Option<u64>,
    pub consequence_rules: Vec<ConsequenceRule>,
}

impl Event {
    /// Record that `consequence` was fired as a result of this event.
    pub fn link_consequence(&mut self, consequence: EventId) {
        self.consequences.push(consequence);
    }
}

/// Builder for constructing [`Event`]s without threading every field through
/// a constructor call.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    category: EventCategory,
    subtype: String,
    timestamp: u64,
    participants: Vec<EntityId>,
    causes: Vec<EventId>,
    data: HashMap<String, serde_json::Value>,
    significance: u8,
    location: Option<EntityId>,
    temporal_offset: Option<u64>,
    consequence_rules: Vec<ConsequenceRule>,
}

impl EventBuilder {
    pub fn new(category: EventCategory, subtype: impl Into<String>, timestamp: u64) -> Self {
        Self {
            category,
            subtype: subtype.into(),
            timestamp,
            participants: Vec::new(),
            causes: Vec::new(),
            data: HashMap::new(),
            significance: 0,
            location: None,
            temporal_offset: None,
            consequence_rules: Vec::new(),
        }
    }

    pub fn participants(mut self, participants: Vec<EntityId>) -> Self {
        self.participants = participants;
        self
    }

    pub fn causes(mut self, causes: Vec<EventId>) -> Self {
        self.causes = causes;
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn significance(mut self, significance: u8) -> Self {
        self.significance = significance.min(100);
        self
    }

    pub fn location(mut self, location: EntityId) -> Self {
        self.location = Some(location);
        self
    }

    pub fn temporal_offset(mut self, offset: u64) -> Self {
        self.temporal_offset = Some(offset);
        self
    }

    pub fn consequence_rules(mut self, rules: Vec<ConsequenceRule>) -> Self {
        self.consequence_rules = rules;
        self
    }

    pub fn build(self, id: EventId) -> Event {
        Event {
            id,
            category: self.category,
            subtype: self.subtype,
            timestamp: self.timestamp,
            participants: self.participants,
            causes: self.causes,
            consequences: Vec::new(),
            data: self.data,
            significance: self.significance,
            location: self.location,
            temporal_offset: self.temporal_offset,
            consequence_rules: self.consequence_rules,
        }
    }
}
