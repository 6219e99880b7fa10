//! Chronicle Events -- the event bus, event log, and cascade/consequence
//! engine. Built around an immutable, causally-linked [`event::Event`]
//! record and a single-threaded, deterministically-seeded cascade engine.

#![deny(unsafe_code)]

pub mod bus;
pub mod cascade;
pub mod event;
pub mod log;

pub mod prelude {
    pub use crate::bus::{EventBus, HandlerFailure, SubscriptionId};
    pub use crate::cascade::{
        CascadeConfig, CascadeEngine, CascadeResolution, RandomFn, TransitionModifierTable,
    };
    pub use crate::event::{
        ConsequenceRule, DampeningProfile, Event, EventBuilder, EventCategory, EventId,
        EventIdAllocator,
    };
    pub use crate::log::EventLog;
}
