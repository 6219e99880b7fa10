//! Headless demo -- builds a bare simulation engine, registers one system
//! that emits an occasional event, and runs it for a fixed number of ticks
//! with structured logging enabled.
//!
//! Run with:
//!   cargo run --example headless_run -p chronicle-engine

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chronicle_ecs::prelude::World;
use chronicle_events::prelude::{CascadeConfig, CascadeEngine, EventBuilder, EventCategory, EventId, EventBus};
use chronicle_engine::prelude::*;

struct HeartbeatSystem;

impl System for HeartbeatSystem {
    fn name(&self) -> &str {
        "heartbeat"
    }

    fn frequency(&self) -> Frequency {
        Frequency::Weekly
    }

    fn priority(&self) -> i32 {
        priority::NARRATIVE_GENERATION
    }

    fn execute(&mut self, _world: &mut chronicle_ecs::world::World, clock: &WorldClock, bus: &mut EventBus) -> Result<()> {
        let event = EventBuilder::new(EventCategory::Personal, "heartbeat.tick", clock.tick())
            .significance(5)
            .build(EventId::from_raw(clock.tick()));
        bus.emit(&event);
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("chronicle engine headless demo starting");

    let cascade = CascadeEngine::new(CascadeConfig::default(), Box::new(|| 0.5));
    let mut engine = SimulationEngine::new(World::new(), WorldClock::new(360), cascade);
    engine.register_system(Box::new(HeartbeatSystem))?;
    engine.add_listener(|tick, events| {
        if !events.is_empty() {
            info!(tick, count = events.len(), "events emitted");
        }
    });

    let reports = engine.run(21);
    let total_events: usize = reports.iter().map(|r| r.events_captured).sum();
    info!(ticks = reports.len(), total_events, "demo run complete");

    Ok(())
}
