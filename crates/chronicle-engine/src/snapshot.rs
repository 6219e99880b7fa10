//! Snapshot manager: point-in-time capture and restore of a world, its
//! clock, and its event log.
//!
//! A snapshot deep-clones every component store and the full event list, so
//! it shares no mutable state with its source -- mutating the world after
//! taking a snapshot never reaches back into the captured copy, and
//! restoring the same snapshot twice produces two independent worlds.

use std::time::SystemTime;

use chronicle_ecs::component::AnyStore;
use chronicle_ecs::prelude::EntityId;
use chronicle_ecs::world::World;
use chronicle_events::prelude::{Event, EventLog};

use crate::clock::WorldClock;
use crate::EngineError;

/// A captured, self-contained copy of simulation state at one tick.
pub struct Snapshot {
    pub id: u64,
    pub label: String,
    pub tick: u64,
    pub alive_entities: Vec<EntityId>,
    pub max_entity_id: Option<EntityId>,
    component_type_names: Vec<String>,
    component_stores: Vec<Box<dyn AnyStore>>,
    pub events: Vec<Event>,
    pub created_at: SystemTime,
    /// BLAKE3 hex digest over tick, alive-set and event log. Component
    /// stores are not hashed -- they are type-erased and not all component
    /// types are required to be `Serialize`. Two snapshots with the same
    /// fingerprint are not guaranteed identical component-wise, but a
    /// differing fingerprint proves the world diverged.
    pub fingerprint: String,
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("tick", &self.tick)
            .field("alive_entities", &self.alive_entities.len())
            .field("component_types", &self.component_type_names)
            .field("events", &self.events.len())
            .finish()
    }
}

/// Compute the BLAKE3 hex digest of the hashable parts of a snapshot: the
/// tick, the sorted alive-set, and the event log, serialized as canonical
/// JSON. Used as a cheap "did this diverge" check between two runs, not as
/// proof of full world equality.
fn compute_fingerprint(tick: u64, alive_entities: &[EntityId], events: &[Event]) -> String {
    #[derive(serde::Serialize)]
    struct HashableState<'a> {
        tick: u64,
        alive_entities: &'a [EntityId],
        events: &'a [Event],
    }

    let hashable = HashableState {
        tick,
        alive_entities,
        events,
    };
    let json_bytes = serde_json::to_vec(&hashable).expect("snapshot state is always JSON-serializable");
    blake3::hash(&json_bytes).to_hex().to_string()
}

/// Issues snapshot IDs and performs capture/restore.
#[derive(Debug, Default)]
pub struct SnapshotManager {
    next_id: u64,
}

impl SnapshotManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture `world`, `clock`, and `log` into a new, independent
    /// [`Snapshot`].
    pub fn snapshot(
        &mut self,
        world: &World,
        clock: &WorldClock,
        log: &EventLog,
        label: impl Into<String>,
    ) -> Snapshot {
        let mut alive_entities = world.all_alive();
        alive_entities.sort();
        let events = log.get_all().to_vec();
        let fingerprint = compute_fingerprint(clock.tick(), &alive_entities, &events);

        let id = self.next_id;
        self.next_id += 1;
        Snapshot {
            id,
            label: label.into(),
            tick: clock.tick(),
            alive_entities,
            max_entity_id: world.max_entity_id(),
            component_type_names: world.registered_type_names(),
            component_stores: world.clone_component_stores(),
            events,
            created_at: SystemTime::now(),
            fingerprint,
        }
    }

    /// Restore `snapshot` into `world`/`clock`/`log`, which must already have
    /// the same component types registered, in the same order, as the world
    /// the snapshot was taken from (callers know their component types at
    /// compile time and register them before restoring, exactly as they did
    /// before taking the snapshot).
    ///
    /// Validates the component-type set before mutating anything: on
    /// mismatch, returns [`EngineError::SnapshotMismatch`] and leaves
    /// `world`/`clock`/`log` untouched.
    pub fn restore(
        &self,
        snapshot: &Snapshot,
        world: &mut World,
        clock: &mut WorldClock,
        log: &mut EventLog,
    ) -> Result<(), EngineError> {
        let current_names = world.registered_type_names();
        if current_names != snapshot.component_type_names {
            return Err(EngineError::SnapshotMismatch {
                reason: format!(
                    "registered component types differ: world has [{}], snapshot has [{}]",
                    current_names.join(", "),
                    snapshot.component_type_names.join(", "),
                ),
            });
        }

        clock.set_tick(snapshot.tick);
        world.restore_entities(snapshot.max_entity_id, &snapshot.alive_entities);
        let restored_stores = snapshot.component_stores.iter().map(|s| s.clone_box()).collect();
        world.replace_component_stores(restored_stores);

        *log = EventLog::new();
        for event in &snapshot.events {
            log.append(event.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_events::prelude::{EventBuilder, EventCategory, EventId};

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);

    fn populated_world() -> World {
        let mut world = World::new();
        world.register_component::<Health>("health");
        let a = world.create_entity();
        let b = world.create_entity();
        let c = world.create_entity();
        world.add_component(a, Health(100)).unwrap();
        world.add_component(b, Health(50)).unwrap();
        world.add_component(c, Health(10)).unwrap();
        world.destroy_entity(b);
        world
    }

    #[test]
    fn snapshot_restore_roundtrip_preserves_entities_and_components() {
        let world = populated_world();
        let mut clock = WorldClock::new(360);
        clock.set_tick(42);
        let mut log = EventLog::new();
        log.append(
            EventBuilder::new(EventCategory::Personal, "test", 42)
                .significance(10)
                .build(EventId::from_raw(0)),
        );

        let mut manager = SnapshotManager::new();
        let snap = manager.snapshot(&world, &clock, &log, "checkpoint");

        let mut restored_world = World::new();
        restored_world.register_component::<Health>("health");
        let mut restored_clock = WorldClock::new(360);
        let mut restored_log = EventLog::new();

        manager.restore(&snap, &mut restored_world, &mut restored_clock, &mut restored_log).unwrap();

        assert_eq!(restored_clock.tick(), 42);
        let mut alive = restored_world.all_alive();
        alive.sort();
        let mut expected = world.all_alive();
        expected.sort();
        assert_eq!(alive, expected);
        for &e in &alive {
            assert_eq!(restored_world.get_component::<Health>(e), world.get_component::<Health>(e));
        }
        assert_eq!(restored_log.count(), 1);
    }

    #[test]
    fn fingerprint_is_stable_for_identical_state_and_differs_after_a_new_event() {
        let world = populated_world();
        let mut clock = WorldClock::new(360);
        clock.set_tick(5);
        let log = EventLog::new();
        let mut manager = SnapshotManager::new();

        let first = manager.snapshot(&world, &clock, &log, "a");
        let second = manager.snapshot(&world, &clock, &log, "b");
        assert_eq!(first.fingerprint, second.fingerprint, "same tick/entities/events must hash identically");

        let mut log_with_event = EventLog::new();
        log_with_event.append(
            EventBuilder::new(EventCategory::Economic, "trade", 5)
                .significance(20)
                .build(EventId::from_raw(0)),
        );
        let third = manager.snapshot(&world, &clock, &log_with_event, "c");
        assert_ne!(first.fingerprint, third.fingerprint);
    }

    #[test]
    fn restore_is_independent_of_source_snapshot() {
        let world = populated_world();
        let clock = WorldClock::new(360);
        let log = EventLog::new();
        let mut manager = SnapshotManager::new();
        let snap = manager.snapshot(&world, &clock, &log, "base");

        let mut restored_world = World::new();
        restored_world.register_component::<Health>("health");
        let mut restored_clock = WorldClock::new(360);
        let mut restored_log = EventLog::new();
        manager.restore(&snap, &mut restored_world, &mut restored_clock, &mut restored_log).unwrap();

        let extra = restored_world.create_entity();
        restored_world.add_component(extra, Health(1)).unwrap();

        // Mutating the restored world must not reach back into the snapshot.
        let mut restored_world_2 = World::new();
        restored_world_2.register_component::<Health>("health");
        let mut restored_clock_2 = WorldClock::new(360);
        let mut restored_log_2 = EventLog::new();
        manager.restore(&snap, &mut restored_world_2, &mut restored_clock_2, &mut restored_log_2).unwrap();
        assert!(!restored_world_2.is_alive(extra));
    }

    #[test]
    fn mismatched_component_types_rejected_without_mutating_target() {
        let world = populated_world();
        let clock = WorldClock::new(360);
        let log = EventLog::new();
        let mut manager = SnapshotManager::new();
        let snap = manager.snapshot(&world, &clock, &log, "base");

        let mut bare_world = World::new(); // no "health" registered
        let mut bare_clock = WorldClock::new(360);
        bare_clock.set_tick(7);
        let mut bare_log = EventLog::new();

        let err = manager.restore(&snap, &mut bare_world, &mut bare_clock, &mut bare_log).unwrap_err();
        assert!(matches!(err, EngineError::SnapshotMismatch { .. }));
        assert_eq!(bare_clock.tick(), 7, "failed restore must not mutate the target clock");
        assert_eq!(bare_world.alive_count(), 0);
    }
}
