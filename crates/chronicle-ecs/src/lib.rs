//! Chronicle ECS -- entity-component-system substrate for the simulation
//! core: stably-identified entities, type-keyed sparse component stores, and
//! the deterministic RNG every other subsystem is seeded from.
//!
//! Entities are never recycled (see [`entity::EntityAllocator`]), and
//! components are stored one sparse map per type (see [`component`]) rather
//! than in archetypes -- a deliberate departure from a SoA layout, chosen
//! because the simulation's component set per entity is highly irregular
//! (a `Character` might carry a dozen components; a `Site` three).
//!
//! # Quick Start
//!
//! ```
//! use chronicle_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! let mut world = World::new();
//! world.register_component::<Position>("position");
//! let entity = world.create_entity();
//! world.add_component(entity, Position { x: 0.0, y: 0.0 }).unwrap();
//! assert_eq!(world.get_component::<Position>(entity), Some(&Position { x: 0.0, y: 0.0 }));
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod rng;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// A component type was referenced that has not been registered.
    #[error("component type '{name}' not registered. Registered: [{registered}]")]
    UnknownComponentType { name: String, registered: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::component::{ComponentRegistry, ComponentTypeId};
    pub use crate::entity::{Brand, EntityAllocator, EntityId, TypedId};
    pub use crate::rng::{SimRng, SimplexNoise2D};
    pub use crate::world::World;
    pub use crate::EcsError;
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);

    #[test]
    fn end_to_end_spawn_query_destroy() {
        let mut world = World::new();
        world.register_component::<Health>("health");

        let e1 = world.create_entity();
        let e2 = world.create_entity();
        world.add_component(e1, Health(100)).unwrap();
        world.add_component(e2, Health(50)).unwrap();

        let health_id = world.component_type_id::<Health>().unwrap();
        let mut results = world.query(&[health_id]);
        results.sort();
        assert_eq!(results, vec![e1, e2]);

        world.destroy_entity(e1);
        assert_eq!(world.query(&[health_id]), vec![e2]);
        assert_eq!(world.get_component::<Health>(e1), None);
    }
}
