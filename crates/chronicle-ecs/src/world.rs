//! The [`World`]: owns entity lifecycle and every registered component
//! store, and exposes the query façade described by the core's data model.

use crate::component::{AnyStore, ComponentRegistry, ComponentTypeId, TypedStore};
use crate::entity::{EntityAllocator, EntityId};
use crate::EcsError;

/// The entity-component-system façade.
///
/// Systems must reach components through `World` methods rather than
/// caching references across tick boundaries -- the core gives no guarantee
/// that a reference taken in one tick stays valid into the next.
#[derive(Default)]
pub struct World {
    allocator: EntityAllocator,
    registry: ComponentRegistry,
    stores: Vec<Box<dyn AnyStore>>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("alive_count", &self.allocator.alive_count())
            .field("component_types", &self.registry.registered_names())
            .finish()
    }
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // -- entity lifecycle ----------------------------------------------

    /// Create a fresh entity, strictly greater than every previously
    /// allocated ID.
    pub fn create_entity(&mut self) -> EntityId {
        self.allocator.allocate()
    }

    /// Destroy `entity`: removes it from every registered store, then from
    /// the alive set, as one logical step. Destroying an unknown or
    /// already-destroyed ID is a no-op, not an error.
    pub fn destroy_entity(&mut self, entity: EntityId) {
        if !self.allocator.is_alive(entity) {
            return;
        }
        for store in &mut self.stores {
            store.remove_untyped(entity);
        }
        self.allocator.destroy(entity);
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity)
    }

    /// All alive entities. Order is the allocator's internal order
    /// (ascending by ID) but callers should treat it as unordered per the
    /// query contract.
    pub fn all_alive(&self) -> Vec<EntityId> {
        self.allocator.all_alive()
    }

    pub fn alive_count(&self) -> usize {
        self.allocator.alive_count()
    }

    pub fn max_entity_id(&self) -> Option<EntityId> {
        self.allocator.max_allocated()
    }

    // -- component registration -----------------------------------------

    /// Register a component type under `name`. Idempotent: re-registering
    /// returns the existing store's ID without creating a second store.
    pub fn register_component<T>(&mut self, name: &str) -> ComponentTypeId
    where
        T: Clone + std::fmt::Debug + Send + Sync + 'static,
    {
        if let Some(id) = self.registry.lookup::<T>() {
            return id;
        }
        let id = self.registry.register::<T>(name);
        debug_assert_eq!(id.0 as usize, self.stores.len());
        self.stores.push(Box::new(TypedStore::<T>::default()));
        id
    }

    pub fn component_type_id<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.registry.lookup::<T>()
    }

    /// Look up a registered store by type, failing with
    /// [`EcsError::UnknownComponentType`] if `T` was never registered.
    pub fn store<T: 'static>(&self) -> Result<&TypedStore<T>, EcsError> {
        let id = self
            .registry
            .lookup::<T>()
            .ok_or_else(|| self.unknown_component_error::<T>())?;
        Ok(self.stores[id.0 as usize]
            .as_any()
            .downcast_ref::<TypedStore<T>>()
            .expect("registry/store type mismatch"))
    }

    fn unknown_component_error<T: 'static>(&self) -> EcsError {
        EcsError::UnknownComponentType {
            name: std::any::type_name::<T>().to_owned(),
            registered: self.registry.registered_names().join(", "),
        }
    }

    // -- single-entity component ops -------------------------------------

    /// Add (or overwrite) `entity`'s component of type `T`. Fails with
    /// [`EcsError::UnknownComponentType`] if `T` was never registered.
    pub fn add_component<T>(&mut self, entity: EntityId, value: T) -> Result<(), EcsError>
    where
        T: Clone + std::fmt::Debug + Send + Sync + 'static,
    {
        let id = self
            .registry
            .lookup::<T>()
            .ok_or_else(|| self.unknown_component_error::<T>())?;
        let store = self.stores[id.0 as usize]
            .as_any_mut()
            .downcast_mut::<TypedStore<T>>()
            .expect("registry/store type mismatch");
        store.insert(entity, value);
        Ok(())
    }

    /// Get `entity`'s component of type `T`. Returns `None` for an
    /// unregistered type, a missing component, or a dead entity -- absence
    /// is not an error for reads.
    pub fn get_component<T: 'static>(&self, entity: EntityId) -> Option<&T> {
        let id = self.registry.lookup::<T>()?;
        self.stores[id.0 as usize]
            .as_any()
            .downcast_ref::<TypedStore<T>>()
            .expect("registry/store type mismatch")
            .get(entity)
    }

    pub fn get_component_mut<T: 'static>(&mut self, entity: EntityId) -> Option<&mut T> {
        let id = self.registry.lookup::<T>()?;
        self.stores[id.0 as usize]
            .as_any_mut()
            .downcast_mut::<TypedStore<T>>()
            .expect("registry/store type mismatch")
            .get_mut(entity)
    }

    pub fn has_component<T: 'static>(&self, entity: EntityId) -> bool {
        match self.registry.lookup::<T>() {
            Some(id) => self.stores[id.0 as usize].contains(entity),
            None => false,
        }
    }

    /// Remove `entity`'s component of type `T`, if present. No-op if
    /// absent or the type is unregistered.
    pub fn remove_component<T: 'static>(&mut self, entity: EntityId) {
        if let Some(id) = self.registry.lookup::<T>() {
            self.stores[id.0 as usize].remove_untyped(entity);
        }
    }

    // -- multi-component query --------------------------------------------

    /// Alive entities possessing every listed component type.
    ///
    /// An empty `types` list returns every alive entity. Any unregistered
    /// type makes the whole query return empty (rather than erroring).
    /// Internally, the smallest matching store drives iteration; the other
    /// stores are only consulted for membership, and liveness is checked
    /// against the allocator.
    pub fn query(&self, types: &[ComponentTypeId]) -> Vec<EntityId> {
        if types.is_empty() {
            return self.all_alive();
        }
        for &t in types {
            if t.0 as usize >= self.stores.len() {
                return Vec::new();
            }
        }

        let driver = types
            .iter()
            .min_by_key(|&&t| self.stores[t.0 as usize].len())
            .copied()
            .expect("types is non-empty");

        self.stores[driver.0 as usize]
            .keys()
            .into_iter()
            .filter(|&entity| {
                self.allocator.is_alive(entity)
                    && types
                        .iter()
                        .all(|&t| self.stores[t.0 as usize].contains(entity))
            })
            .collect()
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // -- snapshot support --------------------------------------------------

    /// Registered component type names, in registration order. Used to
    /// validate a snapshot's component set against a fresh world's before
    /// restoring into it.
    pub fn registered_type_names(&self) -> Vec<String> {
        self.registry.registered_names().into_iter().map(str::to_owned).collect()
    }

    /// Deep-clone every component store, in registration order. The clones
    /// share no state with this world's stores.
    pub fn clone_component_stores(&self) -> Vec<Box<dyn AnyStore>> {
        self.stores.iter().map(|store| store.clone_box()).collect()
    }

    /// Replace this world's component stores wholesale. Callers must ensure
    /// `stores` was produced for a world with the same registered component
    /// types, in the same order -- [`World::registered_type_names`] is the
    /// contract the snapshot manager checks before calling this.
    pub fn replace_component_stores(&mut self, stores: Vec<Box<dyn AnyStore>>) {
        self.stores = stores;
    }

    /// Replace the entity allocator with one reconstructed from a dense
    /// snapshot (see [`EntityAllocator::restore_dense`]).
    pub fn restore_entities(&mut self, max_entity_id: Option<EntityId>, alive_entities: &[EntityId]) {
        self.allocator = EntityAllocator::restore_dense(max_entity_id, alive_entities);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        dx: f32,
    }

    fn setup() -> World {
        let mut world = World::new();
        world.register_component::<Position>("position");
        world.register_component::<Velocity>("velocity");
        world
    }

    #[test]
    fn register_component_is_idempotent() {
        let mut world = World::new();
        let a = world.register_component::<Position>("position");
        let b = world.register_component::<Position>("position-again");
        assert_eq!(a, b);
    }

    #[test]
    fn get_store_unregistered_errors() {
        let world = World::new();
        let err = world.store::<Position>().unwrap_err();
        assert!(matches!(err, EcsError::UnknownComponentType { .. }));
    }

    #[test]
    fn add_component_unregistered_errors_but_get_has_are_absent() {
        let mut world = World::new();
        let e = world.create_entity();
        assert_eq!(world.get_component::<Position>(e), None);
        assert!(!world.has_component::<Position>(e));
        let err = world.add_component(e, Position { x: 0.0, y: 0.0 }).unwrap_err();
        assert!(matches!(err, EcsError::UnknownComponentType { .. }));
    }

    #[test]
    fn destroy_entity_removes_from_all_stores() {
        let mut world = setup();
        let e = world.create_entity();
        world.add_component(e, Position { x: 1.0, y: 2.0 }).unwrap();
        world.add_component(e, Velocity { dx: 3.0 }).unwrap();
        world.destroy_entity(e);
        assert!(!world.is_alive(e));
        assert_eq!(world.get_component::<Position>(e), None);
        assert_eq!(world.get_component::<Velocity>(e), None);
    }

    #[test]
    fn destroy_already_destroyed_is_no_op() {
        let mut world = setup();
        let e = world.create_entity();
        world.destroy_entity(e);
        world.destroy_entity(e); // must not panic
        assert!(!world.is_alive(e));
    }

    #[test]
    fn remove_absent_component_is_no_op() {
        let mut world = setup();
        let e = world.create_entity();
        world.remove_component::<Position>(e); // no panic, no error
    }

    #[test]
    fn three_entities_one_destroyed() {
        let mut world = World::new();
        let a = world.create_entity();
        let b = world.create_entity();
        let c = world.create_entity();
        world.destroy_entity(b);
        let mut alive = world.all_alive();
        alive.sort();
        assert_eq!(alive, vec![a, c]);
        assert!(!world.is_alive(b));
        let next = world.create_entity();
        assert_eq!(next.to_raw(), 3);
    }

    #[test]
    fn query_empty_types_returns_all_alive() {
        let mut world = setup();
        let a = world.create_entity();
        let b = world.create_entity();
        let mut results = world.query(&[]);
        results.sort();
        assert_eq!(results, vec![a, b]);
    }

    #[test]
    fn query_matching_only_entities_with_all_types() {
        let mut world = setup();
        let e1 = world.create_entity();
        world.add_component(e1, Position { x: 1.0, y: 2.0 }).unwrap();
        world.add_component(e1, Velocity { dx: 3.0 }).unwrap();

        let e2 = world.create_entity();
        world.add_component(e2, Position { x: 10.0, y: 20.0 }).unwrap();

        let pos_id = world.component_type_id::<Position>().unwrap();
        let vel_id = world.component_type_id::<Velocity>().unwrap();
        let results = world.query(&[pos_id, vel_id]);
        assert_eq!(results, vec![e1]);
    }

    #[test]
    fn query_unregistered_type_returns_empty() {
        let world = World::new();
        let bogus = ComponentTypeId(999);
        assert_eq!(world.query(&[bogus]), Vec::new());
    }

    #[test]
    fn query_ignores_dead_entities() {
        let mut world = setup();
        let e1 = world.create_entity();
        world.add_component(e1, Position { x: 0.0, y: 0.0 }).unwrap();
        world.destroy_entity(e1);
        let pos_id = world.component_type_id::<Position>().unwrap();
        assert_eq!(world.query(&[pos_id]), Vec::new());
    }

    #[test]
    fn overwriting_component_is_not_an_error() {
        let mut world = setup();
        let e = world.create_entity();
        world.add_component(e, Position { x: 1.0, y: 1.0 }).unwrap();
        world.add_component(e, Position { x: 2.0, y: 2.0 }).unwrap();
        assert_eq!(world.get_component::<Position>(e), Some(&Position { x: 2.0, y: 2.0 }));
    }
}
