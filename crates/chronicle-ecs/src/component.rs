//! Component type registration and type-erased per-type storage.
//!
//! The core models components the "duck-typed" way the source system does:
//! a type-keyed heterogeneous registry rather than an archetype/SoA layout.
//! Every component type gets its own sparse store, keyed by [`EntityId`];
//! queries downcast through a type-erased [`AnyStore`] trait object rather
//! than packing components into shared archetype rows.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Opaque token identifying a registered component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub(crate) u32);

// ---------------------------------------------------------------------------
// AnyStore -- type-erased per-type component store
// ---------------------------------------------------------------------------

/// Type-erased operations common to every per-type component store.
///
/// Typed access (`get::<T>`, `add::<T>`, ...) lives on [`crate::world::World`]
/// and downcasts through [`as_any`](AnyStore::as_any) /
/// [`as_any_mut`](AnyStore::as_any_mut); this trait only carries the
/// operations that don't need to know `T`.
pub trait AnyStore: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Remove `entity`'s component, if present. No-op, not an error, if
    /// absent.
    fn remove_untyped(&mut self, entity: EntityId) -> bool;
    /// Whether `entity` has a component in this store.
    fn contains(&self, entity: EntityId) -> bool;
    /// Number of entities with a component in this store.
    fn len(&self) -> usize;
    /// All entity keys currently present, in unspecified (store-internal)
    /// order.
    fn keys(&self) -> Vec<EntityId>;
    /// Deep-clone this store behind a fresh box. Backs snapshot capture.
    fn clone_box(&self) -> Box<dyn AnyStore>;
}

/// Sparse, per-component-type store: `EntityId -> T`.
#[derive(Debug, Default, Clone)]
pub struct TypedStore<T> {
    data: HashMap<EntityId, T>,
}

impl<T> TypedStore<T> {
    fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.data.get(&entity)
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.data.get_mut(&entity)
    }

    /// Insert or overwrite `entity`'s component. Overwriting an existing
    /// component is a normal, silent operation (not an error).
    pub fn insert(&mut self, entity: EntityId, value: T) {
        self.data.insert(entity, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.data.iter().map(|(&id, v)| (id, v))
    }
}

impl<T: Clone + fmt::Debug + Send + Sync + 'static> AnyStore for TypedStore<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_untyped(&mut self, entity: EntityId) -> bool {
        self.data.remove(&entity).is_some()
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.data.contains_key(&entity)
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn keys(&self) -> Vec<EntityId> {
        self.data.keys().copied().collect()
    }

    fn clone_box(&self) -> Box<dyn AnyStore> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Maps Rust component types to their registered [`ComponentTypeId`] and
/// human-readable name.
///
/// Registration is idempotent: registering an already-registered type
/// returns the existing ID and does not create a second store.
#[derive(Debug, Default, Clone)]
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentTypeId>,
    names: Vec<String>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component type under `name`, returning its ID. If `T` is
    /// already registered, returns the existing ID (idempotent) and ignores
    /// `name`.
    pub fn register<T: 'static>(&mut self, name: &str) -> ComponentTypeId {
        let type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return existing;
        }
        let id = ComponentTypeId(self.names.len() as u32);
        self.names.push(name.to_owned());
        self.by_type.insert(type_id, id);
        id
    }

    pub fn lookup<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    pub fn name_of(&self, id: ComponentTypeId) -> Option<&str> {
        self.names.get(id.0 as usize).map(|s| s.as_str())
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    pub fn registered_names(&self) -> Vec<&str> {
        self.names.iter().map(|s| s.as_str()).collect()
    }
}
