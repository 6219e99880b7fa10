//! Entity identifiers and allocation.
//!
//! An [`EntityId`] is an opaque, monotonically increasing integer handle.
//! Unlike a generational allocator, indices are never recycled: once an ID is
//! assigned it is never reused, even after the entity is destroyed. This
//! trades the compactness of recycling for a simpler invariant that snapshot
//! restore depends on: the ID space assigned by a world is always dense and
//! gap-free up to `maxEntityId`, and "ghost" (destroyed) IDs can be
//! reconstructed exactly by replaying allocation followed by destruction.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A monotonic, never-recycled entity identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Construct an `EntityId` directly from its raw value.
    ///
    /// Intended for snapshot restore, where IDs must be replayed exactly.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer value of this ID.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Allocates monotonically increasing [`EntityId`]s and tracks which are
/// currently alive.
///
/// There is no free-list: a destroyed index is never handed out again. The
/// `alive` bitset is indexed by the same counter as allocation, so restoring
/// a snapshot can recreate the exact allocator state by allocating
/// `0..=maxEntityId` and then destroying the non-alive indices.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// Number of IDs ever allocated; also the next raw value to hand out.
    next: u64,
    /// Whether the entity at a given raw index is currently alive.
    alive: Vec<bool>,
}

impl EntityAllocator {
    /// Create a new, empty allocator.
    pub fn new() -> Self {
        Self {
            next: 0,
            alive: Vec::new(),
        }
    }

    /// Allocate a fresh [`EntityId`], strictly greater than every ID
    /// previously allocated by this allocator.
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        self.alive.push(true);
        id
    }

    /// Mark `id` as destroyed. Returns `true` if it was alive and is now
    /// destroyed; `false` if it was already destroyed or never allocated
    /// (both are treated as no-ops, per the core's error-handling contract).
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let idx = id.to_raw() as usize;
        match self.alive.get_mut(idx) {
            Some(alive @ true) => {
                *alive = false;
                true
            }
            _ => false,
        }
    }

    /// Whether `id` refers to a currently alive entity.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.alive
            .get(id.to_raw() as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Every currently alive ID, in ascending order.
    pub fn all_alive(&self) -> Vec<EntityId> {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, &alive)| alive)
            .map(|(idx, _)| EntityId(idx as u64))
            .collect()
    }

    /// Number of currently alive entities.
    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }

    /// The highest raw ID ever allocated, or `None` if none have been.
    pub fn max_allocated(&self) -> Option<EntityId> {
        if self.next == 0 {
            None
        } else {
            Some(EntityId(self.next - 1))
        }
    }

    /// Reconstruct an allocator from a dense snapshot: allocate IDs
    /// `0..=max_entity_id` in order, then destroy every index not present in
    /// `alive_entities`.
    pub fn restore_dense(max_entity_id: Option<EntityId>, alive_entities: &[EntityId]) -> Self {
        let mut allocator = Self::new();
        if let Some(max_id) = max_entity_id {
            for _ in 0..=max_id.to_raw() {
                allocator.allocate();
            }
            let alive: std::collections::HashSet<EntityId> = alive_entities.iter().copied().collect();
            for idx in 0..=max_id.to_raw() {
                let id = EntityId(idx);
                if !alive.contains(&id) {
                    allocator.destroy(id);
                }
            }
        }
        allocator
    }
}

// ---------------------------------------------------------------------------
// Branded identifiers
// ---------------------------------------------------------------------------

/// Marker trait for an entity "type brand" (character, faction, site, ...).
///
/// Brands are advisory: there is no runtime check tying a numeric ID to a
/// particular brand. They exist so that domain layers built on top of the
/// core can recover some static distinction between, say, a character ID and
/// a faction ID, while the World itself always operates on the bare
/// [`EntityId`].
pub trait Brand {
    /// Human-readable brand name, used only for diagnostics.
    const NAME: &'static str;
}

macro_rules! brand {
    ($name:ident, $label:literal) => {
        /// Advisory entity brand.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name;
        impl Brand for $name {
            const NAME: &'static str = $label;
        }
    };
}

brand!(Character, "character");
brand!(Faction, "faction");
brand!(Site, "site");
brand!(Artifact, "artifact");
brand!(EventBrand, "event");
brand!(Deity, "deity");
brand!(Book, "book");
brand!(Region, "region");
brand!(War, "war");

/// A branded [`EntityId`]: carries a nominal, compile-time-only tag
/// identifying how the domain layer intends to interpret the ID.
///
/// Conversion to and from the bare `EntityId` is always infallible, since
/// brands are advisory rather than enforced. `try_rebrand` is provided for
/// call sites that want to document an intentional brand change without
/// silently widening the type.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypedId<B> {
    id: EntityId,
    #[serde(skip)]
    _brand: PhantomData<B>,
}

impl<B> TypedId<B> {
    /// Wrap a bare `EntityId` with this brand.
    pub fn from_entity(id: EntityId) -> Self {
        Self {
            id,
            _brand: PhantomData,
        }
    }

    /// Unwrap back to a bare `EntityId`.
    pub fn into_entity(self) -> EntityId {
        self.id
    }

    /// Re-brand this ID as a different flavour. Always succeeds (brands are
    /// advisory), but is named `try_` to mark the call site as a deliberate
    /// brand crossing.
    pub fn try_rebrand<C>(self) -> Result<TypedId<C>, std::convert::Infallible> {
        Ok(TypedId::from_entity(self.id))
    }
}

impl<B> Clone for TypedId<B> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<B> Copy for TypedId<B> {}
impl<B> PartialEq for TypedId<B> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<B> Eq for TypedId<B> {}
impl<B> std::hash::Hash for TypedId<B> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
impl<B: Brand> fmt::Debug for TypedId<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", B::NAME, self.id.to_raw())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
