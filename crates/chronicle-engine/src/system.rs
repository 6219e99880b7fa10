//! System interface and registry: frequency filtering, priority ordering.

use chronicle_ecs::world::World;
use chronicle_events::prelude::EventBus;

use crate::clock::WorldClock;
use crate::EngineError;

// ---------------------------------------------------------------------------
// Frequency
// ---------------------------------------------------------------------------

/// How often a system wants to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Event-driven; never satisfies the tick filter on its own.
    OnEvent,
}

impl Frequency {
    /// The tick period this frequency corresponds to, or `None` for
    /// `OnEvent`, which is never tick-eligible.
    pub fn period(self) -> Option<u64> {
        match self {
            Frequency::Daily => Some(1),
            Frequency::Weekly => Some(7),
            Frequency::Monthly => Some(30),
            Frequency::Yearly => Some(360),
            Frequency::OnEvent => None,
        }
    }

    /// Whether a system with this frequency is eligible to run on `tick`.
    pub fn matches_tick(self, tick: u64) -> bool {
        match self.period() {
            Some(period) => tick % period == 0,
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Priority palette
// ---------------------------------------------------------------------------

/// Fixed execution-order priority values, spaced to leave room for later
/// insertions between steps.
pub mod priority {
    pub const TIME_ADVANCE: i32 = 10;
    pub const ENVIRONMENT: i32 = 20;
    pub const ECONOMY: i32 = 30;
    pub const POPULATION: i32 = 35;
    pub const POLITICS: i32 = 40;
    pub const SETTLEMENT_LIFECYCLE: i32 = 45;
    pub const SOCIAL: i32 = 50;
    pub const CHARACTER_AI: i32 = 60;
    pub const EXPLORATION: i32 = 65;
    pub const MAGIC: i32 = 70;
    pub const RELIGION: i32 = 80;
    pub const MILITARY: i32 = 90;
    pub const EVENT_RESOLUTION: i32 = 100;
    pub const NARRATIVE_GENERATION: i32 = 110;
    pub const CLEANUP_INDEXING: i32 = 120;
    pub const PLAYER_NOTIFICATION: i32 = 130;
}

// ---------------------------------------------------------------------------
// System trait
// ---------------------------------------------------------------------------

/// A named, periodic unit of per-tick simulation work.
///
/// Implementations live outside the core (domain systems for economy,
/// politics, and so on); the core only drives them through this interface.
pub trait System {
    fn name(&self) -> &str;
    fn frequency(&self) -> Frequency;
    fn priority(&self) -> i32;

    /// Called once, before the system's first eligible execution.
    fn initialize(&mut self, world: &mut World) -> anyhow::Result<()> {
        let _ = world;
        Ok(())
    }

    /// Called once per eligible tick.
    fn execute(
        &mut self,
        world: &mut World,
        clock: &WorldClock,
        bus: &mut EventBus,
    ) -> anyhow::Result<()>;

    /// Called once on engine shutdown.
    fn cleanup(&mut self) {}
}

// ---------------------------------------------------------------------------
// SystemRegistry
// ---------------------------------------------------------------------------

/// Registers systems and resolves execution order.
#[derive(Default)]
pub struct SystemRegistry {
    systems: Vec<Box<dyn System>>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system. Fails with [`EngineError::DuplicateSystem`] if the
    /// name is already taken.
    pub fn register(&mut self, system: Box<dyn System>) -> Result<(), EngineError> {
        if self.systems.iter().any(|s| s.name() == system.name()) {
            return Err(EngineError::DuplicateSystem {
                name: system.name().to_owned(),
            });
        }
        self.systems.push(system);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.systems.len();
        self.systems.retain(|s| s.name() != name);
        self.systems.len() != before
    }

    pub fn get(&self, name: &str) -> Option<&dyn System> {
        self.systems.iter().find(|s| s.name() == name).map(|b| b.as_ref())
    }

    pub fn count(&self) -> usize {
        self.systems.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    pub fn names_by_frequency(&self, frequency: Frequency) -> Vec<&str> {
        self.systems
            .iter()
            .filter(|s| s.frequency() == frequency)
            .map(|s| s.name())
            .collect()
    }

    /// Registration-order indices, sorted ascending by priority. Rust's
    /// `sort_by` is stable, so systems sharing a priority retain their
    /// relative registration order.
    pub fn ordered_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.systems.len()).collect();
        indices.sort_by_key(|&i| self.systems[i].priority());
        indices
    }

    /// All systems in priority order.
    pub fn get_ordered_systems(&self) -> Vec<&dyn System> {
        self.ordered_indices()
            .into_iter()
            .map(|i| self.systems[i].as_ref())
            .collect()
    }

    /// Indices of systems eligible to run on `tick`, still priority-sorted.
    pub fn systems_for_tick(&self, tick: u64) -> Vec<usize> {
        self.ordered_indices()
            .into_iter()
            .filter(|&i| self.systems[i].frequency().matches_tick(tick))
            .collect()
    }

    pub fn system_mut(&mut self, index: usize) -> &mut Box<dyn System> {
        &mut self.systems[index]
    }

    /// Priority of the system at `index`, without requiring a mutable
    /// borrow. Used to split an eligible-systems list around a fixed
    /// priority (e.g. the EVENT_RESOLUTION slot the engine drives itself).
    pub fn priority_of(&self, index: usize) -> i32 {
        self.systems[index].priority()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn System>> {
        self.systems.iter_mut()
    }
}
