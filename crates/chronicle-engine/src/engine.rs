//! The simulation engine: drives the fixed 13-step tick sequence over a
//! [`World`], a [`WorldClock`], a registry of [`System`]s, and the cascade
//! engine's event resolution.

use std::cell::RefCell;
use std::rc::Rc;

use chronicle_ecs::world::World;
use chronicle_events::prelude::{CascadeEngine, Event, EventBus, EventIdAllocator, EventLog};

use crate::clock::WorldClock;
use crate::system::{priority, Frequency, System, SystemRegistry};
use crate::EngineError;

/// `(current_tick, events emitted this tick, in emit order)` passed to every
/// per-tick listener.
pub type TickListener = Box<dyn FnMut(u64, &[Event])>;

/// Outcome of driving a single tick: which systems ran, and which (if any)
/// raised during `execute`. A system raising does not stop the tick --
/// failures are collected and the clock still advances.
#[derive(Debug, Default)]
pub struct TickReport {
    pub tick: u64,
    pub systems_executed: Vec<String>,
    pub failures: Vec<EngineError>,
    pub events_captured: usize,
    pub cascade_events_generated: u32,
}

/// Drives the fixed tick sequence: time advance, frequency/priority-ordered
/// system execution, event capture, cascade resolution, and listener
/// fan-out.
///
/// The engine subscribes its own "any" handler on the bus at construction,
/// appending every event emitted during a tick (by systems or by the
/// cascade engine) into a per-tick capture buffer. Events emitted by domain
/// systems are the engine's own responsibility to log: each is appended to
/// the event log and handed to the cascade engine's `process_event` as soon
/// as its system batch finishes, so its `consequence_rules` are pending
/// before step 10 resolves them. Events emitted by the cascade engine during
/// `resolve_tick` are already appended to the log by the cascade engine
/// itself (it needs the cause event present in the log to link
/// consequences mid-resolution), so the engine only folds those into the
/// tick's listener snapshot rather than logging them a second time.
pub struct SimulationEngine {
    world: World,
    clock: WorldClock,
    bus: EventBus,
    log: EventLog,
    registry: SystemRegistry,
    cascade: CascadeEngine,
    id_alloc: EventIdAllocator,
    listeners: Vec<TickListener>,
    capture: Rc<RefCell<Vec<Event>>>,
    initialized: bool,
}

impl SimulationEngine {
    pub fn new(world: World, clock: WorldClock, cascade: CascadeEngine) -> Self {
        let mut bus = EventBus::new();
        let capture = Rc::new(RefCell::new(Vec::new()));
        let capture_handle = capture.clone();
        bus.subscribe_any(move |event| {
            capture_handle.borrow_mut().push(event.clone());
            Ok(())
        });
        Self {
            world,
            clock,
            bus,
            log: EventLog::new(),
            registry: SystemRegistry::new(),
            cascade,
            id_alloc: EventIdAllocator::new(),
            listeners: Vec::new(),
            capture,
            initialized: false,
        }
    }

    pub fn register_system(&mut self, system: Box<dyn System>) -> Result<(), EngineError> {
        self.registry.register(system)
    }

    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: FnMut(u64, &[Event]) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn clock(&self) -> &WorldClock {
        &self.clock
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn registry(&self) -> &SystemRegistry {
        &self.registry
    }

    fn initialize_systems(&mut self) {
        if self.initialized {
            return;
        }
        for index in self.registry.ordered_indices() {
            let system = self.registry.system_mut(index);
            if let Err(error) = system.initialize(&mut self.world) {
                tracing::warn!(system = system.name(), %error, "system initialize failed");
            }
        }
        self.initialized = true;
    }

    /// Run every system at `indices` in order, recording its name and any
    /// execution failure into `report`. Does not touch the event log or the
    /// cascade engine -- callers drain the capture buffer afterward.
    fn run_systems(&mut self, indices: &[usize], report: &mut TickReport) {
        for &index in indices {
            let system = self.registry.system_mut(index);
            let name = system.name().to_owned();
            if let Err(error) = system.execute(&mut self.world, &self.clock, &mut self.bus) {
                tracing::warn!(system = %name, %error, "system execute failed");
                report.failures.push(EngineError::SystemExecutionFailed {
                    system_name: name.clone(),
                    source: error,
                });
            }
            report.systems_executed.push(name);
        }
    }

    /// Drain the shared capture buffer, append each event to the log, and
    /// register it with the cascade engine so its `consequence_rules` become
    /// pending for this or a future tick's resolution. Returns the drained
    /// events for listener fan-out.
    fn drain_capture_and_register(&mut self, current_tick: u64, report: &mut TickReport) -> Vec<Event> {
        let captured = std::mem::take(&mut *self.capture.borrow_mut());
        report.events_captured += captured.len();
        for event in &captured {
            self.log.append(event.clone());
            self.cascade.process_event(event, current_tick, 0);
        }
        captured
    }

    /// Drive exactly one tick through the full 13-step sequence.
    pub fn tick(&mut self) -> TickReport {
        self.initialize_systems();
        self.capture.borrow_mut().clear();

        // Step 1: TIME_ADVANCE.
        self.clock.advance();
        let current_tick = self.clock.tick();

        let mut report = TickReport {
            tick: current_tick,
            ..Default::default()
        };
        let mut all_captured: Vec<Event> = Vec::new();

        let eligible = self.registry.systems_for_tick(current_tick);
        let (before_resolution, after_resolution): (Vec<usize>, Vec<usize>) = eligible
            .into_iter()
            .partition(|&index| self.registry.priority_of(index) < priority::EVENT_RESOLUTION);

        // Steps 2-9: domain systems ahead of event resolution. Their events
        // must be logged and registered with the cascade engine before step
        // 10 runs, since resolve_tick links consequences back onto the
        // cause event via a log lookup.
        self.run_systems(&before_resolution, &mut report);
        all_captured.extend(self.drain_capture_and_register(current_tick, &mut report));

        // Step 10: EVENT_RESOLUTION -- resolve due cascade consequences.
        let resolution = self.cascade.resolve_tick(current_tick, &mut self.log, &mut self.bus, &mut self.id_alloc);
        report.cascade_events_generated = resolution.events_generated;

        // resolve_tick emits each fired consequence on the bus (captured
        // here too) and already appended it to the log itself, so fold
        // these into the listener snapshot without logging them again.
        let cascade_captured = std::mem::take(&mut *self.capture.borrow_mut());
        report.events_captured += cascade_captured.len();
        all_captured.extend(cascade_captured);

        // Steps 11-13: domain systems after event resolution. Their events
        // still need logging and registering, but this tick's resolution
        // window has closed -- any zero-delay consequences of theirs fire
        // starting next tick's step 10.
        self.run_systems(&after_resolution, &mut report);
        all_captured.extend(self.drain_capture_and_register(current_tick, &mut report));

        for listener in &mut self.listeners {
            listener(current_tick, &all_captured);
        }

        report
    }

    /// Run `n` ticks, returning each tick's report in order.
    pub fn run(&mut self, n: u64) -> Vec<TickReport> {
        (0..n).map(|_| self.tick()).collect()
    }

    /// Run ticks until `predicate` returns `true` or `max_ticks` is reached.
    /// Returns the number of ticks actually elapsed.
    pub fn run_until<F>(&mut self, mut predicate: F, max_ticks: u64) -> u64
    where
        F: FnMut(&TickReport) -> bool,
    {
        let mut elapsed = 0;
        while elapsed < max_ticks {
            let report = self.tick();
            elapsed += 1;
            if predicate(&report) {
                break;
            }
        }
        elapsed
    }

    /// Calls every system's `cleanup()` and marks the engine uninitialized
    /// (the next `tick()` re-runs `initialize` on all systems).
    pub fn cleanup(&mut self) {
        for system in self.registry.iter_mut() {
            system.cleanup();
        }
        self.initialized = false;
    }

    /// `cleanup()`, then zero the tick counter and drop listeners/capture
    /// buffer contents.
    pub fn reset(&mut self) {
        self.cleanup();
        self.clock.set_tick(0);
        self.listeners.clear();
        self.capture.borrow_mut().clear();
    }
}
