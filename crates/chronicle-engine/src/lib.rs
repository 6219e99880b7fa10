//! Chronicle Engine -- the simulation core's orchestration layer: the
//! world clock, system registry, fixed-order tick loop, and snapshot
//! manager built on top of `chronicle-ecs` and `chronicle-events`.

#![deny(unsafe_code)]

pub mod clock;
pub mod engine;
pub mod snapshot;
pub mod system;

/// Errors produced by the engine's orchestration layer.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("a system named '{name}' is already registered")]
    DuplicateSystem { name: String },

    #[error("system '{system_name}' raised during execute: {source}")]
    SystemExecutionFailed {
        system_name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("snapshot restore mismatch: {reason}")]
    SnapshotMismatch { reason: String },
}

pub mod prelude {
    pub use crate::clock::{CalendarDate, Season, WorldClock};
    pub use crate::engine::{SimulationEngine, TickReport};
    pub use crate::snapshot::{Snapshot, SnapshotManager};
    pub use crate::system::{priority, Frequency, System, SystemRegistry};
    pub use crate::EngineError;
}
