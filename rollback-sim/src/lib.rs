//! # Rollback Simulation Substrate
//!
//! Deterministic, single-threaded simulation of a small cluster, sized for
//! fault-injection workloads in the style of
//! [FoundationDB's simulation testing](https://apple.github.io/foundationdb/testing.html).
//!
//! Key properties:
//! - **Reproducible**: Same seed produces identical execution
//! - **Logical time**: Idle periods are skipped, sleeps cost nothing
//! - **Observable**: Every injected fault is logged with its timestamp
//!
//! ## Core Components
//!
//! - [`SimWorld`]: Logical clock, event queue, fault state and process registry
//! - [`providers`]: Time, randomness, fault and topology capabilities
//! - [`SimulationRunner`]: Drives workloads through setup, run and check
//!
//! ## Quick Start
//!
//! ```ignore
//! use rollback_sim::{ProcessRole, SimWorld, SimulationRunner, run_simulation};
//!
//! let sim = SimWorld::new();
//! sim.register_process("10.0.0.1:4500".parse()?, ProcessRole::Coordinator);
//! sim.register_process("10.0.0.2:4500".parse()?, ProcessRole::Replica);
//!
//! let report = run_simulation(SimulationRunner::new(sim, 42).workload(my_workload))?;
//! assert!(report.is_success());
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

mod error;
mod types;

/// Core simulation engine for deterministic testing.
pub mod sim;

/// Provider traits and simulation implementations.
pub mod providers;

/// Simulation runner and orchestration framework.
pub mod runner;

pub use error::{SimulationError, SimulationResult};
pub use types::{NetworkAddress, NetworkAddressParseError, ProcessRole};

// Sim module re-exports
pub use sim::{
    ClogMode, Event, EventQueue, FaultKind, FaultRecord, KillType, ScheduledEvent, SimWorld,
    SleepFuture, WeakSimWorld,
};

// Provider re-exports
pub use providers::{
    ClusterProvider, ClusterSnapshot, FaultProvider, Providers, RandomProvider,
    SimClusterProvider, SimFaultProvider, SimProviders, SimRandomProvider, SimTimeProvider,
    TimeError, TimeProvider,
};

// Runner module re-exports
pub use runner::{
    Metric, SimContext, SimulationReport, SimulationRunner, Workload, WorkloadOutcome,
    run_simulation,
};
