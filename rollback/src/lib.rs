//! # Rollback
//!
//! Fault-injection workload that forces the replicated log of a commit
//! pipeline to roll back uncommitted state.
//!
//! Each occurrence cuts a coordinator off from every replica except one
//! survivor, waits until the partition is in effect, then kills or isolates
//! the coordinator and isolates the survivor before the partition heals. The
//! remaining replicas are left to recover without a safe referent.
//!
//! ## Modules
//!
//! - [`sampler`]: picks coordinator, survivor and partitioned replicas
//! - [`driver`]: issues one occurrence's fault sequence
//! - [`scheduler`]: single-shot or Poisson-spaced occurrences
//! - [`config`]: options and defaults
//! - [`workload`]: lifecycle wrapper run by the simulation
//!
//! ## Quick Start
//!
//! ```ignore
//! use rollback::{RollbackConfig, RollbackWorkload};
//! use rollback_sim::{SimWorld, SimulationRunner, run_simulation};
//!
//! let sim = SimWorld::new();
//! // register coordinators and replicas...
//! let runner = SimulationRunner::new(sim, 42)
//!     .workload(RollbackWorkload::new(RollbackConfig::default()));
//! let report = run_simulation(runner)?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod driver;
pub mod sampler;
pub mod scheduler;
pub mod workload;

pub use config::{ConfigError, RollbackConfig, WorkloadOptions};
pub use driver::{Escalation, OccurrenceOutcome, run_occurrence};
pub use sampler::{AbortReason, FaultPlan, sample};
pub use scheduler::{
    PoissonArrivals, Scheduler, SchedulerMode, SchedulerState, SchedulerStats, single_shot_delay,
};
pub use workload::{RollbackWorkload, WORKLOAD_NAME};
