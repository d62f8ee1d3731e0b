//! Simulation runner.
//!
//! [`SimulationRunner`] takes a prepared [`SimWorld`] and a set of workloads,
//! runs them through setup → run → check, and summarizes the outcome in a
//! [`SimulationReport`].
//!
//! ## Submodules
//!
//! - `context` - SimContext handed to workloads
//! - `workload` - Workload trait and metrics
//! - `orchestrator` - Internal cooperative event loop

pub mod context;
pub(crate) mod orchestrator;
pub mod workload;

pub use context::SimContext;
pub use workload::{Metric, Workload};

use std::fmt;
use std::time::Duration;

use crate::providers::SimProviders;
use crate::sim::{FaultRecord, SimWorld};
use crate::{SimulationError, SimulationResult};

use orchestrator::{Phase, WorkloadResult, drive, spawn_phase};

/// Outcome of one workload in a simulation run.
#[derive(Debug, Clone)]
pub struct WorkloadOutcome {
    /// Workload name.
    pub name: String,
    /// First error among setup, run and check, if any.
    pub result: SimulationResult<()>,
    /// Metrics reported after the check phase.
    pub metrics: Vec<Metric>,
}

/// Summary of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Seed the providers were created with.
    pub seed: u64,
    /// Simulation time once every pending event drained.
    pub sim_time: Duration,
    /// Events processed during the run.
    pub events_processed: u64,
    /// One entry per workload, in registration order.
    pub workloads: Vec<WorkloadOutcome>,
    /// Every fault issued during the run.
    pub faults: Vec<FaultRecord>,
}

impl SimulationReport {
    /// Whether every workload succeeded.
    pub fn is_success(&self) -> bool {
        self.workloads.iter().all(|w| w.result.is_ok())
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "seed {} | sim time {:?} | {} events | {} faults",
            self.seed,
            self.sim_time,
            self.events_processed,
            self.faults.len()
        )?;
        for w in &self.workloads {
            let status = match &w.result {
                Ok(()) => "ok".to_string(),
                Err(e) => format!("FAILED: {e}"),
            };
            writeln!(f, "  {}: {}", w.name, status)?;
            for m in &w.metrics {
                writeln!(f, "    {} = {}", m.name, m.value)?;
            }
        }
        Ok(())
    }
}

/// Runs workloads against one simulation world.
pub struct SimulationRunner {
    sim: SimWorld,
    seed: u64,
    workloads: Vec<Box<dyn Workload>>,
}

impl SimulationRunner {
    /// Create a runner over an already populated world.
    pub fn new(sim: SimWorld, seed: u64) -> Self {
        Self {
            sim,
            seed,
            workloads: Vec::new(),
        }
    }

    /// Add a workload. Its `client_id` is its registration index.
    pub fn workload(mut self, w: impl Workload) -> Self {
        self.workloads.push(Box::new(w));
        self
    }

    /// Run every workload through setup → run → check.
    ///
    /// Must be called from within a `tokio::task::LocalSet`; see
    /// [`run_simulation`] for a ready-made entry point.
    pub async fn run(self) -> SimulationResult<SimulationReport> {
        let SimulationRunner {
            mut sim,
            seed,
            workloads,
        } = self;

        let providers = SimProviders::new(sim.downgrade(), seed);
        let client_count = workloads.len();
        let contexts: Vec<SimContext> = (0..client_count)
            .map(|id| SimContext::new(providers.clone(), id, client_count))
            .collect();
        let names: Vec<String> = workloads.iter().map(|w| w.name().to_string()).collect();
        let mut results: Vec<SimulationResult<()>> = vec![Ok(()); client_count];

        tracing::debug!(seed, "Running {} workload(s)", client_count);

        // Setup is sequential: one workload at a time.
        let mut ready = Vec::with_capacity(client_count);
        for (index, workload) in workloads.into_iter().enumerate() {
            let handle = spawn_phase(workload, contexts[index].clone(), Phase::Setup);
            let done = drive(&mut sim, vec![handle], seed).await?;
            let done = done.into_iter().next().flatten();
            if done.is_none() {
                results[index] = Err(panicked());
            }
            ready.push(done);
        }
        let ready = record_phase(ready, &mut results, Phase::Setup);

        // Run is concurrent across workloads that finished setup successfully.
        let mut handles = Vec::new();
        let mut indices = Vec::new();
        for (index, workload) in ready.into_iter().enumerate() {
            if let Some(w) = workload.filter(|_| results[index].is_ok()) {
                handles.push(spawn_phase(w, contexts[index].clone(), Phase::Run));
                indices.push(index);
            }
        }
        let ran = drive(&mut sim, handles, seed).await?;
        let mut finished: Vec<Option<WorkloadResult>> = (0..client_count).map(|_| None).collect();
        for (index, done) in indices.into_iter().zip(ran) {
            if done.is_none() {
                results[index] = Err(panicked());
            }
            finished[index] = done;
        }
        let finished = record_phase(finished, &mut results, Phase::Run);

        sim.run_until_empty();

        let mut outcomes = Vec::with_capacity(client_count);
        for (index, workload) in finished.into_iter().enumerate() {
            let mut metrics = Vec::new();
            if let Some(w) = workload {
                let handle = spawn_phase(w, contexts[index].clone(), Phase::Check);
                if let Some((w, check)) = drive(&mut sim, vec![handle], seed)
                    .await?
                    .into_iter()
                    .next()
                    .flatten()
                {
                    if let Err(e) = check {
                        tracing::error!("Workload '{}' check failed: {}", w.name(), e);
                        if results[index].is_ok() {
                            results[index] = Err(e);
                        }
                    }
                    metrics = w.metrics();
                }
            }
            outcomes.push(WorkloadOutcome {
                name: names[index].clone(),
                result: results[index].clone(),
                metrics,
            });
        }

        Ok(SimulationReport {
            seed,
            sim_time: sim.current_time(),
            events_processed: sim.events_processed(),
            workloads: outcomes,
            faults: sim.fault_log(),
        })
    }
}

/// Fold one phase's task results into the per-workload results.
///
/// Returns the workloads that are still available for the next phase.
fn record_phase(
    done: Vec<Option<WorkloadResult>>,
    results: &mut [SimulationResult<()>],
    phase: Phase,
) -> Vec<Option<Box<dyn Workload>>> {
    done.into_iter()
        .zip(results.iter_mut())
        .map(|(entry, slot)| {
            let (workload, result) = entry?;
            if let Err(e) = result {
                tracing::error!("Workload '{}' {:?} failed: {}", workload.name(), phase, e);
                if slot.is_ok() {
                    *slot = Err(e);
                }
            }
            Some(workload)
        })
        .collect()
}

fn panicked() -> SimulationError {
    SimulationError::InvalidState("workload task panicked".to_string())
}

/// Run a [`SimulationRunner`] on a fresh current-thread runtime and `LocalSet`.
pub fn run_simulation(runner: SimulationRunner) -> SimulationResult<SimulationReport> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| SimulationError::InvalidState(format!("failed to build runtime: {e}")))?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, runner.run())
}
