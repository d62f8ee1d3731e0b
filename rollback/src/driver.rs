//! One rollback occurrence.
//!
//! Partition the coordinator from every replica but the survivor, wait a third
//! of the clog duration, then escalate before the link faults expire:
//!
//! ```text
//! t = 0           clog_pair(coordinator -> other) for every other replica
//! t = clog / 3    re-read topology
//!                 KillAndIsolate: kill coordinator, isolate survivor
//!                 DoubleIsolate:  isolate coordinator, isolate survivor
//! ```
//!
//! Issued faults are never lifted here; they expire on their own.

use rollback_sim::{
    ClogMode, ClusterProvider, FaultProvider, KillType, Providers, SimulationError,
    SimulationResult, TimeProvider,
};
use tracing::instrument;

use crate::config::RollbackConfig;
use crate::sampler::{AbortReason, FaultPlan, sample};

/// How an occurrence finishes off the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Kill the coordinator outright and isolate the survivor.
    KillAndIsolate,
    /// Isolate both the coordinator and the survivor.
    DoubleIsolate,
}

impl Escalation {
    /// Escalation selected by the `aggressiveFailures` option.
    pub fn for_config(config: &RollbackConfig) -> Self {
        if config.aggressive_failures {
            Escalation::KillAndIsolate
        } else {
            Escalation::DoubleIsolate
        }
    }
}

/// Result of one occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OccurrenceOutcome {
    /// Every fault of the plan was issued.
    Completed(FaultPlan),
    /// The topology did not allow a plan; nothing was issued.
    Skipped(AbortReason),
}

/// Run one occurrence against the current topology.
///
/// Errors only when the simulation is gone.
#[instrument(skip_all)]
pub async fn run_occurrence<P: Providers>(
    providers: &P,
    config: &RollbackConfig,
) -> SimulationResult<OccurrenceOutcome> {
    let clog = config.clog_duration();
    let snapshot = providers.cluster().snapshot()?;

    let plan = match sample(&snapshot, clog, providers.random()) {
        Ok(plan) => plan,
        Err(reason) => {
            tracing::info!(%reason, "Unable to trigger rollback");
            return Ok(OccurrenceOutcome::Skipped(reason));
        }
    };

    tracing::info!(
        coordinator = %plan.coordinator,
        survivor = %plan.survivor,
        "Attempting to trigger rollback"
    );

    let faults = providers.faults();
    for replica in &plan.other_replicas {
        faults.clog_pair(plan.coordinator.ip, replica.ip, clog)?;
    }

    providers
        .time()
        .sleep(clog / 3)
        .await
        .map_err(|_| SimulationError::SimulationShutdown)?;

    let snapshot = providers.cluster().snapshot()?;
    tracing::debug!(
        coordinators = snapshot.coordinators().len(),
        replicas = snapshot.replicas().len(),
        "Topology after partition"
    );

    match Escalation::for_config(config) {
        Escalation::KillAndIsolate => {
            faults.kill_process(&plan.coordinator, KillType::Instant)?;
            faults.clog_interface(plan.survivor.ip, clog, ClogMode::All)?;
        }
        Escalation::DoubleIsolate => {
            faults.clog_interface(plan.coordinator.ip, clog, ClogMode::All)?;
            faults.clog_interface(plan.survivor.ip, clog, ClogMode::All)?;
        }
    }

    Ok(OccurrenceOutcome::Completed(plan))
}
