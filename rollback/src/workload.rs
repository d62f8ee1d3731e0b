//! The rollback workload: the scheduler wrapped in the simulation lifecycle.

use async_trait::async_trait;
use rollback_sim::{
    Metric, SimContext, SimulationError, SimulationResult, TimeError, TimeProvider, Workload,
};

use crate::config::{ConfigError, RollbackConfig, WorkloadOptions};
use crate::scheduler::{Scheduler, SchedulerState, SchedulerStats};

/// Name the workload reports under.
pub const WORKLOAD_NAME: &str = "Rollback";

/// Forces replicated-log rollbacks by partitioning and then removing a
/// coordinator.
///
/// Only client 0 injects faults. The run phase is bounded by `testDuration`;
/// an occurrence in flight when it elapses is abandoned.
#[derive(Debug, Clone)]
pub struct RollbackWorkload {
    scheduler: Scheduler,
}

impl RollbackWorkload {
    /// Create the workload from a configuration.
    pub fn new(config: RollbackConfig) -> Self {
        Self {
            scheduler: Scheduler::new(config),
        }
    }

    /// Create the workload from key/value options.
    pub fn from_options(options: &WorkloadOptions) -> Result<Self, ConfigError> {
        RollbackConfig::from_options(options).map(Self::new)
    }

    /// Configuration in use.
    pub fn config(&self) -> &RollbackConfig {
        self.scheduler.config()
    }

    /// Occurrence counters so far.
    pub fn stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    /// Scheduler state at the last suspension point.
    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }
}

impl Default for RollbackWorkload {
    fn default() -> Self {
        Self::new(RollbackConfig::default())
    }
}

#[async_trait(?Send)]
impl Workload for RollbackWorkload {
    fn name(&self) -> &str {
        WORKLOAD_NAME
    }

    async fn run(&mut self, ctx: &SimContext) -> SimulationResult<()> {
        if !self.config().enabled_for(ctx.client_id()) {
            tracing::debug!(client_id = ctx.client_id(), "Rollback workload disabled");
            return Ok(());
        }

        let test_duration = self.config().test_duration();
        let outcome = ctx
            .time()
            .timeout(test_duration, self.scheduler.run(ctx.providers()))
            .await;

        let error = match outcome {
            Ok(Ok(())) => return Ok(()),
            Err(TimeError::Elapsed) => {
                tracing::debug!(
                    stats = ?self.scheduler.stats(),
                    "Rollback workload reached its test duration"
                );
                return Ok(());
            }
            Err(TimeError::Shutdown) => SimulationError::SimulationShutdown,
            Ok(Err(e)) => e,
        };

        tracing::error!(error = %error, "RollbackFailureWorkerError");
        Err(error)
    }

    fn metrics(&self) -> Vec<Metric> {
        let stats = self.scheduler.stats();
        vec![
            Metric::new("occurrences_started", stats.occurrences_started as f64),
            Metric::new("occurrences_completed", stats.occurrences_completed as f64),
            Metric::new("occurrences_skipped", stats.occurrences_skipped as f64),
        ]
    }
}
