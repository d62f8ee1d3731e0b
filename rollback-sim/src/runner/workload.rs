//! Workload trait for simulation testing.
//!
//! Workloads go through three lifecycle phases:
//!
//! 1. **Setup**: initialize state (sequential)
//! 2. **Run**: main logic, all workloads run concurrently
//! 3. **Check**: validate correctness after quiescence (sequential)
//!
//! # Usage
//!
//! ```ignore
//! use rollback_sim::{SimContext, SimulationResult, Workload};
//!
//! struct Idle;
//!
//! #[async_trait(?Send)]
//! impl Workload for Idle {
//!     fn name(&self) -> &str { "idle" }
//!     async fn run(&mut self, ctx: &SimContext) -> SimulationResult<()> {
//!         ctx.time().sleep(Duration::from_secs(1)).await.ok();
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::SimulationResult;

use super::context::SimContext;

/// A named performance value reported by a workload.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Metric name.
    pub name: String,
    /// Metric value.
    pub value: f64,
}

impl Metric {
    /// Create a metric.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A workload that participates in simulation testing.
#[async_trait(?Send)]
pub trait Workload: 'static {
    /// Name of this workload for reporting.
    fn name(&self) -> &str;

    /// Setup phase. Default implementation is a no-op.
    async fn setup(&mut self, _ctx: &SimContext) -> SimulationResult<()> {
        Ok(())
    }

    /// Run phase: main workload logic.
    async fn run(&mut self, ctx: &SimContext) -> SimulationResult<()>;

    /// Check phase, called after all runs complete and pending events drain.
    /// Default implementation is a no-op.
    async fn check(&mut self, _ctx: &SimContext) -> SimulationResult<()> {
        Ok(())
    }

    /// Metrics collected during the run. Default implementation reports none.
    fn metrics(&self) -> Vec<Metric> {
        Vec::new()
    }
}
