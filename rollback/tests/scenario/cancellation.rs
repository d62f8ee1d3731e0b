use std::time::Duration;

use async_trait::async_trait;
use rollback::{RollbackConfig, RollbackWorkload, run_occurrence};
use rollback_sim::{
    SimContext, SimulationError, SimulationResult, TimeError, TimeProvider, Workload,
};

use crate::topology::{C1, R1, R2, R3, config, fault_pattern, metric, run_one, world};

/// Runs one occurrence under a timeout shorter than its partition wait.
struct CutShort {
    config: RollbackConfig,
    cut_at: Duration,
}

#[async_trait(?Send)]
impl Workload for CutShort {
    fn name(&self) -> &str {
        "cut_short"
    }

    async fn run(&mut self, ctx: &SimContext) -> SimulationResult<()> {
        let outcome = ctx
            .time()
            .timeout(self.cut_at, run_occurrence(ctx.providers(), &self.config))
            .await;
        match outcome {
            Err(TimeError::Elapsed) => Ok(()),
            other => Err(SimulationError::InvalidState(format!(
                "occurrence was not cancelled: {other:?}"
            ))),
        }
    }
}

#[test]
fn test_cancel_during_partition_wait_skips_escalation() {
    let sim = world(&[C1], &[R1, R2, R3]);
    let workload = CutShort {
        config: config(&[("clogDuration", "3.0")]),
        cut_at: Duration::from_millis(500),
    };

    let report = run_one(sim, 5, workload);
    assert!(report.is_success(), "{report}");
    // Link faults issued before the wait stay in place; nothing after it runs.
    assert_eq!(fault_pattern(&report.faults), "LL");
    assert!(report.faults.iter().all(|r| r.at == Duration::ZERO));
}

#[test]
fn test_cancel_during_aggressive_wait_keeps_coordinator() {
    let sim = world(&[C1], &[R1, R2, R3]);
    let workload = CutShort {
        config: config(&[("enableFailures", "true")]),
        cut_at: Duration::from_millis(999),
    };

    let report = run_one(sim, 6, workload);
    assert!(report.is_success(), "{report}");
    assert_eq!(fault_pattern(&report.faults), "LL");
}

#[test]
fn test_timeout_mid_occurrence_counts_started_only() {
    // First arrival lands before the 4s bound but the clog wait runs past it.
    let sim = world(&[C1], &[R1, R2, R3]);
    let workload = RollbackWorkload::new(config(&[
        ("multiple", "false"),
        ("clogDuration", "30"),
        ("testDuration", "4"),
    ]));

    let report = run_one(sim, 8, workload);
    assert!(report.is_success(), "{report}");
    assert_eq!(fault_pattern(&report.faults), "LL");
    assert_eq!(metric(&report, "occurrences_started"), 1.0);
    assert_eq!(metric(&report, "occurrences_completed"), 0.0);
}
