use async_trait::async_trait;
use rollback_sim::{
    Metric, SimContext, SimWorld, SimulationError, SimulationResult, SimulationRunner, TimeError,
    TimeProvider, Workload, run_simulation,
};
use std::time::Duration;

struct Sleeper {
    name: &'static str,
    duration: Duration,
    woke_at: Option<Duration>,
}

impl Sleeper {
    fn new(name: &'static str, duration: Duration) -> Self {
        Self {
            name,
            duration,
            woke_at: None,
        }
    }
}

#[async_trait(?Send)]
impl Workload for Sleeper {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&mut self, ctx: &SimContext) -> SimulationResult<()> {
        ctx.time()
            .sleep(self.duration)
            .await
            .map_err(|_| SimulationError::SimulationShutdown)?;
        self.woke_at = Some(ctx.time().now());
        Ok(())
    }

    async fn check(&mut self, _ctx: &SimContext) -> SimulationResult<()> {
        match self.woke_at {
            Some(t) if t == self.duration => Ok(()),
            other => Err(SimulationError::InvalidState(format!(
                "woke at {other:?}, expected {:?}",
                self.duration
            ))),
        }
    }

    fn metrics(&self) -> Vec<Metric> {
        vec![Metric::new("woke_at_secs", self.duration.as_secs_f64())]
    }
}

struct Stuck;

#[async_trait(?Send)]
impl Workload for Stuck {
    fn name(&self) -> &str {
        "stuck"
    }

    async fn run(&mut self, _ctx: &SimContext) -> SimulationResult<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

struct TimedOut {
    outcome: Option<Result<(), TimeError>>,
}

#[async_trait(?Send)]
impl Workload for TimedOut {
    fn name(&self) -> &str {
        "timed_out"
    }

    async fn run(&mut self, ctx: &SimContext) -> SimulationResult<()> {
        let time = ctx.time().clone();
        let inner = async move {
            let _ = time.sleep(Duration::from_secs(10)).await;
        };
        self.outcome = Some(ctx.time().timeout(Duration::from_secs(1), inner).await);
        if ctx.time().now() != Duration::from_secs(1) {
            return Err(SimulationError::InvalidState("timeout fired late".into()));
        }
        Ok(())
    }

    async fn check(&mut self, _ctx: &SimContext) -> SimulationResult<()> {
        if self.outcome == Some(Err(TimeError::Elapsed)) {
            Ok(())
        } else {
            Err(SimulationError::InvalidState(format!(
                "unexpected outcome {:?}",
                self.outcome
            )))
        }
    }
}

#[test]
fn test_workloads_run_concurrently() {
    let runner = SimulationRunner::new(SimWorld::new(), 42)
        .workload(Sleeper::new("short", Duration::from_secs(2)))
        .workload(Sleeper::new("long", Duration::from_secs(3)));

    let report = run_simulation(runner).expect("simulation should run");

    assert!(report.is_success(), "{report}");
    assert_eq!(report.sim_time, Duration::from_secs(3));
    assert_eq!(report.workloads.len(), 2);
    assert_eq!(report.workloads[0].name, "short");
    assert_eq!(
        report.workloads[1].metrics,
        vec![Metric::new("woke_at_secs", 3.0)]
    );
}

#[test]
fn test_timeout_drops_inner_future() {
    let runner = SimulationRunner::new(SimWorld::new(), 7).workload(TimedOut { outcome: None });

    let report = run_simulation(runner).expect("simulation should run");

    assert!(report.is_success(), "{report}");
    // The abandoned 10s timer still drains before the check phase.
    assert_eq!(report.sim_time, Duration::from_secs(10));
}

#[test]
fn test_pending_workload_is_a_deadlock() {
    let runner = SimulationRunner::new(SimWorld::new(), 1).workload(Stuck);

    let result = run_simulation(runner);

    assert!(matches!(result, Err(SimulationError::Deadlock { .. })));
}

#[test]
fn test_report_display_names_workloads() {
    let runner = SimulationRunner::new(SimWorld::new(), 5)
        .workload(Sleeper::new("napper", Duration::from_millis(10)));

    let report = run_simulation(runner).expect("simulation should run");
    let rendered = report.to_string();

    assert!(rendered.contains("seed 5"));
    assert!(rendered.contains("napper: ok"));
}
