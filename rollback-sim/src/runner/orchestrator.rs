//! Cooperative workload orchestration.
//!
//! Workload futures run as `spawn_local` tasks. The driver loop processes one
//! simulation event at a time and yields so that woken tasks get polled before
//! the next event, which keeps execution single-threaded and deterministic.

use tokio::task::JoinHandle;

use crate::runner::context::SimContext;
use crate::runner::workload::Workload;
use crate::sim::SimWorld;
use crate::{SimulationError, SimulationResult};

/// Consecutive no-progress iterations tolerated before declaring a deadlock.
const DEADLOCK_THRESHOLD: usize = 3;

/// Deadlock detection utility to identify stuck simulations.
#[derive(Debug, Default)]
pub(crate) struct DeadlockDetector {
    no_progress_count: usize,
    threshold: usize,
}

impl DeadlockDetector {
    pub(crate) fn new(threshold: usize) -> Self {
        Self {
            no_progress_count: 0,
            threshold,
        }
    }

    /// Update the detector with one loop iteration; `true` means deadlock.
    pub(crate) fn check_deadlock(
        &mut self,
        handles_count: usize,
        initial_handle_count: usize,
        event_count: usize,
        initial_event_count: usize,
    ) -> bool {
        if event_count == 0 && handles_count == initial_handle_count && initial_event_count == 0 {
            self.no_progress_count += 1;
            self.no_progress_count > self.threshold
        } else {
            self.no_progress_count = 0;
            false
        }
    }
}

/// Lifecycle phase a workload task executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Setup,
    Run,
    Check,
}

/// Result of a completed workload task.
pub(crate) type WorkloadResult = (Box<dyn Workload>, SimulationResult<()>);

/// Spawn one lifecycle phase of a workload on the current `LocalSet`.
pub(crate) fn spawn_phase(
    workload: Box<dyn Workload>,
    ctx: SimContext,
    phase: Phase,
) -> JoinHandle<WorkloadResult> {
    tokio::task::spawn_local(async move {
        let mut w = workload;
        tracing::debug!(workload = w.name(), ?phase, "Starting phase");
        let result = match phase {
            Phase::Setup => w.setup(&ctx).await,
            Phase::Run => w.run(&ctx).await,
            Phase::Check => w.check(&ctx).await,
        };
        (w, result)
    })
}

/// Step the simulation until every handle has finished.
///
/// Slots stay `None` for tasks that panicked.
pub(crate) async fn drive(
    sim: &mut SimWorld,
    handles: Vec<JoinHandle<WorkloadResult>>,
    seed: u64,
) -> SimulationResult<Vec<Option<WorkloadResult>>> {
    let mut handles: Vec<Option<JoinHandle<WorkloadResult>>> =
        handles.into_iter().map(Some).collect();
    let mut collected: Vec<Option<WorkloadResult>> = handles.iter().map(|_| None).collect();
    let mut deadlock_detector = DeadlockDetector::new(DEADLOCK_THRESHOLD);
    let mut loop_count: u64 = 0;

    loop {
        let active_count = handles.iter().filter(|h| h.is_some()).count();
        if active_count == 0 {
            break;
        }

        loop_count += 1;
        if loop_count % 1000 == 0 {
            tracing::trace!(
                "Cooperative loop iteration {}, {} handles active, {} pending events",
                loop_count,
                active_count,
                sim.pending_event_count()
            );
        }

        let initial_event_count = sim.pending_event_count();
        if initial_event_count > 0 {
            sim.step();
        }

        for (slot, done) in handles.iter_mut().zip(collected.iter_mut()) {
            if !slot.as_ref().is_some_and(|h| h.is_finished()) {
                continue;
            }
            if let Some(handle) = slot.take() {
                match handle.await {
                    Ok(result) => *done = Some(result),
                    Err(e) => tracing::error!(seed, "Workload task failed: {}", e),
                }
            }
        }

        let current_active = handles.iter().filter(|h| h.is_some()).count();
        if deadlock_detector.check_deadlock(
            current_active,
            active_count,
            sim.pending_event_count(),
            initial_event_count,
        ) {
            tracing::error!(
                seed,
                "DEADLOCK detected: {} tasks pending with an empty event queue",
                current_active
            );
            for handle in handles.iter().flatten() {
                handle.abort();
            }
            return Err(SimulationError::Deadlock {
                pending_events: sim.pending_event_count(),
            });
        }

        if current_active > 0 {
            tokio::task::yield_now().await;
        }
    }

    Ok(collected)
}
