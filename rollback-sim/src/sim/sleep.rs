//! Sleep functionality for simulation time.
//!
//! A [`SleepFuture`] completes once the simulation processes the timer event
//! scheduled for it. Time only moves when the event loop steps.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::SimulationResult;

use super::world::WeakSimWorld;

/// Future that completes after a specified simulation time duration.
///
/// Completes with `Err(SimulationShutdown)` if the world is dropped first.
#[derive(Debug)]
pub struct SleepFuture {
    sim: WeakSimWorld,
    task_id: u64,
    completed: bool,
}

impl SleepFuture {
    /// Creates a new sleep future.
    ///
    /// Called by `SimWorld::sleep()`; the timer event must already be scheduled.
    pub fn new(sim: WeakSimWorld, task_id: u64) -> Self {
        Self {
            sim,
            task_id,
            completed: false,
        }
    }
}

impl Future for SleepFuture {
    type Output = SimulationResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.completed {
            return Poll::Ready(Ok(()));
        }

        let sim = match self.sim.upgrade() {
            Ok(sim) => sim,
            Err(e) => return Poll::Ready(Err(e)),
        };

        if sim.take_task_wake(self.task_id) {
            self.completed = true;
            Poll::Ready(Ok(()))
        } else {
            sim.register_task_waker(self.task_id, cx.waker().clone());
            Poll::Pending
        }
    }
}

impl Drop for SleepFuture {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        if let Ok(sim) = self.sim.upgrade() {
            sim.release_task(self.task_id);
        }
    }
}
