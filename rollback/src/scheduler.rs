//! Occurrence scheduling.
//!
//! Single-shot mode fires once after a random delay that leaves room for the
//! whole fault sequence inside the test duration. Repeating mode fires at
//! Poisson-spaced instants and never stops by itself: the enclosing timeout
//! ends it.

use std::time::Duration;

use rollback_sim::{Providers, RandomProvider, SimulationError, SimulationResult, TimeProvider};

use crate::config::RollbackConfig;
use crate::driver::{OccurrenceOutcome, run_occurrence};

/// Multiples of the clog duration reserved at the end of the test window for
/// a single-shot occurrence.
pub const SINGLE_SHOT_MARGIN: u32 = 13;

/// Whether the scheduler fires once or keeps firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerMode {
    /// One occurrence after a random delay.
    SingleShot,
    /// Occurrences at Poisson-spaced intervals until cancelled.
    Repeating,
}

impl SchedulerMode {
    /// Mode selected by the `multiple` option.
    pub fn for_config(config: &RollbackConfig) -> Self {
        if config.multiple {
            SchedulerMode::Repeating
        } else {
            SchedulerMode::SingleShot
        }
    }
}

/// Where the scheduler is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// Not started.
    #[default]
    Idle,
    /// Suspended until the next occurrence.
    Waiting,
    /// An occurrence is in progress.
    Firing,
    /// The single-shot occurrence returned.
    Done,
}

/// Occurrence counters.
///
/// `started - completed - skipped` is the number of occurrences cut short by
/// cancellation (at most one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerStats {
    /// Occurrences that began sampling.
    pub occurrences_started: u64,
    /// Occurrences that issued their whole fault sequence.
    pub occurrences_completed: u64,
    /// Occurrences abandoned on an unfavorable topology.
    pub occurrences_skipped: u64,
}

/// Delay before the single-shot occurrence.
///
/// Uniform in `[0, test_duration - 13 * clog_duration)`, zero when that range
/// is empty.
pub fn single_shot_delay<R: RandomProvider>(config: &RollbackConfig, random: &R) -> Duration {
    let reserved = config
        .clog_duration()
        .checked_mul(SINGLE_SHOT_MARGIN)
        .unwrap_or(Duration::MAX);
    let window = config.test_duration().saturating_sub(reserved);
    Duration::try_from_secs_f64(window.as_secs_f64() * random.random_ratio()).unwrap_or(window)
}

/// Poisson arrival process anchored to absolute time.
///
/// Each deadline is computed from the previous deadline rather than from the
/// moment the caller woke up, so time spent inside occurrences does not
/// accumulate as drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoissonArrivals {
    last: Duration,
    mean: Duration,
}

impl PoissonArrivals {
    /// Arrivals starting at `start` with mean inter-arrival time `mean`.
    pub fn new(start: Duration, mean: Duration) -> Self {
        Self { last: start, mean }
    }

    /// The most recent deadline.
    pub fn last(&self) -> Duration {
        self.last
    }

    /// Advance to the next arrival and return its absolute deadline.
    pub fn next_deadline<R: RandomProvider>(&mut self, random: &R) -> Duration {
        // 1 - [0, 1) is (0, 1], so ln never sees zero.
        let u = 1.0 - random.random_ratio();
        let gap = Duration::try_from_secs_f64(self.mean.as_secs_f64() * -u.ln())
            .unwrap_or(Duration::MAX);
        self.last = self.last.saturating_add(gap);
        self.last
    }
}

/// Drives occurrences according to the configured mode.
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: RollbackConfig,
    state: SchedulerState,
    stats: SchedulerStats,
}

impl Scheduler {
    /// Create an idle scheduler.
    pub fn new(config: RollbackConfig) -> Self {
        Self {
            config,
            state: SchedulerState::Idle,
            stats: SchedulerStats::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Counters so far. Still readable after `run` was cancelled.
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Configuration in use.
    pub fn config(&self) -> &RollbackConfig {
        &self.config
    }

    /// Run the schedule.
    ///
    /// Returns after the one occurrence in single-shot mode. In repeating mode
    /// it only returns on error; wrap it in a timeout.
    pub async fn run<P: Providers>(&mut self, providers: &P) -> SimulationResult<()> {
        match SchedulerMode::for_config(&self.config) {
            SchedulerMode::SingleShot => {
                let delay = single_shot_delay(&self.config, providers.random());
                tracing::debug!(?delay, "Single rollback scheduled");
                self.state = SchedulerState::Waiting;
                sleep(providers, delay).await?;

                self.fire(providers).await?;
                self.state = SchedulerState::Done;
                Ok(())
            }
            SchedulerMode::Repeating => {
                let mut arrivals =
                    PoissonArrivals::new(providers.time().now(), self.config.mean_delay());
                loop {
                    self.state = SchedulerState::Waiting;
                    let deadline = arrivals.next_deadline(providers.random());
                    let wait = deadline.saturating_sub(providers.time().now());
                    tracing::debug!(?deadline, "Next rollback scheduled");
                    sleep(providers, wait).await?;

                    self.fire(providers).await?;
                }
            }
        }
    }

    async fn fire<P: Providers>(&mut self, providers: &P) -> SimulationResult<()> {
        self.state = SchedulerState::Firing;
        self.stats.occurrences_started += 1;
        match run_occurrence(providers, &self.config).await? {
            OccurrenceOutcome::Completed(_) => self.stats.occurrences_completed += 1,
            OccurrenceOutcome::Skipped(_) => self.stats.occurrences_skipped += 1,
        }
        Ok(())
    }
}

async fn sleep<P: Providers>(providers: &P, duration: Duration) -> SimulationResult<()> {
    providers
        .time()
        .sleep(duration)
        .await
        .map_err(|_| SimulationError::SimulationShutdown)
}
