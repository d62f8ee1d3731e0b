//! Core simulation world and coordination logic.
//!
//! [`SimWorld`] owns logical time, the event queue, the fault state and the
//! process registry. Providers hold a [`WeakSimWorld`] so they never keep a
//! finished simulation alive.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    net::IpAddr,
    rc::{Rc, Weak},
    task::Waker,
    time::Duration,
};
use tracing::instrument;

use crate::{
    SimulationError, SimulationResult,
    providers::ClusterSnapshot,
    types::{NetworkAddress, ProcessRole},
};

use super::{
    events::{Event, EventQueue, ScheduledEvent},
    sleep::SleepFuture,
    state::{
        ClogMode, FaultKind, FaultRecord, FaultState, KillType, ProcessRegistry, ProcessState,
    },
};

/// Internal simulation state holder
#[derive(Debug, Default)]
pub(crate) struct SimInner {
    pub(crate) current_time: Duration,
    pub(crate) event_queue: EventQueue,
    pub(crate) next_sequence: u64,

    // Task management for sleep functionality
    pub(crate) next_task_id: u64,
    pub(crate) awakened_tasks: HashSet<u64>,
    // Sleeps dropped before their timer fired
    pub(crate) abandoned_tasks: HashSet<u64>,
    pub(crate) task_wakers: HashMap<u64, Waker>,

    pub(crate) faults: FaultState,
    pub(crate) processes: ProcessRegistry,

    pub(crate) events_processed: u64,
}

impl SimInner {
    fn schedule_at(&mut self, event: Event, time: Duration) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.event_queue
            .schedule(ScheduledEvent::new(time, event, sequence));
    }

    fn record(&mut self, fault: FaultKind) {
        let at = self.current_time;
        self.faults.log.push(FaultRecord { at, fault });
    }
}

/// The central simulation coordinator that manages time and event processing.
///
/// `SimWorld` owns all mutable simulation state behind `Rc<RefCell<_>>` and is
/// strictly single-threaded.
#[derive(Debug)]
pub struct SimWorld {
    pub(crate) inner: Rc<RefCell<SimInner>>,
}

impl SimWorld {
    /// Creates a new simulation world at time zero with no processes.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SimInner::default())),
        }
    }

    /// Processes the next scheduled event and advances time.
    ///
    /// Returns `true` if more events are available for processing.
    #[instrument(skip(self))]
    pub fn step(&mut self) -> bool {
        let mut inner = self.inner.borrow_mut();

        if let Some(scheduled_event) = inner.event_queue.pop_earliest() {
            inner.current_time = scheduled_event.time();
            let now = inner.current_time;
            inner.faults.clear_expired(now);

            Self::process_event_with_inner(&mut inner, scheduled_event.into_event());

            !inner.event_queue.is_empty()
        } else {
            false
        }
    }

    /// Processes every scheduled event until the queue is empty.
    #[instrument(skip(self))]
    pub fn run_until_empty(&mut self) {
        while self.step() {}
    }

    /// Returns the current simulation time.
    pub fn current_time(&self) -> Duration {
        self.inner.borrow().current_time
    }

    /// Returns the current simulation time (FDB's `now()`).
    pub fn now(&self) -> Duration {
        self.current_time()
    }

    /// Schedules an event to execute after the specified delay from the current time.
    pub fn schedule_event(&self, event: Event, delay: Duration) {
        let mut inner = self.inner.borrow_mut();
        let time = inner.current_time.saturating_add(delay);
        inner.schedule_at(event, time);
    }

    /// Schedules an event to execute at the specified absolute time.
    ///
    /// A time in the past is clamped to the current time.
    pub fn schedule_event_at(&self, event: Event, time: Duration) {
        let mut inner = self.inner.borrow_mut();
        let time = time.max(inner.current_time);
        inner.schedule_at(event, time);
    }

    /// Creates a weak reference to this simulation world.
    pub fn downgrade(&self) -> WeakSimWorld {
        WeakSimWorld {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Returns `true` if there are events waiting to be processed.
    pub fn has_pending_events(&self) -> bool {
        !self.inner.borrow().event_queue.is_empty()
    }

    /// Returns the number of events waiting to be processed.
    pub fn pending_event_count(&self) -> usize {
        self.inner.borrow().event_queue.len()
    }

    /// Returns `true` if only clog-expiry bookkeeping is left in the queue.
    pub fn has_only_infrastructure_events(&self) -> bool {
        self.inner.borrow().event_queue.has_only_infrastructure_events()
    }

    /// Number of events processed since creation.
    pub fn events_processed(&self) -> u64 {
        self.inner.borrow().events_processed
    }

    /// Create a time provider for this simulation.
    pub fn time_provider(&self) -> crate::providers::SimTimeProvider {
        crate::providers::SimTimeProvider::new(self.downgrade())
    }

    /// Sleep for the specified duration in simulation time.
    ///
    /// Returns a future that completes when the simulation time has advanced
    /// by `duration`.
    pub fn sleep(&self, duration: Duration) -> SleepFuture {
        let task_id = self.generate_task_id();
        self.schedule_event(Event::Timer { task_id }, duration);
        SleepFuture::new(self.downgrade(), task_id)
    }

    fn generate_task_id(&self) -> u64 {
        let mut inner = self.inner.borrow_mut();
        let task_id = inner.next_task_id;
        inner.next_task_id += 1;
        task_id
    }

    /// Consume the wake-up of `task_id`, if its timer has fired.
    pub(crate) fn take_task_wake(&self, task_id: u64) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.awakened_tasks.remove(&task_id) {
            inner.task_wakers.remove(&task_id);
            true
        } else {
            false
        }
    }

    /// Forget a sleep that will never be polled again.
    pub(crate) fn release_task(&self, task_id: u64) {
        let Ok(mut inner) = self.inner.try_borrow_mut() else {
            return;
        };
        inner.task_wakers.remove(&task_id);
        if !inner.awakened_tasks.remove(&task_id) {
            inner.abandoned_tasks.insert(task_id);
        }
    }

    /// Number of timer wake-ups and registrations still tracked.
    pub fn tracked_task_count(&self) -> usize {
        let inner = self.inner.borrow();
        inner.awakened_tasks.len() + inner.abandoned_tasks.len() + inner.task_wakers.len()
    }

    pub(crate) fn register_task_waker(&self, task_id: u64, waker: Waker) {
        self.inner.borrow_mut().task_wakers.insert(task_id, waker);
    }

    fn process_event_with_inner(inner: &mut SimInner, event: Event) {
        inner.events_processed += 1;

        match event {
            Event::Timer { task_id } => {
                if inner.abandoned_tasks.remove(&task_id) {
                    return;
                }
                inner.awakened_tasks.insert(task_id);
                if let Some(waker) = inner.task_wakers.remove(&task_id) {
                    waker.wake();
                }
            }
            Event::ClogExpired => {
                // Expired clogs were already pruned when time advanced.
                tracing::trace!(now = ?inner.current_time, "Clog expiry processed");
            }
        }
    }

    // Process registry

    /// Register a live process under `address`.
    ///
    /// Re-registering an address revives it with the new role.
    pub fn register_process(&self, address: NetworkAddress, role: ProcessRole) {
        self.inner.borrow_mut().processes.processes.insert(
            address,
            ProcessState {
                role,
                dead: false,
                reboots: 0,
            },
        );
        tracing::debug!(%address, ?role, "Registered process");
    }

    /// Whether a process is registered at `address` and not killed.
    pub fn is_process_alive(&self, address: &NetworkAddress) -> bool {
        self.inner
            .borrow()
            .processes
            .processes
            .get(address)
            .is_some_and(|p| !p.dead)
    }

    /// Number of reboots the process at `address` went through.
    pub fn reboot_count(&self, address: &NetworkAddress) -> u32 {
        self.inner
            .borrow()
            .processes
            .processes
            .get(address)
            .map_or(0, |p| p.reboots)
    }

    /// Point-in-time view of the live coordinators and replicas.
    pub fn cluster_snapshot(&self) -> ClusterSnapshot {
        let inner = self.inner.borrow();
        ClusterSnapshot::new(
            inner.processes.live_with_role(ProcessRole::Coordinator),
            inner.processes.live_with_role(ProcessRole::Replica),
        )
    }

    // Fault injection

    /// Clog traffic from `from` to `to` for `duration`.
    pub fn clog_pair(&self, from: IpAddr, to: IpAddr, duration: Duration) {
        let mut inner = self.inner.borrow_mut();
        let expires_at = inner.current_time.saturating_add(duration);
        inner.faults.clog_link(from, to, expires_at);
        inner.schedule_at(Event::ClogExpired, expires_at);
        inner.record(FaultKind::LinkClog { from, to, duration });

        tracing::debug!("Clogged {} -> {} until {:?}", from, to, expires_at);
    }

    /// Clog the interface of host `ip` for `duration`.
    pub fn clog_interface(&self, ip: IpAddr, duration: Duration, mode: ClogMode) {
        let mut inner = self.inner.borrow_mut();
        let expires_at = inner.current_time.saturating_add(duration);
        inner.faults.clog_interface(ip, mode, expires_at);
        inner.schedule_at(Event::ClogExpired, expires_at);
        inner.record(FaultKind::InterfaceClog { ip, duration, mode });

        tracing::debug!("Clogged interface {} ({:?}) until {:?}", ip, mode, expires_at);
    }

    /// Terminate the process at `address`.
    ///
    /// Returns `false` (and records nothing) when no live process is registered
    /// there.
    pub fn kill_process(&self, address: &NetworkAddress, kill_type: KillType) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(process) = inner
            .processes
            .processes
            .get_mut(address)
            .filter(|p| !p.dead)
        else {
            tracing::warn!(%address, "Kill requested for unknown or dead process");
            return false;
        };

        match kill_type {
            KillType::Instant => process.dead = true,
            KillType::Reboot => process.reboots += 1,
        }
        inner.record(FaultKind::Kill {
            address: *address,
            kill_type,
        });

        tracing::debug!(%address, ?kill_type, "Killed process");
        true
    }

    /// Whether traffic from `from` to `to` is currently clogged.
    pub fn is_clogged(&self, from: IpAddr, to: IpAddr) -> bool {
        let inner = self.inner.borrow();
        inner.faults.is_clogged(from, to, inner.current_time)
    }

    /// Every fault issued so far, in issue order.
    pub fn fault_log(&self) -> Vec<FaultRecord> {
        self.inner.borrow().faults.log.clone()
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak reference to a simulation world.
///
/// Every forwarding method fails with `SimulationShutdown` once the world is
/// dropped.
#[derive(Debug, Clone)]
pub struct WeakSimWorld {
    pub(crate) inner: Weak<RefCell<SimInner>>,
}

/// Generates WeakSimWorld forwarding methods that wrap SimWorld results.
macro_rules! weak_forward {
    (wrap $(#[$meta:meta])* $method:ident(&self $(, $arg:ident : $arg_ty:ty)*) -> $ret:ty) => {
        $(#[$meta])*
        pub fn $method(&self $(, $arg: $arg_ty)*) -> SimulationResult<$ret> {
            Ok(self.upgrade()?.$method($($arg),*))
        }
    };
    (unit $(#[$meta:meta])* $method:ident(&self $(, $arg:ident : $arg_ty:ty)*)) => {
        $(#[$meta])*
        pub fn $method(&self $(, $arg: $arg_ty)*) -> SimulationResult<()> {
            self.upgrade()?.$method($($arg),*);
            Ok(())
        }
    };
}

impl WeakSimWorld {
    /// Attempts to upgrade this weak reference to a strong reference.
    pub fn upgrade(&self) -> SimulationResult<SimWorld> {
        self.inner
            .upgrade()
            .map(|inner| SimWorld { inner })
            .ok_or(SimulationError::SimulationShutdown)
    }

    weak_forward!(wrap #[doc = "Returns the current simulation time."] now(&self) -> Duration);
    weak_forward!(wrap #[doc = "Sleep for the specified duration in simulation time."] sleep(&self, duration: Duration) -> SleepFuture);
    weak_forward!(unit #[doc = "Schedules an event to execute after the specified delay."] schedule_event(&self, event: Event, delay: Duration));
    weak_forward!(wrap #[doc = "Point-in-time view of the live coordinators and replicas."] cluster_snapshot(&self) -> ClusterSnapshot);
    weak_forward!(unit #[doc = "Clog traffic from `from` to `to` for `duration`."] clog_pair(&self, from: IpAddr, to: IpAddr, duration: Duration));
    weak_forward!(unit #[doc = "Clog the interface of host `ip` for `duration`."] clog_interface(&self, ip: IpAddr, duration: Duration, mode: ClogMode));
    weak_forward!(wrap #[doc = "Terminate the process at `address`."] kill_process(&self, address: &NetworkAddress, kill_type: KillType) -> bool);
}
