//! Fault and process state for the simulation.
//!
//! Clogs are keyed by host (IP) and expire on their own; nothing in the
//! simulation ever lifts a clog early. Killed processes stay dead.

use std::{
    collections::{BTreeMap, HashMap},
    net::IpAddr,
    time::Duration,
};

use crate::types::{NetworkAddress, ProcessRole};

/// Which directions of a host interface a clog affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClogMode {
    /// Outbound traffic only.
    Send,
    /// Inbound traffic only.
    Receive,
    /// Inbound and outbound traffic.
    All,
}

/// How a process is terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KillType {
    /// Immediate, non-graceful termination.
    Instant,
    /// Termination followed by a restart of the same process.
    Reboot,
}

/// A fault command issued to the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    /// Directional clog on the path `from -> to`.
    LinkClog {
        /// Sending host.
        from: IpAddr,
        /// Receiving host.
        to: IpAddr,
        /// How long the clog lasts.
        duration: Duration,
    },
    /// Clog on every link of one host.
    InterfaceClog {
        /// The clogged host.
        ip: IpAddr,
        /// How long the clog lasts.
        duration: Duration,
        /// Affected directions.
        mode: ClogMode,
    },
    /// Process termination.
    Kill {
        /// The terminated process.
        address: NetworkAddress,
        /// How it was terminated.
        kill_type: KillType,
    },
}

/// One entry of the fault log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultRecord {
    /// Simulation time at which the fault was issued.
    pub at: Duration,
    /// The issued fault.
    pub fault: FaultKind,
}

/// Interface clog expiry per direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterfaceClogState {
    /// Outbound traffic blocked until this time.
    pub send_until: Option<Duration>,
    /// Inbound traffic blocked until this time.
    pub recv_until: Option<Duration>,
}

/// Active clogs plus the append-only log of issued faults.
#[derive(Debug, Default)]
pub struct FaultState {
    /// Directional link clogs, `(from, to) -> expires_at`.
    pub link_clogs: HashMap<(IpAddr, IpAddr), Duration>,
    /// Interface clogs by host.
    pub interface_clogs: HashMap<IpAddr, InterfaceClogState>,
    /// Every fault issued so far, in issue order.
    pub log: Vec<FaultRecord>,
}

impl FaultState {
    /// Extend a link clog; an existing later expiry wins.
    pub fn clog_link(&mut self, from: IpAddr, to: IpAddr, expires_at: Duration) {
        let entry = self.link_clogs.entry((from, to)).or_insert(expires_at);
        *entry = (*entry).max(expires_at);
    }

    /// Extend an interface clog for the directions covered by `mode`.
    pub fn clog_interface(&mut self, ip: IpAddr, mode: ClogMode, expires_at: Duration) {
        let state = self.interface_clogs.entry(ip).or_default();
        let extend = |slot: &mut Option<Duration>| {
            *slot = Some(slot.map_or(expires_at, |current| current.max(expires_at)));
        };
        if matches!(mode, ClogMode::Send | ClogMode::All) {
            extend(&mut state.send_until);
        }
        if matches!(mode, ClogMode::Receive | ClogMode::All) {
            extend(&mut state.recv_until);
        }
    }

    /// Whether traffic `from -> to` is blocked at time `now`.
    pub fn is_clogged(&self, from: IpAddr, to: IpAddr, now: Duration) -> bool {
        let active = |until: Option<Duration>| until.is_some_and(|t| now < t);

        if active(self.link_clogs.get(&(from, to)).copied()) {
            return true;
        }
        let sender_clogged = self
            .interface_clogs
            .get(&from)
            .is_some_and(|s| active(s.send_until));
        let receiver_clogged = self
            .interface_clogs
            .get(&to)
            .is_some_and(|s| active(s.recv_until));
        sender_clogged || receiver_clogged
    }

    /// Drop every clog that expired at or before `now`.
    pub fn clear_expired(&mut self, now: Duration) {
        self.link_clogs.retain(|_, expires_at| now < *expires_at);
        for state in self.interface_clogs.values_mut() {
            if state.send_until.is_some_and(|t| now >= t) {
                state.send_until = None;
            }
            if state.recv_until.is_some_and(|t| now >= t) {
                state.recv_until = None;
            }
        }
        self.interface_clogs
            .retain(|_, s| s.send_until.is_some() || s.recv_until.is_some());
    }
}

/// A registered simulated process.
#[derive(Debug, Clone)]
pub struct ProcessState {
    /// Role in the commit pipeline.
    pub role: ProcessRole,
    /// Whether the process has been killed.
    pub dead: bool,
    /// Number of times the process was rebooted.
    pub reboots: u32,
}

/// Registry of simulated processes.
///
/// Ordered by address so snapshots come out in a stable order.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    pub(crate) processes: BTreeMap<NetworkAddress, ProcessState>,
}

impl ProcessRegistry {
    /// Live processes with the given role, in address order.
    pub fn live_with_role(&self, role: ProcessRole) -> Vec<NetworkAddress> {
        self.processes
            .iter()
            .filter(|(_, p)| p.role == role && !p.dead)
            .map(|(addr, _)| *addr)
            .collect()
    }
}
