//! Fault injection provider.
//!
//! A command-only sink: calls return once the fault is registered, nothing
//! waits for it to take effect or expire.

use std::net::IpAddr;
use std::time::Duration;

use crate::SimulationResult;
use crate::sim::{ClogMode, KillType, WeakSimWorld};
use crate::types::NetworkAddress;

/// Provider trait for network and process faults.
pub trait FaultProvider: Clone {
    /// Clog traffic from host `from` to host `to` for `duration`.
    fn clog_pair(&self, from: IpAddr, to: IpAddr, duration: Duration) -> SimulationResult<()>;

    /// Clog the interface of host `ip` for `duration`.
    fn clog_interface(&self, ip: IpAddr, duration: Duration, mode: ClogMode)
    -> SimulationResult<()>;

    /// Terminate the process at `address`.
    ///
    /// Terminating a process that is already gone is not an error.
    fn kill_process(&self, address: &NetworkAddress, kill_type: KillType)
    -> SimulationResult<()>;
}

/// Fault provider backed by a [`SimWorld`](crate::SimWorld).
#[derive(Debug, Clone)]
pub struct SimFaultProvider {
    sim: WeakSimWorld,
}

impl SimFaultProvider {
    /// Create a new simulation fault provider.
    pub fn new(sim: WeakSimWorld) -> Self {
        Self { sim }
    }
}

impl FaultProvider for SimFaultProvider {
    fn clog_pair(&self, from: IpAddr, to: IpAddr, duration: Duration) -> SimulationResult<()> {
        self.sim.clog_pair(from, to, duration)
    }

    fn clog_interface(
        &self,
        ip: IpAddr,
        duration: Duration,
        mode: ClogMode,
    ) -> SimulationResult<()> {
        self.sim.clog_interface(ip, duration, mode)
    }

    fn kill_process(
        &self,
        address: &NetworkAddress,
        kill_type: KillType,
    ) -> SimulationResult<()> {
        self.sim.kill_process(address, kill_type).map(|_| ())
    }
}
