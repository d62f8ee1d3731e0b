//! Cluster topology provider.

use crate::SimulationResult;
use crate::sim::WeakSimWorld;
use crate::types::NetworkAddress;

/// Immutable point-in-time view of the commit pipeline's processes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSnapshot {
    coordinators: Vec<NetworkAddress>,
    replicas: Vec<NetworkAddress>,
}

impl ClusterSnapshot {
    /// Build a snapshot from explicit coordinator and replica lists.
    pub fn new(coordinators: Vec<NetworkAddress>, replicas: Vec<NetworkAddress>) -> Self {
        Self {
            coordinators,
            replicas,
        }
    }

    /// Processes that can be killed to trigger recovery.
    pub fn coordinators(&self) -> &[NetworkAddress] {
        &self.coordinators
    }

    /// Processes holding the replicated log.
    pub fn replicas(&self) -> &[NetworkAddress] {
        &self.replicas
    }
}

/// Provider trait for reading the current cluster topology.
pub trait ClusterProvider: Clone {
    /// Read the topology as it is right now.
    fn snapshot(&self) -> SimulationResult<ClusterSnapshot>;
}

/// Cluster provider reading the live process registry of a simulation.
#[derive(Debug, Clone)]
pub struct SimClusterProvider {
    sim: WeakSimWorld,
}

impl SimClusterProvider {
    /// Create a new simulation cluster provider.
    pub fn new(sim: WeakSimWorld) -> Self {
        Self { sim }
    }
}

impl ClusterProvider for SimClusterProvider {
    fn snapshot(&self) -> SimulationResult<ClusterSnapshot> {
        self.sim.cluster_snapshot()
    }
}
