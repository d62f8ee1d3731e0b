//! Simulation context provided to workloads.

use crate::providers::{
    Providers, SimClusterProvider, SimFaultProvider, SimProviders, SimRandomProvider,
    SimTimeProvider,
};

/// Context provided to each workload during simulation.
///
/// Bundles the providers with the workload's position among its peers.
/// FDB workloads use `client_id` to elect the single instance that drives
/// cluster-wide faults.
#[derive(Debug, Clone)]
pub struct SimContext {
    providers: SimProviders,
    client_id: usize,
    client_count: usize,
}

impl SimContext {
    /// Create a new simulation context.
    pub fn new(providers: SimProviders, client_id: usize, client_count: usize) -> Self {
        Self {
            providers,
            client_id,
            client_count,
        }
    }

    /// Get the bundled simulation providers.
    pub fn providers(&self) -> &SimProviders {
        &self.providers
    }

    /// Get the time provider.
    pub fn time(&self) -> &SimTimeProvider {
        self.providers.time()
    }

    /// Get the random provider.
    pub fn random(&self) -> &SimRandomProvider {
        self.providers.random()
    }

    /// Get the fault provider.
    pub fn faults(&self) -> &SimFaultProvider {
        self.providers.faults()
    }

    /// Get the cluster provider.
    pub fn cluster(&self) -> &SimClusterProvider {
        self.providers.cluster()
    }

    /// Index of this workload instance, starting at 0.
    pub fn client_id(&self) -> usize {
        self.client_id
    }

    /// Number of workload instances in the simulation.
    pub fn client_count(&self) -> usize {
        self.client_count
    }
}
