//! Provider traits and their simulation implementations.
//!
//! Code under test only sees the traits; the simulation hands it a
//! [`SimProviders`] bundle. Nothing is reached through ambient globals.

mod cluster;
mod fault;
mod random;
mod time;

pub use cluster::{ClusterProvider, ClusterSnapshot, SimClusterProvider};
pub use fault::{FaultProvider, SimFaultProvider};
pub use random::{RandomProvider, SimRandomProvider};
pub use time::{SimTimeProvider, TimeError, TimeProvider};

use crate::sim::WeakSimWorld;

/// Bundle of all provider types for a runtime environment.
///
/// Collapses four type parameters into one:
///
/// ```text
/// struct MyStruct<P: Providers>
/// ```
pub trait Providers: Clone + 'static {
    /// Time provider type for sleep, timeout, and time queries.
    type Time: TimeProvider + Clone + 'static;

    /// Random provider type for deterministic randomness.
    type Random: RandomProvider + Clone + 'static;

    /// Fault provider type for clogs and process kills.
    type Faults: FaultProvider + Clone + 'static;

    /// Cluster provider type for topology snapshots.
    type Cluster: ClusterProvider + Clone + 'static;

    /// Get the time provider instance.
    fn time(&self) -> &Self::Time;

    /// Get the random provider instance.
    fn random(&self) -> &Self::Random;

    /// Get the fault provider instance.
    fn faults(&self) -> &Self::Faults;

    /// Get the cluster provider instance.
    fn cluster(&self) -> &Self::Cluster;
}

/// Simulation providers bundle for deterministic testing.
///
/// ```rust
/// use rollback_sim::{Providers, SimProviders, SimWorld, TimeProvider};
///
/// let sim = SimWorld::new();
/// let providers = SimProviders::new(sim.downgrade(), 42);
/// assert_eq!(providers.time().now(), std::time::Duration::ZERO);
/// ```
#[derive(Debug, Clone)]
pub struct SimProviders {
    time: SimTimeProvider,
    random: SimRandomProvider,
    faults: SimFaultProvider,
    cluster: SimClusterProvider,
}

impl SimProviders {
    /// Create a new simulation providers bundle.
    ///
    /// # Arguments
    ///
    /// * `sim` - Weak reference to the simulation world
    /// * `seed` - Seed for deterministic random number generation
    pub fn new(sim: WeakSimWorld, seed: u64) -> Self {
        Self {
            time: SimTimeProvider::new(sim.clone()),
            random: SimRandomProvider::new(seed),
            faults: SimFaultProvider::new(sim.clone()),
            cluster: SimClusterProvider::new(sim),
        }
    }
}

impl Providers for SimProviders {
    type Time = SimTimeProvider;
    type Random = SimRandomProvider;
    type Faults = SimFaultProvider;
    type Cluster = SimClusterProvider;

    fn time(&self) -> &Self::Time {
        &self.time
    }

    fn random(&self) -> &Self::Random {
        &self.random
    }

    fn faults(&self) -> &Self::Faults {
        &self.faults
    }

    fn cluster(&self) -> &Self::Cluster {
        &self.cluster
    }
}
