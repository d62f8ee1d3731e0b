//! Topology sampling.
//!
//! Picks the coordinator to cut off, the one replica left reachable from it
//! (the survivor), and the replicas that get partitioned away.

use std::time::Duration;

use rollback_sim::{ClusterSnapshot, NetworkAddress, RandomProvider};
use thiserror::Error;

/// The processes one occurrence targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultPlan {
    /// Coordinator cut off from every replica except the survivor.
    pub coordinator: NetworkAddress,
    /// Replica left reachable from the coordinator during the partition.
    pub survivor: NetworkAddress,
    /// Every other replica, in snapshot order.
    pub other_replicas: Vec<NetworkAddress>,
    /// Duration of each fault in this occurrence.
    pub clog_duration: Duration,
}

/// Why a snapshot could not produce a [`FaultPlan`].
///
/// Both are normal outcomes on an unfavorable topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AbortReason {
    /// No coordinator or no replica to target.
    #[error("no candidates")]
    NoCandidates,
    /// A partitioned replica shares its host with the coordinator, so the
    /// link fault between them cannot separate them.
    #[error("shared host")]
    SharedHost,
}

/// Sample a fault plan from `snapshot`.
///
/// Draws the coordinator first, then the survivor index. The survivor itself
/// may share the coordinator's host.
pub fn sample<R: RandomProvider>(
    snapshot: &ClusterSnapshot,
    clog_duration: Duration,
    random: &R,
) -> Result<FaultPlan, AbortReason> {
    let coordinators = snapshot.coordinators();
    let replicas = snapshot.replicas();
    if coordinators.is_empty() || replicas.is_empty() {
        return Err(AbortReason::NoCandidates);
    }

    let coordinator = coordinators[random.random_range(0..coordinators.len())];
    let survivor_index = random.random_range(0..replicas.len());

    let other_replicas: Vec<NetworkAddress> = replicas
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != survivor_index)
        .map(|(_, addr)| *addr)
        .collect();

    if other_replicas.iter().any(|r| r.same_host(&coordinator)) {
        return Err(AbortReason::SharedHost);
    }

    Ok(FaultPlan {
        coordinator,
        survivor: replicas[survivor_index],
        other_replicas,
        clog_duration,
    })
}
