//! Cluster fixtures and fault-log helpers shared by the scenarios.

use rollback::{RollbackConfig, WorkloadOptions};
use rollback_sim::{
    ClogMode, FaultKind, FaultRecord, KillType, NetworkAddress, ProcessRole, SimWorld,
    SimulationReport, SimulationRunner, Workload, run_simulation,
};

pub const C1: &str = "10.0.1.1:4500";
pub const R1: &str = "10.0.2.1:4500";
pub const R2: &str = "10.0.2.2:4500";
pub const R3: &str = "10.0.2.3:4500";

pub fn addr(s: &str) -> NetworkAddress {
    s.parse().expect("valid address")
}

/// A world with the given coordinators and replicas registered.
pub fn world(coordinators: &[&str], replicas: &[&str]) -> SimWorld {
    let sim = SimWorld::new();
    for c in coordinators {
        sim.register_process(addr(c), ProcessRole::Coordinator);
    }
    for r in replicas {
        sim.register_process(addr(r), ProcessRole::Replica);
    }
    sim
}

pub fn config(pairs: &[(&str, &str)]) -> RollbackConfig {
    RollbackConfig::from_options(&WorkloadOptions::from_pairs(pairs.iter().copied()))
        .expect("valid options")
}

/// Run a single workload.
pub fn run_one(sim: SimWorld, seed: u64, workload: impl Workload) -> SimulationReport {
    run_simulation(SimulationRunner::new(sim, seed).workload(workload))
        .expect("simulation should run")
}

pub fn link_clogs(faults: &[FaultRecord]) -> Vec<&FaultRecord> {
    faults
        .iter()
        .filter(|r| matches!(r.fault, FaultKind::LinkClog { .. }))
        .collect()
}

pub fn interface_clogs(faults: &[FaultRecord]) -> Vec<&FaultRecord> {
    faults
        .iter()
        .filter(|r| {
            matches!(
                r.fault,
                FaultKind::InterfaceClog {
                    mode: ClogMode::All,
                    ..
                }
            )
        })
        .collect()
}

pub fn kills(faults: &[FaultRecord]) -> Vec<&FaultRecord> {
    faults
        .iter()
        .filter(|r| {
            matches!(
                r.fault,
                FaultKind::Kill {
                    kill_type: KillType::Instant,
                    ..
                }
            )
        })
        .collect()
}

/// One letter per fault: `L` link clog, `I` interface clog, `K` kill.
pub fn fault_pattern(faults: &[FaultRecord]) -> String {
    faults
        .iter()
        .map(|r| match r.fault {
            FaultKind::LinkClog { .. } => 'L',
            FaultKind::InterfaceClog { .. } => 'I',
            FaultKind::Kill { .. } => 'K',
        })
        .collect()
}

pub fn metric(report: &SimulationReport, name: &str) -> f64 {
    report.workloads[0]
        .metrics
        .iter()
        .find(|m| m.name == name)
        .map(|m| m.value)
        .unwrap_or_else(|| panic!("missing metric {name}"))
}
