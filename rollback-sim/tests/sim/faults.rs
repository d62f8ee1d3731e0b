use rollback_sim::{
    ClogMode, ClusterProvider, FaultKind, FaultProvider, KillType, NetworkAddress, ProcessRole,
    Providers, SimProviders, SimWorld, SimulationError,
};
use std::net::IpAddr;
use std::time::Duration;

fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid ip")
}

fn addr(s: &str) -> NetworkAddress {
    s.parse().expect("valid address")
}

#[test]
fn test_link_clog_is_directional() {
    let sim = SimWorld::new();
    let (a, b) = (ip("10.0.0.1"), ip("10.0.0.2"));

    sim.clog_pair(a, b, Duration::from_secs(3));

    assert!(sim.is_clogged(a, b));
    assert!(!sim.is_clogged(b, a));
}

#[test]
fn test_interface_clog_modes() {
    let sim = SimWorld::new();
    let (a, b, c) = (ip("10.0.0.1"), ip("10.0.0.2"), ip("10.0.0.3"));

    sim.clog_interface(a, Duration::from_secs(1), ClogMode::Send);
    sim.clog_interface(b, Duration::from_secs(1), ClogMode::Receive);
    sim.clog_interface(c, Duration::from_secs(1), ClogMode::All);

    assert!(sim.is_clogged(a, b));
    assert!(!sim.is_clogged(b, a));
    assert!(sim.is_clogged(c, ip("10.0.0.9")));
    assert!(sim.is_clogged(ip("10.0.0.9"), c));
    assert!(sim.is_clogged(ip("10.0.0.9"), b));
    assert!(!sim.is_clogged(b, ip("10.0.0.9")));
}

#[test]
fn test_overlapping_clogs_keep_latest_expiry() {
    let mut sim = SimWorld::new();
    let (a, b) = (ip("10.0.0.1"), ip("10.0.0.2"));

    sim.clog_pair(a, b, Duration::from_secs(5));
    sim.clog_pair(a, b, Duration::from_secs(2));

    // Step to the first expiry at 2s: the 5s clog still holds.
    sim.step();
    assert_eq!(sim.current_time(), Duration::from_secs(2));
    assert!(sim.is_clogged(a, b));

    sim.run_until_empty();
    assert_eq!(sim.current_time(), Duration::from_secs(5));
    assert!(!sim.is_clogged(a, b));
}

#[test]
fn test_fault_log_records_issue_time() {
    let mut sim = SimWorld::new();
    let replica = addr("10.0.0.2:4500");
    sim.register_process(replica, ProcessRole::Replica);

    let timer = sim.sleep(Duration::from_secs(4));
    sim.run_until_empty();
    drop(timer);

    sim.clog_interface(replica.ip, Duration::from_secs(1), ClogMode::All);
    sim.kill_process(&replica, KillType::Instant);

    let log = sim.fault_log();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|r| r.at == Duration::from_secs(4)));
    assert_eq!(
        log[1].fault,
        FaultKind::Kill {
            address: replica,
            kill_type: KillType::Instant,
        }
    );
}

#[test]
fn test_providers_reach_the_world() {
    let sim = SimWorld::new();
    let coordinator = addr("10.0.0.1:4500");
    let replica = addr("10.0.0.2:4500");
    sim.register_process(coordinator, ProcessRole::Coordinator);
    sim.register_process(replica, ProcessRole::Replica);

    let providers = SimProviders::new(sim.downgrade(), 1);
    let snapshot = providers.cluster().snapshot().expect("snapshot");
    assert_eq!(snapshot.coordinators(), &[coordinator]);
    assert_eq!(snapshot.replicas(), &[replica]);

    providers
        .faults()
        .clog_pair(coordinator.ip, replica.ip, Duration::from_secs(3))
        .expect("clog");
    assert!(sim.is_clogged(coordinator.ip, replica.ip));

    // Killing an unknown process is not an error.
    providers
        .faults()
        .kill_process(&addr("10.0.0.9:1"), KillType::Instant)
        .expect("kill no-op");
    assert_eq!(sim.fault_log().len(), 1);

    drop(sim);
    assert_eq!(
        providers.cluster().snapshot(),
        Err(SimulationError::SimulationShutdown)
    );
}
