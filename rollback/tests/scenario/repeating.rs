use std::time::Duration;

use rollback::RollbackWorkload;
use rollback_sim::FaultKind;

use crate::topology::{C1, R1, R2, R3, config, fault_pattern, kills, metric, run_one, world};

#[test]
fn test_occurrences_never_overlap() {
    let sim = world(&[C1], &[R1, R2, R3]);
    let workload = RollbackWorkload::new(config(&[
        ("meanDelay", "1.0"),
        ("clogDuration", "1.5"),
        ("testDuration", "60"),
    ]));

    let report = run_one(sim, 21, workload);
    assert!(report.is_success(), "{report}");

    // Every occurrence is two link clogs then two interface clogs; the last
    // one may be cut short by the test bound.
    let pattern = fault_pattern(&report.faults);
    let full = pattern.matches("LLII").count();
    let rest = pattern.replace("LLII", "");
    assert!(full > 5, "only {full} occurrences in 60s");
    assert!(rest.is_empty() || rest == "LL", "unexpected pattern {pattern}");

    // Escalation lands exactly clog / 3 after its partition.
    for chunk in report.faults.chunks(4).filter(|c| c.len() == 4) {
        assert_eq!(chunk[2].at, chunk[0].at + Duration::from_millis(500));
    }

    let started = metric(&report, "occurrences_started");
    let completed = metric(&report, "occurrences_completed");
    assert_eq!(completed, full as f64);
    assert!(started - completed <= 1.0);
    assert!(report.faults.iter().all(|r| r.at < Duration::from_secs(60)));
}

#[test]
fn test_killed_coordinator_leaves_later_occurrences_without_candidates() {
    let sim = world(&[C1], &[R1, R2, R3]);
    let workload = RollbackWorkload::new(config(&[
        ("meanDelay", "1.0"),
        ("clogDuration", "1.0"),
        ("testDuration", "40"),
        ("aggressiveFailures", "true"),
    ]));

    let report = run_one(sim, 13, workload);
    assert!(report.is_success(), "{report}");

    assert_eq!(kills(&report.faults).len(), 1);
    assert_eq!(fault_pattern(&report.faults), "LLKI");
    assert_eq!(metric(&report, "occurrences_completed"), 1.0);
    assert!(metric(&report, "occurrences_skipped") >= 1.0);
}

#[test]
fn test_repeating_mode_respects_test_bound() {
    let sim = world(&[C1], &[R1, R2, R3]);
    let workload = RollbackWorkload::new(config(&[("meanDelay", "0.5"), ("testDuration", "10")]));

    let report = run_one(sim, 4, workload);
    assert!(report.is_success(), "{report}");
    assert!(
        report
            .faults
            .iter()
            .filter(|r| matches!(r.fault, FaultKind::LinkClog { .. }))
            .all(|r| r.at < Duration::from_secs(10))
    );
}
