use rollback_sim::{SimWorld, SimulationError, TimeError, TimeProvider};
use std::time::Duration;

#[tokio::test]
async fn test_basic_sleep() {
    let mut sim = SimWorld::new();

    let sleep_future = sim.sleep(Duration::from_millis(100));
    assert_eq!(sim.current_time(), Duration::ZERO);
    assert_eq!(sim.pending_event_count(), 1);

    sim.run_until_empty();
    assert_eq!(sim.current_time(), Duration::from_millis(100));

    sleep_future.await.expect("sleep should complete");
}

#[tokio::test]
async fn test_multiple_sleeps_sequential() {
    let mut sim = SimWorld::new();

    let sleep1 = sim.sleep(Duration::from_millis(50));
    sim.run_until_empty();
    sleep1.await.expect("first sleep");
    assert_eq!(sim.current_time(), Duration::from_millis(50));

    // Second sleep is relative to the advanced clock.
    let sleep2 = sim.sleep(Duration::from_millis(30));
    sim.run_until_empty();
    sleep2.await.expect("second sleep");
    assert_eq!(sim.current_time(), Duration::from_millis(80));
}

#[tokio::test]
async fn test_multiple_sleeps_concurrent() {
    let mut sim = SimWorld::new();

    let sleep1 = sim.sleep(Duration::from_millis(100));
    let sleep2 = sim.sleep(Duration::from_millis(50));
    let sleep3 = sim.sleep(Duration::from_millis(150));
    assert_eq!(sim.pending_event_count(), 3);

    sim.run_until_empty();
    assert_eq!(sim.current_time(), Duration::from_millis(150));

    let (r1, r2, r3) = tokio::join!(sleep1, sleep2, sleep3);
    assert!(r1.is_ok() && r2.is_ok() && r3.is_ok());
}

#[tokio::test]
async fn test_sleep_fails_after_world_dropped() {
    let sim = SimWorld::new();
    let sleep_future = sim.sleep(Duration::from_secs(1));
    drop(sim);

    assert_eq!(sleep_future.await, Err(SimulationError::SimulationShutdown));
}

#[tokio::test]
async fn test_timeout_ready_future_wins() {
    let sim = SimWorld::new();
    let time = sim.time_provider();

    assert_eq!(time.timeout(Duration::ZERO, async { 7 }).await, Ok(7));
    // The unused timer still sits in the queue.
    assert_eq!(sim.pending_event_count(), 1);
}

#[tokio::test]
async fn test_time_provider_after_shutdown() {
    let sim = SimWorld::new();
    let time = sim.time_provider();
    drop(sim);

    assert_eq!(
        time.timeout(Duration::from_secs(1), async { 7 }).await,
        Err(TimeError::Shutdown)
    );
}

#[tokio::test]
async fn test_completed_sleeps_leave_no_bookkeeping() {
    let mut sim = SimWorld::new();

    let sleeps: Vec<_> = (1..=50)
        .map(|ms| sim.sleep(Duration::from_millis(ms)))
        .collect();
    sim.run_until_empty();
    for sleep in sleeps {
        sleep.await.expect("sleep");
    }

    assert_eq!(sim.tracked_task_count(), 0);
}

#[tokio::test]
async fn test_dropped_sleeps_leave_no_bookkeeping() {
    let mut sim = SimWorld::new();

    // Dropped before its timer fires.
    let early = sim.sleep(Duration::from_millis(100));
    drop(early);
    assert_eq!(sim.tracked_task_count(), 1);

    // Dropped after its timer fired but before it was polled.
    let late = sim.sleep(Duration::from_millis(10));
    sim.run_until_empty();
    assert_eq!(sim.current_time(), Duration::from_millis(100));
    drop(late);

    assert_eq!(sim.tracked_task_count(), 0);
}
