//! YAML-driven simulation runs: configuration parsing wired through the
//! scheduler and the simulation clock, the way the binary runs it.

use integration_tests::{build_scheduler, init_test_logging, run_closed_loop};
use lteasim_common::config::{PlacementKind, SimulationConfig, StrategyKind};
use lteasim_common::sim_tick::SimulationClock;
use lteasim_common::types::UserId;
use lteasim_mac::models::{FiniteQueue, FullBufferQueue};
use tracing::info;

#[test]
fn test_yaml_round_robin_simulation_runs_clean() {
    init_test_logging();

    let yaml = r"
time:
  tti_duration_ms: 1
  total_ticks: 50
num_users: 3
seed: 7
mac:
  num_prbs: 25
  tx_power_dbm_per_prb: 29.0
  pdcch_length: 3
  link_adaptation:
    threshold_db: 3.0
  strategy:
    kind: RoundRobin
    prbs_per_user: 8
";
    let config = SimulationConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.num_users, 3);
    assert_eq!(config.mac.num_prbs, 25);

    let sinrs: Vec<(u32, f64)> = vec![(0, 18.0), (1, 12.0), (2, 8.0)];
    let mut scheduler = build_scheduler(
        &config.mac,
        &sinrs,
        Box::new(FullBufferQueue::new(1_000_000)),
    );

    let mut clock = SimulationClock::new(config.time);
    let mut total_grants = 0usize;
    while !clock.is_complete() {
        let tti = clock.current_tick();
        let result = scheduler.run_tti(tti);
        total_grants += result.grants.len();
        for block in result.transmissions {
            scheduler.receive_and_decode(block, tti);
        }
        clock.tick();
    }

    let harq = scheduler.harq();
    info!(
        total_grants,
        acks = harq.total_acks(),
        "yaml-driven run finished"
    );
    assert_eq!(clock.current_tick().value(), 50);
    assert!(total_grants > 0);
    assert!(harq.total_acks() > 0);
    // 3 dB backoff over static channels: nothing ever fails to decode
    assert_eq!(harq.total_nacks(), 0);
    assert_eq!(harq.total_drops(), 0);
}

#[test]
fn test_yaml_persistent_placement_end_to_end() {
    init_test_logging();

    let yaml = r"
num_users: 2
seed: 11
mac:
  num_prbs: 25
  tx_power_dbm_per_prb: 29.0
  pdcch_length: 3
  link_adaptation:
    threshold_db: 3.0
  strategy:
    kind: Persistent
    placement:
      kind: Previous
      fallback:
        kind: Smallest
";
    let config = SimulationConfig::from_yaml(yaml).unwrap();
    match &config.mac.strategy {
        StrategyKind::Persistent {
            placement: PlacementKind::Previous { fallback },
        } => assert_eq!(**fallback, PlacementKind::Smallest),
        other => panic!("unexpected strategy {other:?}"),
    }

    let mut queue = FiniteQueue::new();
    queue.push(UserId(1), 400);
    queue.push(UserId(2), 400);
    let mut scheduler = build_scheduler(&config.mac, &[(1, 15.0), (2, 15.0)], Box::new(queue));

    let grants = run_closed_loop(&mut scheduler, 10);

    // Both backlogs fit in the first TTI and drain completely
    assert_eq!(grants.len(), 2);
    assert!(grants.iter().any(|g| g.user == UserId(1)));
    assert!(grants.iter().any(|g| g.user == UserId(2)));
    for grant in &grants {
        assert!(grant.block_size >= 400);
        assert!(grant.tti.value() == 0);
    }
    assert_eq!(scheduler.harq().total_nacks(), 0);
}
