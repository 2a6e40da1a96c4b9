//! Closed-loop scheduling and HARQ scenarios.
//!
//! Each test drives the full per-TTI sequence against the reference
//! models: schedule, transmit, decode, deliver deferred feedback,
//! retransmit, drop at the limit.

use integration_tests::{
    assert_prbs_disjoint_per_tti, build_scheduler, init_test_logging, run_closed_loop,
    test_mac_config,
};
use lteasim_common::config::StrategyKind;
use lteasim_mac::models::FullBufferQueue;
use tracing::info;

#[test]
fn test_full_buffer_run_stays_error_free() {
    init_test_logging();

    let config = test_mac_config(10, StrategyKind::RoundRobin { prbs_per_user: 5 });
    let mut scheduler = build_scheduler(
        &config,
        &[(1, 20.0), (2, 12.0)],
        Box::new(FullBufferQueue::new(1_000_000)),
    );

    let grants = run_closed_loop(&mut scheduler, 200);
    info!(grants = grants.len(), "run finished");

    assert!(grants.iter().all(|g| g.new_data));
    assert_prbs_disjoint_per_tti(&grants);

    // The 3 dB link adaptation backoff keeps every transmission above
    // its decode threshold
    let harq = scheduler.harq();
    assert!(harq.total_acks() > 0);
    assert_eq!(harq.total_nacks(), 0);
    assert_eq!(harq.total_drops(), 0);
}

#[test]
fn test_marginal_link_recovers_through_combining() {
    init_test_logging();

    // A negative backoff over-shoots the MCS by about 4 dB: the first
    // attempt always fails, and chase combining lifts the accumulated
    // SINR back over the threshold within the retransmission limit
    let mut config = test_mac_config(8, StrategyKind::RoundRobin { prbs_per_user: 0 });
    config.link_adaptation.threshold_db = -4.0;
    config.harq.num_sender_processes = 1;
    config.harq.num_receiver_processes = 1;

    let mut scheduler = build_scheduler(
        &config,
        &[(1, 10.0)],
        Box::new(FullBufferQueue::new(1_000_000)),
    );

    let grants = run_closed_loop(&mut scheduler, 40);

    let initial = grants.iter().find(|g| g.new_data).unwrap();
    let retransmissions: Vec<_> = grants.iter().filter(|g| !g.new_data).collect();
    assert!(!retransmissions.is_empty());
    for retx in &retransmissions {
        // Non-adaptive: the retransmission repeats the original choice
        assert_eq!(retx.mcs, initial.mcs);
        assert_eq!(retx.block_size, initial.block_size);
        assert!(retx.attempt >= 2);
    }

    let harq = scheduler.harq();
    assert!(harq.total_nacks() >= 1);
    assert_eq!(harq.total_drops(), 0);

    // Recovery frees the single process, so new blocks keep flowing
    let new_data_grants = grants.iter().filter(|g| g.new_data).count();
    assert!(new_data_grants >= 2, "combining never recovered the link");
}

#[test]
fn test_dead_link_drops_at_the_limit() {
    init_test_logging();

    let mut config = test_mac_config(8, StrategyKind::RoundRobin { prbs_per_user: 0 });
    config.harq.num_sender_processes = 1;
    config.harq.num_receiver_processes = 1;

    let mut scheduler = build_scheduler(
        &config,
        &[(1, -20.0)],
        Box::new(FullBufferQueue::new(1_000_000)),
    );

    // One full HARQ cycle: initial transmission plus three NACKed
    // retransmissions at the 3-TTI feedback cadence, dropped at t = 12
    let grants = run_closed_loop(&mut scheduler, 26);

    let harq = scheduler.harq();
    assert!(harq.total_drops() >= 1);
    assert_eq!(harq.total_acks(), 0);
    // Never more attempts than the limit allows
    let limit = config.harq.retransmission_limit;
    assert!(grants.iter().all(|g| g.attempt <= limit + 1));

    // The process frees after the drop and takes new data again
    let new_data_grants = grants.iter().filter(|g| g.new_data).count();
    assert!(new_data_grants >= 2);
}

#[test]
fn test_zero_feedback_delay_frees_the_process_immediately() {
    init_test_logging();

    let mut config = test_mac_config(8, StrategyKind::RoundRobin { prbs_per_user: 0 });
    config.harq.feedback_decoding_delay_ttis = 0;
    config.harq.num_sender_processes = 1;
    config.harq.num_receiver_processes = 1;

    let mut scheduler = build_scheduler(
        &config,
        &[(1, 20.0)],
        Box::new(FullBufferQueue::new(1_000_000)),
    );

    let grants = run_closed_loop(&mut scheduler, 10);

    // Every ACK applies in the same TTI, so the single process carries a
    // fresh block every tick
    assert_eq!(grants.len(), 10);
    assert!(grants.iter().all(|g| g.new_data));
    assert_eq!(scheduler.harq().total_acks(), 10);
    assert_eq!(scheduler.harq().pending_feedback(), 0);
}
