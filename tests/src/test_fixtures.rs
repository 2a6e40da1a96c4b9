//! Common fixtures: scheduler construction and closed-loop driving.

use std::collections::HashMap;

use lteasim_common::config::{LinkAdaptationConfig, MacConfig, StrategyKind};
use lteasim_common::sim_tick::SimulationTick;
use lteasim_common::types::{Prb, Ratio, UserId};
use lteasim_mac::models::{
    ExponentialEffectiveSinr, LogisticBlerModel, StaticChannelState, TrafficQueue,
};
use lteasim_mac::{Scheduler, SchedulingGrant};

pub const TEST_SEED: u64 = 0x5eed;

/// A MAC configuration for deterministic scenarios: a 3 dB link
/// adaptation backoff keeps decode margins comfortably positive, and the
/// steep error curve used by [`build_scheduler`] turns each decode into
/// a near-certain outcome either way.
pub fn test_mac_config(num_prbs: usize, strategy: StrategyKind) -> MacConfig {
    MacConfig {
        num_prbs,
        link_adaptation: LinkAdaptationConfig {
            threshold_db: 3.0,
            ..LinkAdaptationConfig::default()
        },
        strategy,
        ..MacConfig::default()
    }
}

/// Builds a scheduler over users with fixed flat SINRs, backed by the
/// reference channel and error models.
pub fn build_scheduler(
    config: &MacConfig,
    sinrs_db: &[(u32, f64)],
    queue: Box<dyn TrafficQueue>,
) -> Scheduler {
    let users: Vec<UserId> = sinrs_db.iter().map(|&(id, _)| UserId(id)).collect();

    let mut channel = StaticChannelState::new(Ratio::from_db(-10.0));
    for &(id, db) in sinrs_db {
        channel.set_flat(UserId(id), Ratio::from_db(db), config.num_prbs);
    }

    Scheduler::new(
        config,
        users,
        Box::new(channel),
        Box::new(ExponentialEffectiveSinr::default()),
        Box::new(ExponentialEffectiveSinr::default()),
        Box::new(LogisticBlerModel::new(0.1)),
        queue,
        TEST_SEED,
    )
}

/// Drives `ticks` TTIs of the full loop: schedule, then feed every
/// transmitted block back through the receiver-side decode in the same
/// TTI. Returns all grants in scheduling order.
pub fn run_closed_loop(scheduler: &mut Scheduler, ticks: u64) -> Vec<SchedulingGrant> {
    let mut grants = Vec::new();
    for t in 0..ticks {
        let tti = SimulationTick::new(t);
        let result = scheduler.run_tti(tti);
        grants.extend(result.grants);
        for block in result.transmissions {
            scheduler.receive_and_decode(block, tti);
        }
    }
    grants
}

/// Asserts that no PRB is granted twice within any single TTI.
pub fn assert_prbs_disjoint_per_tti(grants: &[SchedulingGrant]) {
    let mut per_tti: HashMap<u64, Vec<Prb>> = HashMap::new();
    for grant in grants {
        let seen = per_tti.entry(grant.tti.value()).or_default();
        for &prb in &grant.prbs {
            assert!(
                !seen.contains(&prb),
                "PRB {prb} granted twice in TTI {}",
                grant.tti
            );
            seen.push(prb);
        }
    }
}
