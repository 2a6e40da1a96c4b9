//! Per-TTI scheduling orchestrator and the pluggable ranking strategies.
//!
//! [`Scheduler::run_tti`] drives the fixed per-TTI sequence: deliver due
//! feedback, reset the resource tracker, place pending HARQ
//! retransmissions non-adaptively, then hand the remaining PRBs to the
//! configured [`SchedulingStrategy`] for new data. Newly scheduled blocks
//! are stored under a free HARQ sender process.

pub mod persistent;
pub mod proportional_fair;
pub mod round_robin;

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::SeedableRng;

use lteasim_common::config::{MacConfig, StrategyKind};
use lteasim_common::sim_tick::SimulationTick;
use lteasim_common::types::{Bits, Power, Prb, Ratio, UserId};
use tracing::{debug, trace};

pub use persistent::Persistent;
pub use proportional_fair::ProportionalFair;
pub use round_robin::RoundRobin;

use crate::grant::{SchedulingGrant, TransportBlock};
use crate::harq::{ChaseCombiningDecoder, Harq, ReceivedAttempt};
use crate::la::LinkAdaptation;
use crate::mcs::{self, McsIndex};
use crate::models::{ChannelStateSource, EffectiveSinrModel, TrafficQueue};
use crate::prb::UsersPrbManager;

/// One new-data decision produced by a strategy: the PRBs have already
/// been marked used on the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub user: UserId,
    pub prbs: Vec<Prb>,
    pub mcs: McsIndex,
    pub block_size: Bits,
    pub estimated_sinr: Ratio,
    pub tx_power: Power,
}

/// Everything a strategy may consult and mutate during the new-data
/// phase of one TTI.
pub struct StrategyContext<'a> {
    /// PRB availability; strategies mark the PRBs they allocate.
    pub tracker: &'a mut UsersPrbManager,
    pub la: &'a LinkAdaptation,
    pub channel: &'a dyn ChannelStateSource,
    pub eff_model: &'a dyn EffectiveSinrModel,
    pub queue: &'a dyn TrafficQueue,
    /// Users eligible for new data this TTI, ascending.
    pub users: &'a [UserId],
    pub tti: SimulationTick,
    pub tx_power: Power,
}

impl StrategyContext<'_> {
    /// Per-PRB transmit power for an allocation: the lowest ceiling the
    /// tracker holds for `user` over the allocated PRBs.
    pub fn power_for(&self, user: UserId, prbs: &[Prb]) -> Power {
        prbs.iter()
            .map(|&prb| self.tracker.available_power(user, prb))
            .fold(self.tx_power, |min, p| if p.dbm() < min.dbm() { p } else { min })
    }
}

/// New-data ranking strategy.
pub trait SchedulingStrategy {
    /// Allocates remaining PRBs to eligible users. Implementations mark
    /// allocated PRBs used on the tracker; allocations are disjoint.
    fn schedule_new_data(&mut self, ctx: &mut StrategyContext<'_>) -> Vec<Allocation>;
}

/// Builds the configured strategy with its own RNG stream.
pub fn build_strategy(kind: &StrategyKind, rng: StdRng) -> Box<dyn SchedulingStrategy> {
    match kind {
        StrategyKind::RoundRobin { prbs_per_user } => {
            Box::new(RoundRobin::new(*prbs_per_user, rng))
        }
        StrategyKind::ProportionalFair {
            throughput_smoothing,
            history_exponent,
        } => Box::new(ProportionalFair::new(*throughput_smoothing, *history_exponent)),
        StrategyKind::Persistent { placement } => Box::new(Persistent::new(placement.clone(), rng)),
    }
}

/// Result of one TTI: the grant records for telemetry and the link
/// layer, plus the transport blocks that went on the air.
#[derive(Debug, Default)]
pub struct TtiResult {
    pub grants: Vec<SchedulingGrant>,
    pub transmissions: Vec<TransportBlock>,
}

/// The per-TTI MAC scheduler.
pub struct Scheduler {
    tracker: UsersPrbManager,
    harq: Harq,
    la: LinkAdaptation,
    strategy: Box<dyn SchedulingStrategy>,
    channel: Box<dyn ChannelStateSource>,
    eff_model: Box<dyn EffectiveSinrModel>,
    queue: Box<dyn TrafficQueue>,
    users: Vec<UserId>,
    tx_power: Power,
}

impl Scheduler {
    /// Builds a scheduler for `users` from the MAC configuration. `seed`
    /// feeds the RNG streams of the strategy and the decoder.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &MacConfig,
        users: Vec<UserId>,
        channel: Box<dyn ChannelStateSource>,
        eff_model: Box<dyn EffectiveSinrModel>,
        decoder_eff_model: Box<dyn EffectiveSinrModel>,
        bler_model: Box<dyn crate::models::BlockErrorModel>,
        queue: Box<dyn TrafficQueue>,
        seed: u64,
    ) -> Self {
        let tx_power = Power::from_dbm(config.tx_power_dbm_per_prb);
        let mut tracker = UsersPrbManager::new(config.num_prbs, tx_power);
        for &user in &users {
            tracker.add_active_user(user);
        }

        let decoder = ChaseCombiningDecoder::new(
            decoder_eff_model,
            bler_model,
            StdRng::seed_from_u64(seed ^ 0x6465636f64657221),
        );
        let strategy = build_strategy(&config.strategy, StdRng::seed_from_u64(seed));

        Self {
            tracker,
            harq: Harq::new(config.harq, Box::new(decoder)),
            la: LinkAdaptation::new(&config.link_adaptation, mcs::res_per_prb(config.pdcch_length)),
            strategy,
            channel,
            eff_model,
            queue,
            users,
            tx_power,
        }
    }

    pub fn harq(&self) -> &Harq {
        &self.harq
    }

    pub fn tracker(&self) -> &UsersPrbManager {
        &self.tracker
    }

    /// Runs one TTI and returns the scheduling decisions.
    pub fn run_tti(&mut self, tti: SimulationTick) -> TtiResult {
        self.harq.deliver_due_feedback(tti);

        let new_data_users = self.determine_new_data_users();
        self.sync_active_users(&new_data_users);
        self.tracker.reset();

        let mut result = TtiResult::default();
        self.schedule_retransmissions(tti, &mut result);
        self.schedule_new_data(tti, &new_data_users, &mut result);

        debug!(
            %tti,
            grants = result.grants.len(),
            prbs_left = self.tracker.num_prbs_available(),
            "TTI scheduled"
        );
        result
    }

    /// Models reception of one transmitted block: looks up the per-PRB
    /// SINRs the block was received with and runs the receiver-side HARQ
    /// decode. Returns whether the block decoded.
    pub fn receive_and_decode(&mut self, block: TransportBlock, tti: SimulationTick) -> bool {
        let user = block.user;
        let sinrs: Vec<Ratio> = block
            .prbs
            .iter()
            .map(|&prb| self.channel.sinr_estimate(user, prb, tti))
            .collect();
        self.harq
            .receive_and_decode(user, ReceivedAttempt { block, sinrs }, tti)
    }

    /// Users that may take new data this TTI: non-empty queue and a free
    /// sender process.
    fn determine_new_data_users(&self) -> Vec<UserId> {
        self.users
            .iter()
            .copied()
            .filter(|&u| {
                self.queue.bits_queued_for(u) > 0 && self.harq.has_free_sender_process(u)
            })
            .collect()
    }

    /// The tracker's active set for this TTI: new-data users plus users
    /// with pending retransmissions.
    fn sync_active_users(&mut self, new_data_users: &[UserId]) {
        let mut active: BTreeSet<UserId> = new_data_users.iter().copied().collect();
        active.extend(self.harq.users_with_retransmissions());

        for &user in &self.users {
            if active.contains(&user) {
                if !self.tracker.is_active(user) {
                    self.tracker.add_active_user(user);
                }
            } else if self.tracker.is_active(user) {
                self.tracker.remove_active_user(user);
            }
        }
    }

    /// Retransmission phase: non-adaptive re-placement of every prepared
    /// retransmission, round robin over each peer's processes. A peer
    /// whose retransmission cannot be placed is skipped until the next
    /// TTI without consuming an attempt.
    fn schedule_retransmissions(&mut self, tti: SimulationTick, result: &mut TtiResult) {
        for user in self.harq.users_with_retransmissions() {
            let pending = self.harq.processes_with_retransmissions(user).len();
            for _ in 0..pending {
                let entity = self.harq.entity(user);
                let process_id = entity.process_with_next_retransmission();
                let block = entity.retransmission(process_id).clone();

                let Some(prbs) = self.replacement_prbs(user, &block) else {
                    trace!(%user, process_id, "retransmission skipped, not enough PRBs");
                    continue;
                };

                for &prb in &prbs {
                    self.tracker.mark_prb_used(prb);
                }
                self.harq.entity(user).retransmission_started(process_id);

                result
                    .grants
                    .push(SchedulingGrant::for_block(tti, &block, prbs.clone()));
                let mut sent = block;
                sent.prbs = prbs;
                result.transmissions.push(sent);
            }
        }
    }

    /// PRBs for a non-adaptive retransmission: the original PRBs where
    /// still free, topped up from the user's remaining eligible PRBs to
    /// the original count.
    fn replacement_prbs(&self, user: UserId, block: &TransportBlock) -> Option<Vec<Prb>> {
        let needed = block.prbs.len();
        let eligible = self.tracker.prbs_available_for(user);

        let mut prbs: Vec<Prb> = block
            .prbs
            .iter()
            .copied()
            .filter(|p| eligible.contains(p))
            .collect();
        for prb in eligible {
            if prbs.len() == needed {
                break;
            }
            if !prbs.contains(&prb) {
                prbs.push(prb);
            }
        }

        (prbs.len() == needed).then_some(prbs)
    }

    /// New-data phase: the strategy allocates, the orchestrator dequeues
    /// payload and stores each block under a free sender process.
    fn schedule_new_data(
        &mut self,
        tti: SimulationTick,
        users: &[UserId],
        result: &mut TtiResult,
    ) {
        let mut ctx = StrategyContext {
            tracker: &mut self.tracker,
            la: &self.la,
            channel: self.channel.as_ref(),
            eff_model: self.eff_model.as_ref(),
            queue: self.queue.as_ref(),
            users,
            tti,
            tx_power: self.tx_power,
        };
        let allocations = self.strategy.schedule_new_data(&mut ctx);

        for allocation in allocations {
            let user = allocation.user;
            let Some(process_id) = self.harq.entity(user).free_process() else {
                // The strategy only sees users with capacity, but a user
                // may appear twice if a strategy misbehaves; skip safely.
                continue;
            };

            let (payload_bits, payload) = self.queue.dequeue(user, allocation.block_size);
            let block = TransportBlock {
                user,
                payload,
                payload_bits,
                block_size: allocation.block_size,
                mcs: allocation.mcs,
                prbs: allocation.prbs.clone(),
                tx_power: allocation.tx_power,
                estimated_sinr: allocation.estimated_sinr,
                process_id,
                spatial_layer: 0,
                attempts: 1,
                ndi: true,
                last_attempt: false,
            };
            self.harq
                .store_scheduled_transport_block(user, block.clone(), process_id);

            result
                .grants
                .push(SchedulingGrant::for_block(tti, &block, allocation.prbs));
            result.transmissions.push(block);
        }
    }
}
