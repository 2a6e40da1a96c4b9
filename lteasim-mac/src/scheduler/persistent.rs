//! Interval-oriented persistent new-data strategy.

use rand::rngs::StdRng;

use lteasim_common::config::PlacementKind;
use tracing::trace;

use crate::la::FreeInterval;
use crate::placement::TbChoser;
use crate::scheduler::{Allocation, SchedulingStrategy, StrategyContext};

/// For each eligible user: collect the free contiguous PRB intervals,
/// let link adaptation produce one candidate placement per interval (or
/// per offset, depending on the search policy), and let the configured
/// transport-block choser pick the winner. Users whose payload fits
/// nowhere are skipped until the next TTI.
pub struct Persistent {
    choser: TbChoser,
}

impl Persistent {
    pub fn new(placement: PlacementKind, rng: StdRng) -> Self {
        Self {
            choser: TbChoser::new(placement, rng),
        }
    }
}

impl SchedulingStrategy for Persistent {
    fn schedule_new_data(&mut self, ctx: &mut StrategyContext<'_>) -> Vec<Allocation> {
        let mut allocations = Vec::new();

        for &user in ctx.users {
            let available = ctx.tracker.prbs_available_for(user);
            let intervals = FreeInterval::from_prbs(&available);
            if intervals.is_empty() {
                continue;
            }

            let pdu_bits = ctx.queue.bits_queued_for(user);
            let candidates = ctx.la.candidates(
                &intervals,
                user,
                pdu_bits,
                ctx.tx_power,
                ctx.channel,
                ctx.eff_model,
                ctx.tti,
            );
            let Ok(chosen) = self.choser.choose(user, &candidates) else {
                trace!(%user, "no fitting placement this TTI");
                continue;
            };

            let prbs = chosen.tb_prbs();
            let tx_power = ctx.power_for(user, &prbs);
            for &prb in &prbs {
                ctx.tracker.mark_prb_used(prb);
            }
            let block_size = ctx.la.transport_block_size(chosen.mcs, chosen.tb_length);
            trace!(
                %user,
                tb_start = chosen.tb_start,
                tb_length = chosen.tb_length,
                mcs = %chosen.mcs,
                "persistent allocation"
            );
            allocations.push(Allocation {
                user,
                prbs,
                mcs: chosen.mcs,
                block_size,
                estimated_sinr: chosen.estimated_sinr,
                tx_power,
            });
        }
        allocations
    }
}
