//! Proportional-fair new-data strategy.

use std::collections::{BTreeMap, HashMap, HashSet};

use lteasim_common::types::{Prb, UserId};
use tracing::trace;

use crate::mcs;
use crate::scheduler::{Allocation, SchedulingStrategy, StrategyContext};

/// History floor in bits, so freshly admitted users do not divide by
/// zero and are strongly preferred until they have been served once.
const MIN_HISTORY_BITS: f64 = 1.0;

/// Per-PRB ranking by expected rate over exponentially smoothed
/// throughput history. A user leaves the ranking for the rest of the TTI
/// once its provisional allocation covers everything it has queued.
pub struct ProportionalFair {
    alpha: f64,
    exponent: f64,
    history: HashMap<UserId, f64>,
}

impl ProportionalFair {
    /// `alpha` is the exponential smoothing factor in (0, 1]; `exponent`
    /// scales how hard the history pushes back in the metric.
    pub fn new(alpha: f64, exponent: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "alpha must be in (0, 1]");
        Self {
            alpha,
            exponent,
            history: HashMap::new(),
        }
    }

    fn metric(&self, user: UserId, rate_bits: f64) -> f64 {
        let history = self
            .history
            .get(&user)
            .copied()
            .unwrap_or(0.0)
            .max(MIN_HISTORY_BITS);
        rate_bits / history.powf(self.exponent)
    }

    fn update_history(&mut self, users: &[UserId], served: &HashMap<UserId, f64>) {
        for &user in users {
            let bits = served.get(&user).copied().unwrap_or(0.0);
            let entry = self.history.entry(user).or_insert(0.0);
            *entry = (1.0 - self.alpha) * *entry + self.alpha * bits;
        }
    }
}

impl SchedulingStrategy for ProportionalFair {
    fn schedule_new_data(&mut self, ctx: &mut StrategyContext<'_>) -> Vec<Allocation> {
        let res_per_prb = ctx.la.res_per_prb() as f64;
        let mut considered: HashSet<UserId> = ctx.users.iter().copied().collect();
        let mut provisional: BTreeMap<UserId, Vec<Prb>> = BTreeMap::new();
        let mut provisional_bits: HashMap<UserId, f64> = HashMap::new();

        for prb in ctx.tracker.prbs_available() {
            if considered.is_empty() {
                break;
            }

            // Rank the eligible users on this PRB; on a tie the
            // later-ranked user wins, following the iteration order of
            // the eligibility set.
            let mut best: Option<(UserId, f64)> = None;
            for user in ctx.tracker.active_users_on(prb) {
                if !considered.contains(&user) {
                    continue;
                }
                let sinr = ctx.channel.sinr_estimate(user, prb, ctx.tti);
                let rate = mcs::best_for_sinr(sinr).efficiency() * res_per_prb;
                let metric = self.metric(user, rate);
                match best {
                    Some((_, best_metric)) if metric < best_metric => {}
                    _ => best = Some((user, metric)),
                }
            }
            let Some((user, _)) = best else {
                continue;
            };

            ctx.tracker.mark_prb_used(prb);
            provisional.entry(user).or_default().push(prb);

            let sinr = ctx.channel.sinr_estimate(user, prb, ctx.tti);
            let bits = provisional_bits.entry(user).or_insert(0.0);
            *bits += mcs::best_for_sinr(sinr).efficiency() * res_per_prb;
            if *bits >= ctx.queue.bits_queued_for(user) as f64 {
                considered.remove(&user);
            }
        }

        let mut allocations = Vec::new();
        let mut served: HashMap<UserId, f64> = HashMap::new();
        for (user, prbs) in provisional {
            let (mcs_index, sinr) = ctx
                .la
                .adapt(user, &prbs, ctx.channel, ctx.eff_model, ctx.tti);
            let block_size = ctx.la.transport_block_size(mcs_index, prbs.len());
            if block_size == 0 {
                continue;
            }
            served.insert(user, block_size as f64);
            let tx_power = ctx.power_for(user, &prbs);
            trace!(%user, num_prbs = prbs.len(), mcs = %mcs_index, "proportional fair allocation");
            allocations.push(Allocation {
                user,
                prbs,
                mcs: mcs_index,
                block_size,
                estimated_sinr: sinr,
                tx_power,
            });
        }

        self.update_history(ctx.users, &served);
        allocations
    }
}
