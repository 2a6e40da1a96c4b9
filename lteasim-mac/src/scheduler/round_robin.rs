//! Round-robin new-data strategy.

use std::collections::{HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use lteasim_common::types::UserId;
use tracing::trace;

use crate::scheduler::{Allocation, SchedulingStrategy, StrategyContext};

/// Rotating user queue. Users joining the rotation are shuffled in with
/// the injected RNG so that simulation runs do not all favor the lowest
/// user ids; after that the order is strictly round robin, with served
/// users moving to the back.
pub struct RoundRobin {
    prbs_per_user: usize,
    rng: StdRng,
    order: VecDeque<UserId>,
    known: HashSet<UserId>,
}

impl RoundRobin {
    /// `prbs_per_user` caps the PRBs one user may take per TTI; 0 means
    /// a user takes all its remaining eligible PRBs.
    pub fn new(prbs_per_user: usize, rng: StdRng) -> Self {
        Self {
            prbs_per_user,
            rng,
            order: VecDeque::new(),
            known: HashSet::new(),
        }
    }

    fn admit_new_users(&mut self, users: &[UserId]) {
        let mut joining: Vec<UserId> = users
            .iter()
            .copied()
            .filter(|u| !self.known.contains(u))
            .collect();
        if joining.is_empty() {
            return;
        }
        joining.shuffle(&mut self.rng);
        for user in joining {
            self.known.insert(user);
            self.order.push_back(user);
        }
    }
}

impl SchedulingStrategy for RoundRobin {
    fn schedule_new_data(&mut self, ctx: &mut StrategyContext<'_>) -> Vec<Allocation> {
        self.admit_new_users(ctx.users);

        let mut allocations = Vec::new();
        let mut rounds = self.order.len();
        while rounds > 0 && ctx.tracker.num_prbs_available() > 0 {
            rounds -= 1;
            let user = self.order.pop_front().unwrap();
            self.order.push_back(user);

            if !ctx.users.contains(&user) {
                continue;
            }
            let available = ctx.tracker.prbs_available_for(user);
            if available.is_empty() {
                continue;
            }

            let take = if self.prbs_per_user == 0 {
                available.len()
            } else {
                available.len().min(self.prbs_per_user)
            };
            let prbs = available[..take].to_vec();

            let (mcs, sinr) = ctx
                .la
                .adapt(user, &prbs, ctx.channel, ctx.eff_model, ctx.tti);
            let block_size = ctx.la.transport_block_size(mcs, prbs.len());
            if block_size == 0 {
                continue;
            }

            let tx_power = ctx.power_for(user, &prbs);
            for &prb in &prbs {
                ctx.tracker.mark_prb_used(prb);
            }
            trace!(%user, num_prbs = prbs.len(), %mcs, "round robin allocation");
            allocations.push(Allocation {
                user,
                prbs,
                mcs,
                block_size,
                estimated_sinr: sinr,
                tx_power,
            });
        }
        allocations
    }
}
